//! Request and response values flowing through the interceptor chain.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::api::errors::{ApiError, ApiResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// Outgoing backend call. Header names are stored lower-cased.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Absolute URL or a path joined onto the configured base URL.
    pub path: String,
    pub headers: BTreeMap<String, String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub timeout: Option<Duration>,
    /// A 401 answer to this request is reported as-is instead of refreshing.
    pub skip_refresh: bool,
    /// Set on the single replay that follows a successful refresh.
    pub replayed: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: BTreeMap::new(),
            query: Vec::new(),
            body: None,
            timeout: None,
            skip_refresh: false,
            replayed: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {token}"))
    }

    /// Appends query parameters, dropping null and empty values.
    pub fn query<I, K>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.query.extend(build_query(params));
        self
    }

    pub fn query_param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    /// Sets a JSON body. Fails instead of sending a request without its body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> ApiResult<Self> {
        let value = serde_json::to_value(body).map_err(|err| {
            log::warn!("Failed to encode body of {} {}: {err}", self.method, self.path);
            ApiError::Encode(err.to_string())
        })?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn body_value(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn without_refresh(mut self) -> Self {
        self.skip_refresh = true;
        self
    }
}

/// Converts parameters into query pairs. `null`, empty and whitespace-only
/// strings are skipped.
pub fn build_query<I, K>(params: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    params
        .into_iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::Null => return None,
                Value::String(s) if s.trim().is_empty() => return None,
                Value::String(s) => s,
                other => other.to_string(),
            };
            Some((key.into(), value))
        })
        .collect()
}

/// Joins the base URL and a path with exactly one slash. Absolute URLs pass
/// through untouched.
pub fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
    Empty,
}

impl ResponseBody {
    /// JSON when the content type says so and the body parses, text otherwise.
    pub fn parse(content_type: Option<&str>, body: String) -> Self {
        if body.is_empty() {
            return ResponseBody::Empty;
        }
        let is_json = content_type.is_some_and(|ct| ct.contains("application/json"));
        if is_json {
            match serde_json::from_str(&body) {
                Ok(value) => return ResponseBody::Json(value),
                Err(err) => log::warn!("Response declared JSON but failed to parse: {err}"),
            }
        }
        ResponseBody::Text(body)
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_json(self) -> Value {
        match self {
            ResponseBody::Json(value) => value,
            ResponseBody::Text(text) => Value::String(text),
            ResponseBody::Empty => Value::Null,
        }
    }

    /// Human-readable message a failing backend call carries, if any.
    pub fn message(&self) -> Option<String> {
        match self {
            ResponseBody::Json(value) => ["message", "error", "msg"]
                .iter()
                .find_map(|key| value.get(key).and_then(Value::as_str))
                .map(str::to_string),
            ResponseBody::Text(text) if text.len() <= 200 => Some(text.trim().to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub data: ResponseBody,
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    /// The request as it was dispatched, after the request interceptors.
    pub request: ApiRequest,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn query_skips_empty_values() {
        let pairs = build_query([
            ("page", json!(2)),
            ("status", json!("active")),
            ("type", json!("")),
            ("level", Value::Null),
            ("search", json!("  ")),
        ]);

        assert_eq!(
            pairs,
            vec![
                ("page".to_string(), "2".to_string()),
                ("status".to_string(), "active".to_string()),
            ]
        );
    }

    #[test]
    fn join_url_trims_slashes() {
        assert_eq!(
            join_url("http://localhost:5000/api/v1/", "/customers"),
            "http://localhost:5000/api/v1/customers"
        );
        assert_eq!(
            join_url("http://localhost:5000/api/v1", "https://other/x"),
            "https://other/x"
        );
    }

    #[test]
    fn headers_are_case_insensitive() {
        let request = ApiRequest::get("/x").header("X-Request-Id", "1");
        assert_eq!(request.header_value("x-request-id"), Some("1"));
    }

    #[test]
    fn body_parsing_follows_content_type() {
        let json = ResponseBody::parse(Some("application/json; charset=utf-8"), "{\"error\":\"bad\"}".into());
        assert_eq!(json.message().as_deref(), Some("bad"));

        let text = ResponseBody::parse(Some("text/html"), "{\"a\":1}".into());
        assert!(matches!(text, ResponseBody::Text(_)));

        assert_eq!(ResponseBody::parse(None, String::new()), ResponseBody::Empty);
    }

    #[test]
    fn unencodable_body_is_an_error() {
        let mut by_pair = std::collections::HashMap::new();
        by_pair.insert((1, 2), "tuple keys are not JSON object keys");

        let err = ApiRequest::post("/quotes").json(&by_pair).unwrap_err();
        assert!(matches!(err, ApiError::Encode(_)));

        let request = ApiRequest::post("/quotes")
            .json(&json!({"title": "Q-1"}))
            .unwrap();
        assert_eq!(request.body, Some(json!({"title": "Q-1"})));
    }
}
