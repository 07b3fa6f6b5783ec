//! Backend HTTP client: default headers, bearer auth, interceptor chain,
//! timeout and offline detection.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::time::Instant;

use crate::api::errors::{ApiError, ApiResult};
use crate::api::interceptors::{
    CacheBuster, Flow, RequestIdHeader, RequestInterceptor, ResponseInterceptor, StatusErrors,
    TokenRefresh,
};
use crate::api::request::{ApiRequest, ApiResponse, ResponseBody, join_url};
use crate::api::transport::{Transport, TransportError};
use crate::api::unwrap_envelope;
use crate::cache::{PersistentCache, keys};
use crate::models::config::ResolvedApi;

/// Remembers a recent connection failure so later calls fail fast.
struct Connectivity {
    offline_until: Mutex<Option<Instant>>,
    cooldown: Duration,
}

impl Connectivity {
    fn new(cooldown: Duration) -> Self {
        Self {
            offline_until: Mutex::new(None),
            cooldown,
        }
    }

    fn is_offline(&self) -> bool {
        let Ok(mut until) = self.offline_until.lock() else {
            return false;
        };
        match *until {
            Some(deadline) if Instant::now() < deadline => true,
            Some(_) => {
                *until = None;
                false
            }
            None => false,
        }
    }

    fn mark_offline(&self) {
        if self.cooldown.is_zero() {
            return;
        }
        if let Ok(mut until) = self.offline_until.lock() {
            *until = Some(Instant::now() + self.cooldown);
        }
    }
}

/// Shared, immutable part of the client. One instance serves all workers.
pub struct HttpClient {
    transport: Arc<dyn Transport>,
    settings: ResolvedApi,
    request_interceptors: Vec<Arc<dyn RequestInterceptor>>,
    response_interceptors: Vec<Arc<dyn ResponseInterceptor>>,
    connectivity: Connectivity,
}

impl HttpClient {
    /// Client without interceptors.
    pub fn new(settings: ResolvedApi, transport: Arc<dyn Transport>) -> Self {
        let connectivity = Connectivity::new(settings.offline_cooldown);
        Self {
            transport,
            settings,
            request_interceptors: Vec::new(),
            response_interceptors: Vec::new(),
            connectivity,
        }
    }

    /// Registers the standard chain: cache busting, request ids, token
    /// refresh on 401 and status-to-error mapping.
    pub fn with_default_interceptors(self) -> Self {
        self.with_request_interceptor(CacheBuster)
            .with_request_interceptor(RequestIdHeader)
            .with_response_interceptor(TokenRefresh)
            .with_response_interceptor(StatusErrors)
    }

    pub fn with_request_interceptor(mut self, interceptor: impl RequestInterceptor + 'static) -> Self {
        self.request_interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn with_response_interceptor(
        mut self,
        interceptor: impl ResponseInterceptor + 'static,
    ) -> Self {
        self.response_interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn settings(&self) -> &ResolvedApi {
        &self.settings
    }

    /// Binds the client to the cache holding one user's credentials.
    pub fn bind<'a>(&'a self, cache: &'a PersistentCache) -> ApiClient<'a> {
        ApiClient { http: self, cache }
    }
}

/// The client as seen by one user session.
pub struct ApiClient<'a> {
    http: &'a HttpClient,
    cache: &'a PersistentCache,
}

impl<'a> ApiClient<'a> {
    pub fn cache(&self) -> &'a PersistentCache {
        self.cache
    }

    pub fn access_token(&self) -> Option<String> {
        self.cache
            .get::<String>(keys::ACCESS_TOKEN)
            .unwrap_or_else(|err| {
                log::warn!("Failed to read access token: {err}");
                None
            })
            .filter(|token| !token.is_empty())
    }

    /// Drops every cached credential of this session.
    pub fn clear_session(&self) {
        self.cache.clear();
    }

    /// Runs the full pipeline for `request`. A replay requested by a response
    /// interceptor is honoured once; the replay is rebuilt from `request` so it
    /// picks up the refreshed token.
    pub async fn request(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        let mut replayed = false;
        loop {
            let prepared = self.prepare(&request, replayed)?;
            let response = self.dispatch(prepared).await?;
            match self.intercept_response(response).await? {
                Flow::Continue(response) => return Ok(response),
                Flow::Replay if !replayed => {
                    log::debug!("Replaying {} {}", request.method, request.path);
                    replayed = true;
                }
                Flow::Replay => return Err(ApiError::SessionExpired),
            }
        }
    }

    /// Sends `request` and returns its JSON payload with any
    /// `{success, message, data}` envelope removed.
    pub async fn send_json(&self, request: ApiRequest) -> ApiResult<Value> {
        let response = self.request(request).await?;
        Ok(unwrap_envelope(response.data.into_json()))
    }

    pub async fn get(&self, path: &str, query: Vec<(String, Value)>) -> ApiResult<Value> {
        self.send_json(ApiRequest::get(path).query(query)).await
    }

    pub async fn post(&self, path: &str, body: Option<Value>) -> ApiResult<Value> {
        let mut request = ApiRequest::post(path);
        request.body = body;
        self.send_json(request).await
    }

    pub async fn put(&self, path: &str, body: Value) -> ApiResult<Value> {
        self.send_json(ApiRequest::put(path).body_value(body)).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> ApiResult<Value> {
        self.send_json(ApiRequest::patch(path).body_value(body)).await
    }

    pub async fn delete(&self, path: &str) -> ApiResult<Value> {
        self.send_json(ApiRequest::delete(path)).await
    }

    /// Exchanges the cached refresh token for a new access token.
    ///
    /// The call bypasses the interceptor chain. The new token is stored only
    /// when the refresh token it was obtained with is still the cached one, so
    /// a slow refresh never overwrites credentials of a newer login.
    pub async fn refresh_access_token(&self) -> ApiResult<String> {
        let refresh_token = self
            .cache
            .get::<String>(keys::REFRESH_TOKEN)?
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::MissingRefreshToken)?;

        let request = ApiRequest::post("/auth/refresh")
            .body_value(json!({ "refresh_token": refresh_token }))
            .bearer(&refresh_token)
            .without_refresh();
        let response = self.dispatch(self.with_default_headers(&request)).await?;

        if !response.is_success() {
            return Err(ApiError::from_status(response.status, response.data.message()));
        }

        let payload = unwrap_envelope(response.data.into_json());
        let access_token = payload
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::Decode("refresh response without access_token".into()))?
            .to_string();

        let current = self.cache.get::<String>(keys::REFRESH_TOKEN)?;
        if current.as_deref() == Some(refresh_token.as_str()) {
            self.cache.set(keys::ACCESS_TOKEN, &access_token)?;
            if let Some(rotated) = payload.get("refresh_token").and_then(Value::as_str) {
                self.cache.set(keys::REFRESH_TOKEN, rotated)?;
            }
            self.cache.set(keys::TOKEN_REFRESHED_AT, &chrono::Utc::now().timestamp())?;
            log::info!("Access token refreshed");
        } else {
            log::info!("Discarding refreshed token, the session changed meanwhile");
        }

        Ok(access_token)
    }

    fn with_default_headers(&self, request: &ApiRequest) -> ApiRequest {
        let mut prepared = request.clone();
        prepared.headers.clear();
        prepared.set_header("Content-Type", "application/json");
        prepared.set_header("Accept", "application/json");
        prepared.headers.extend(request.headers.clone());
        prepared
    }

    fn prepare(&self, request: &ApiRequest, replayed: bool) -> ApiResult<ApiRequest> {
        let mut prepared = self.with_default_headers(request);
        prepared.replayed = replayed;

        if prepared.header_value("authorization").is_none() {
            if let Some(token) = self.access_token() {
                prepared.set_header("Authorization", format!("Bearer {token}"));
            }
        }

        for interceptor in &self.http.request_interceptors {
            interceptor.on_request(&mut prepared)?;
        }
        Ok(prepared)
    }

    async fn intercept_response(&self, mut response: ApiResponse) -> ApiResult<Flow> {
        for interceptor in &self.http.response_interceptors {
            match interceptor.on_response(self, response).await? {
                Flow::Continue(next) => response = next,
                Flow::Replay => return Ok(Flow::Replay),
            }
        }
        Ok(Flow::Continue(response))
    }

    /// Sends one request over the transport without running interceptors.
    async fn dispatch(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        if self.http.connectivity.is_offline() {
            return Err(ApiError::NetworkUnavailable);
        }

        let settings = &self.http.settings;
        let url = join_url(&settings.base_url, &request.path);
        let timeout = request.timeout.unwrap_or(settings.timeout);

        if settings.log_requests {
            log::debug!("API request {} {url}", request.method);
        }

        let raw = match tokio::time::timeout(timeout, self.http.transport.send(&url, &request)).await
        {
            Err(_) => {
                log::warn!("API request {} {url} timed out after {timeout:?}", request.method);
                return Err(ApiError::Timeout);
            }
            Ok(Err(TransportError::Connect(err))) => {
                log::warn!("Backend unreachable: {err}");
                self.http.connectivity.mark_offline();
                return Err(ApiError::NetworkUnavailable);
            }
            Ok(Err(TransportError::Other(err))) => {
                log::error!("API request {} {url} failed: {err}", request.method);
                return Err(ApiError::Transport(err));
            }
            Ok(Ok(raw)) => raw,
        };

        if settings.log_requests {
            log::debug!("API response {} {url} -> {}", request.method, raw.status);
        }

        let data = ResponseBody::parse(
            raw.headers.get("content-type").map(String::as_str),
            raw.body,
        );

        Ok(ApiResponse {
            data,
            status: raw.status,
            status_text: raw.status_text,
            headers: raw.headers,
            request,
        })
    }
}
