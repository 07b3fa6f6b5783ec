//! Client for the CRM REST backend.
//!
//! [`client::ApiClient`] implements every gateway trait below; services only
//! depend on the traits so they can be exercised with mocks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::resource::ResourceKind;
use crate::domain::types::{CustomerId, ResourceId};
use crate::domain::user::User;
use crate::forms::auth::{ChangePasswordPayload, LoginForm, RegisterPayload};

pub mod auth;
pub mod client;
pub mod customers;
pub mod dashboard;
pub mod errors;
pub mod interceptors;
#[cfg(any(test, feature = "test-mocks"))]
pub mod mock;
pub mod request;
pub mod resources;
pub mod settings;
pub mod transport;

pub use client::{ApiClient, HttpClient};
pub use errors::{ApiError, ApiResult};

/// Successful login as returned by `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

/// One page of a backend collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub items: Vec<Value>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub pages: usize,
}

impl Page {
    pub fn empty(page: usize, per_page: usize) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page,
            per_page,
            pages: 0,
        }
    }

    /// Reads `{<collection>: [...], pagination: {...}}`, an `items` array or a
    /// bare array. Missing counters fall back to the requested page.
    pub fn from_response(value: &Value, collection: &str, page: usize, per_page: usize) -> Self {
        let items = [collection, "items", "data"]
            .iter()
            .find_map(|key| value.get(key).and_then(Value::as_array))
            .or_else(|| value.as_array())
            .cloned()
            .unwrap_or_default();

        let pagination = value.get("pagination").unwrap_or(value);
        let count = |key: &str| {
            pagination
                .get(key)
                .and_then(Value::as_u64)
                .and_then(|n| usize::try_from(n).ok())
        };

        let total = count("total").unwrap_or(items.len());
        let page = count("page").unwrap_or(page).max(1);
        let per_page = count("per_page").unwrap_or(per_page).max(1);
        let pages = count("pages")
            .or_else(|| count("total_pages"))
            .unwrap_or_else(|| total.div_ceil(per_page));

        Self {
            items,
            total,
            page,
            per_page,
            pages,
        }
    }
}

/// Removes the `{success, message, data}` wrapper some endpoints use.
/// A sibling `pagination` object is kept next to the data as `items`.
pub fn unwrap_envelope(value: Value) -> Value {
    let is_envelope = value.get("success").is_some_and(Value::is_boolean)
        && value.get("data").is_some();
    if !is_envelope {
        return value;
    }

    let Value::Object(mut map) = value else {
        return Value::Null;
    };
    let data = map.remove("data").unwrap_or(Value::Null);
    match map.remove("pagination") {
        Some(pagination) if data.is_array() => serde_json::json!({
            "items": data,
            "pagination": pagination,
        }),
        _ => data,
    }
}

/// Picks `value[key]` when the backend wraps a single entity, e.g. `{"customer": {...}}`.
pub fn entity(value: Value, key: &str) -> Value {
    match value {
        Value::Object(mut map) if map.get(key).is_some_and(Value::is_object) => {
            map.remove(key).unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Numeric query parameter the caller asked for, or `default`.
pub(crate) fn query_number(query: &[(String, String)], key: &str, default: usize) -> usize {
    query
        .iter()
        .find(|(k, _)| k == key)
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or(default)
}

#[async_trait(?Send)]
pub trait AuthGateway {
    async fn login(&self, credentials: &LoginForm) -> ApiResult<LoginResponse>;
    async fn register(&self, payload: &RegisterPayload) -> ApiResult<Value>;
    async fn refresh(&self) -> ApiResult<String>;
    async fn logout(&self) -> ApiResult<()>;
    async fn me(&self) -> ApiResult<User>;
    async fn update_profile(&self, payload: &Value) -> ApiResult<User>;
    async fn change_password(&self, payload: &ChangePasswordPayload) -> ApiResult<()>;
}

#[async_trait(?Send)]
pub trait CustomerReader {
    async fn list_customers(&self, query: &[(String, String)]) -> ApiResult<Page>;
    async fn get_customer(&self, id: CustomerId) -> ApiResult<Value>;
    async fn customer_stats(&self) -> ApiResult<Value>;
    async fn search_customers(&self, term: &str, limit: usize) -> ApiResult<Vec<Value>>;
}

#[async_trait(?Send)]
pub trait CustomerWriter {
    async fn create_customer(&self, payload: &Value) -> ApiResult<Value>;
    async fn update_customer(&self, id: CustomerId, payload: &Value) -> ApiResult<Value>;
    async fn delete_customer(&self, id: CustomerId) -> ApiResult<()>;
    async fn touch_last_contact(&self, id: CustomerId) -> ApiResult<Value>;
}

#[async_trait(?Send)]
pub trait ResourceReader {
    async fn list_resources(
        &self,
        kind: ResourceKind,
        query: &[(String, String)],
    ) -> ApiResult<Page>;
    async fn get_resource(&self, kind: ResourceKind, id: ResourceId) -> ApiResult<Value>;
    /// Related read-only collection, e.g. contract payments.
    async fn sub_resource(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        name: &str,
    ) -> ApiResult<Value>;
}

#[async_trait(?Send)]
pub trait ResourceWriter {
    async fn create_resource(&self, kind: ResourceKind, payload: &Value) -> ApiResult<Value>;
    async fn update_resource(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        payload: &Value,
    ) -> ApiResult<Value>;
    async fn delete_resource(&self, kind: ResourceKind, id: ResourceId) -> ApiResult<()>;
    /// Lifecycle transition such as `send` or `cancel`.
    async fn perform(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        action: &str,
        body: Option<Value>,
    ) -> ApiResult<Value>;
}

#[async_trait(?Send)]
pub trait DashboardReader {
    async fn dashboard(&self) -> ApiResult<Value>;
    async fn recent_activities(&self, limit: usize) -> ApiResult<Vec<Value>>;
    async fn analytics(&self, report: &str) -> ApiResult<Value>;
}

#[async_trait(?Send)]
pub trait SettingsGateway {
    async fn system_settings(&self) -> ApiResult<Value>;
    async fn update_system_settings(&self, payload: &Value) -> ApiResult<Value>;
    async fn user_settings(&self) -> ApiResult<Value>;
    async fn update_user_settings(&self, payload: &Value) -> ApiResult<Value>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn page_reads_collection_and_pagination() {
        let page = Page::from_response(
            &json!({
                "customers": [{"id": 1}, {"id": 2}],
                "pagination": {"page": 2, "per_page": 2, "total": 5, "pages": 3}
            }),
            "customers",
            1,
            10,
        );

        assert_eq!(page.items.len(), 2);
        assert_eq!((page.page, page.per_page, page.total, page.pages), (2, 2, 5, 3));
    }

    #[test]
    fn page_reads_enveloped_response() {
        let unwrapped = unwrap_envelope(json!({
            "success": true,
            "message": "获取成功",
            "data": [{"id": 1}],
            "pagination": {"total": 11, "page": 1, "per_page": 10, "total_pages": 2}
        }));

        let page = Page::from_response(&unwrapped, "quotes", 1, 10);

        assert_eq!(page.items, vec![json!({"id": 1})]);
        assert_eq!(page.pages, 2);
        assert_eq!(page.total, 11);
    }

    #[test]
    fn page_falls_back_to_requested_counters() {
        let page = Page::from_response(&json!({"customers": [], "total": 0}), "customers", 3, 20);

        assert_eq!((page.page, page.per_page, page.pages), (3, 20, 0));
    }

    #[test]
    fn plain_payloads_pass_through() {
        let value = json!({"customer": {"id": 1}});
        assert_eq!(unwrap_envelope(value.clone()), value);
        assert_eq!(entity(value, "customer"), json!({"id": 1}));
    }
}
