//! Request and response interceptors, run in registration order.

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::api::client::ApiClient;
use crate::api::errors::ApiError;
use crate::api::request::{ApiRequest, ApiResponse, Method};

/// May rewrite the outgoing request or abort it with an error.
pub trait RequestInterceptor: Send + Sync {
    fn on_request(&self, request: &mut ApiRequest) -> Result<(), ApiError>;
}

/// What happens after a response interceptor looked at a response.
#[derive(Debug)]
pub enum Flow {
    /// Hand the response to the next interceptor.
    Continue(ApiResponse),
    /// Dispatch the original request again with fresh credentials.
    Replay,
}

#[async_trait(?Send)]
pub trait ResponseInterceptor: Send + Sync {
    async fn on_response(
        &self,
        client: &ApiClient<'_>,
        response: ApiResponse,
    ) -> Result<Flow, ApiError>;
}

/// Adds a `_t` timestamp to GET requests so no intermediary serves a stale copy.
pub struct CacheBuster;

impl RequestInterceptor for CacheBuster {
    fn on_request(&self, request: &mut ApiRequest) -> Result<(), ApiError> {
        if request.method == Method::Get {
            request.query.retain(|(key, _)| key != "_t");
            request
                .query
                .push(("_t".to_string(), Utc::now().timestamp_millis().to_string()));
        }
        Ok(())
    }
}

/// Tags every request with a fresh `X-Request-Id`.
pub struct RequestIdHeader;

impl RequestInterceptor for RequestIdHeader {
    fn on_request(&self, request: &mut ApiRequest) -> Result<(), ApiError> {
        request.set_header("X-Request-Id", Uuid::new_v4().to_string());
        Ok(())
    }
}

/// Answers a 401 with one refresh and one replay.
///
/// A failed refresh clears the whole session. A 401 on the replay itself, or on
/// a request that opted out of refreshing, is not retried.
pub struct TokenRefresh;

#[async_trait(?Send)]
impl ResponseInterceptor for TokenRefresh {
    async fn on_response(
        &self,
        client: &ApiClient<'_>,
        response: ApiResponse,
    ) -> Result<Flow, ApiError> {
        if response.status != 401 || response.request.skip_refresh {
            return Ok(Flow::Continue(response));
        }

        if response.request.replayed {
            log::warn!(
                "{} {} rejected again after token refresh",
                response.request.method,
                response.request.path
            );
            client.clear_session();
            return Err(ApiError::SessionExpired);
        }

        match client.refresh_access_token().await {
            Ok(_) => Ok(Flow::Replay),
            Err(err) => {
                log::warn!("Token refresh failed: {err:?}");
                client.clear_session();
                Err(ApiError::SessionExpired)
            }
        }
    }
}

/// Turns non-2xx responses into [`ApiError::Http`].
pub struct StatusErrors;

#[async_trait(?Send)]
impl ResponseInterceptor for StatusErrors {
    async fn on_response(
        &self,
        _client: &ApiClient<'_>,
        response: ApiResponse,
    ) -> Result<Flow, ApiError> {
        if response.is_success() {
            return Ok(Flow::Continue(response));
        }
        Err(ApiError::from_status(
            response.status,
            response.data.message(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_buster_only_touches_get() {
        let mut get = ApiRequest::get("/customers").query_param("_t", "old");
        CacheBuster.on_request(&mut get).expect("interceptor");
        let stamps: Vec<_> = get.query.iter().filter(|(k, _)| k == "_t").collect();
        assert_eq!(stamps.len(), 1);
        assert_ne!(stamps[0].1, "old");

        let mut post = ApiRequest::post("/customers");
        CacheBuster.on_request(&mut post).expect("interceptor");
        assert!(post.query.is_empty());
    }

    #[test]
    fn request_id_is_set() {
        let mut request = ApiRequest::get("/customers");
        RequestIdHeader.on_request(&mut request).expect("interceptor");
        assert!(request.header_value("x-request-id").is_some());
    }
}
