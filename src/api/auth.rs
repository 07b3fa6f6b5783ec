use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api::client::ApiClient;
use crate::api::errors::{ApiError, ApiResult};
use crate::api::request::ApiRequest;
use crate::api::{AuthGateway, LoginResponse, entity};
use crate::domain::user::User;
use crate::forms::auth::{ChangePasswordPayload, LoginForm, RegisterPayload};

pub(crate) fn decode<T: DeserializeOwned>(value: Value, what: &str) -> ApiResult<T> {
    serde_json::from_value(value).map_err(|err| {
        log::error!("Failed to decode {what}: {err}");
        ApiError::Decode(format!("{what}: {err}"))
    })
}

#[async_trait(?Send)]
impl AuthGateway for ApiClient<'_> {
    async fn login(&self, credentials: &LoginForm) -> ApiResult<LoginResponse> {
        let request = ApiRequest::post("/auth/login")
            .json(credentials)?
            .without_refresh();
        decode(self.send_json(request).await?, "login response")
    }

    async fn register(&self, payload: &RegisterPayload) -> ApiResult<Value> {
        let request = ApiRequest::post("/auth/register")
            .json(payload)?
            .without_refresh();
        self.send_json(request).await
    }

    async fn refresh(&self) -> ApiResult<String> {
        self.refresh_access_token().await
    }

    async fn logout(&self) -> ApiResult<()> {
        self.send_json(ApiRequest::post("/auth/logout").without_refresh())
            .await
            .map(|_| ())
    }

    async fn me(&self) -> ApiResult<User> {
        let value = self.send_json(ApiRequest::get("/auth/profile")).await?;
        decode(entity(value, "user"), "user profile")
    }

    async fn update_profile(&self, payload: &Value) -> ApiResult<User> {
        let value = self.put("/auth/profile", payload.clone()).await?;
        decode(entity(value, "user"), "user profile")
    }

    async fn change_password(&self, payload: &ChangePasswordPayload) -> ApiResult<()> {
        self.send_json(ApiRequest::post("/auth/change-password").json(payload)?)
            .await
            .map(|_| ())
    }
}
