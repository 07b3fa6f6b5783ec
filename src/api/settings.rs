use async_trait::async_trait;
use serde_json::Value;

use crate::api::SettingsGateway;
use crate::api::client::ApiClient;
use crate::api::errors::ApiResult;

#[async_trait(?Send)]
impl SettingsGateway for ApiClient<'_> {
    async fn system_settings(&self) -> ApiResult<Value> {
        self.get("/settings", Vec::new()).await
    }

    async fn update_system_settings(&self, payload: &Value) -> ApiResult<Value> {
        self.put("/settings", payload.clone()).await
    }

    async fn user_settings(&self) -> ApiResult<Value> {
        self.get("/settings/user", Vec::new()).await
    }

    async fn update_user_settings(&self, payload: &Value) -> ApiResult<Value> {
        self.put("/settings/user", payload.clone()).await
    }
}
