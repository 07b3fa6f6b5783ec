//! Mock gateway implementations for isolating services in tests.

use async_trait::async_trait;
use mockall::mock;
use serde_json::Value;

use crate::api::errors::ApiResult;
use crate::api::{
    AuthGateway, CustomerReader, CustomerWriter, DashboardReader, LoginResponse, Page,
    ResourceReader, ResourceWriter, SettingsGateway,
};
use crate::domain::resource::ResourceKind;
use crate::domain::types::{CustomerId, ResourceId};
use crate::domain::user::User;
use crate::forms::auth::{ChangePasswordPayload, LoginForm, RegisterPayload};

mock! {
    pub Gateway {}

    #[async_trait(?Send)]
    impl AuthGateway for Gateway {
        async fn login(&self, credentials: &LoginForm) -> ApiResult<LoginResponse>;
        async fn register(&self, payload: &RegisterPayload) -> ApiResult<Value>;
        async fn refresh(&self) -> ApiResult<String>;
        async fn logout(&self) -> ApiResult<()>;
        async fn me(&self) -> ApiResult<User>;
        async fn update_profile(&self, payload: &Value) -> ApiResult<User>;
        async fn change_password(&self, payload: &ChangePasswordPayload) -> ApiResult<()>;
    }

    #[async_trait(?Send)]
    impl CustomerReader for Gateway {
        async fn list_customers(&self, query: &[(String, String)]) -> ApiResult<Page>;
        async fn get_customer(&self, id: CustomerId) -> ApiResult<Value>;
        async fn customer_stats(&self) -> ApiResult<Value>;
        async fn search_customers(&self, term: &str, limit: usize) -> ApiResult<Vec<Value>>;
    }

    #[async_trait(?Send)]
    impl CustomerWriter for Gateway {
        async fn create_customer(&self, payload: &Value) -> ApiResult<Value>;
        async fn update_customer(&self, id: CustomerId, payload: &Value) -> ApiResult<Value>;
        async fn delete_customer(&self, id: CustomerId) -> ApiResult<()>;
        async fn touch_last_contact(&self, id: CustomerId) -> ApiResult<Value>;
    }

    #[async_trait(?Send)]
    impl ResourceReader for Gateway {
        async fn list_resources(
            &self,
            kind: ResourceKind,
            query: &[(String, String)],
        ) -> ApiResult<Page>;
        async fn get_resource(&self, kind: ResourceKind, id: ResourceId) -> ApiResult<Value>;
        async fn sub_resource(
            &self,
            kind: ResourceKind,
            id: ResourceId,
            name: &str,
        ) -> ApiResult<Value>;
    }

    #[async_trait(?Send)]
    impl ResourceWriter for Gateway {
        async fn create_resource(&self, kind: ResourceKind, payload: &Value) -> ApiResult<Value>;
        async fn update_resource(
            &self,
            kind: ResourceKind,
            id: ResourceId,
            payload: &Value,
        ) -> ApiResult<Value>;
        async fn delete_resource(&self, kind: ResourceKind, id: ResourceId) -> ApiResult<()>;
        async fn perform(
            &self,
            kind: ResourceKind,
            id: ResourceId,
            action: &str,
            body: Option<Value>,
        ) -> ApiResult<Value>;
    }

    #[async_trait(?Send)]
    impl DashboardReader for Gateway {
        async fn dashboard(&self) -> ApiResult<Value>;
        async fn recent_activities(&self, limit: usize) -> ApiResult<Vec<Value>>;
        async fn analytics(&self, report: &str) -> ApiResult<Value>;
    }

    #[async_trait(?Send)]
    impl SettingsGateway for Gateway {
        async fn system_settings(&self) -> ApiResult<Value>;
        async fn update_system_settings(&self, payload: &Value) -> ApiResult<Value>;
        async fn user_settings(&self) -> ApiResult<Value>;
        async fn update_user_settings(&self, payload: &Value) -> ApiResult<Value>;
    }
}
