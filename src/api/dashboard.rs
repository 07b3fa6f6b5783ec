use async_trait::async_trait;
use serde_json::{Value, json};

use crate::api::DashboardReader;
use crate::api::client::ApiClient;
use crate::api::errors::ApiResult;

#[async_trait(?Send)]
impl DashboardReader for ApiClient<'_> {
    async fn dashboard(&self) -> ApiResult<Value> {
        self.get("/stats/dashboard", Vec::new()).await
    }

    async fn recent_activities(&self, limit: usize) -> ApiResult<Vec<Value>> {
        let value = self
            .get(
                "/stats/recent-activities",
                vec![("limit".to_string(), json!(limit))],
            )
            .await?;
        let activities = match value {
            Value::Array(items) => items,
            other => other
                .get("activities")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
        };
        Ok(activities)
    }

    async fn analytics(&self, report: &str) -> ApiResult<Value> {
        self.get(&format!("/analytics/{report}"), Vec::new()).await
    }
}
