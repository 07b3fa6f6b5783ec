use async_trait::async_trait;
use serde_json::{Value, json};

use crate::api::client::ApiClient;
use crate::api::errors::ApiResult;
use crate::api::request::ApiRequest;
use crate::api::{CustomerReader, CustomerWriter, Page, entity, query_number};
use crate::domain::types::CustomerId;

#[async_trait(?Send)]
impl CustomerReader for ApiClient<'_> {
    async fn list_customers(&self, query: &[(String, String)]) -> ApiResult<Page> {
        let mut request = ApiRequest::get("/customers");
        request.query.extend_from_slice(query);
        let value = self.send_json(request).await?;
        Ok(Page::from_response(
            &value,
            "customers",
            query_number(query, "page", 1),
            query_number(query, "per_page", 10),
        ))
    }

    async fn get_customer(&self, id: CustomerId) -> ApiResult<Value> {
        let value = self.get(&format!("/customers/{id}"), Vec::new()).await?;
        Ok(entity(value, "customer"))
    }

    async fn customer_stats(&self) -> ApiResult<Value> {
        self.get("/customers/stats", Vec::new()).await
    }

    async fn search_customers(&self, term: &str, limit: usize) -> ApiResult<Vec<Value>> {
        let value = self
            .get(
                "/customers",
                vec![
                    ("search".to_string(), json!(term)),
                    ("per_page".to_string(), json!(limit)),
                ],
            )
            .await?;
        let mut items = Page::from_response(&value, "customers", 1, limit).items;
        items.truncate(limit);
        Ok(items)
    }
}

#[async_trait(?Send)]
impl CustomerWriter for ApiClient<'_> {
    async fn create_customer(&self, payload: &Value) -> ApiResult<Value> {
        let value = self.post("/customers", Some(payload.clone())).await?;
        Ok(entity(value, "customer"))
    }

    async fn update_customer(&self, id: CustomerId, payload: &Value) -> ApiResult<Value> {
        let value = self.put(&format!("/customers/{id}"), payload.clone()).await?;
        Ok(entity(value, "customer"))
    }

    async fn delete_customer(&self, id: CustomerId) -> ApiResult<()> {
        self.delete(&format!("/customers/{id}")).await.map(|_| ())
    }

    async fn touch_last_contact(&self, id: CustomerId) -> ApiResult<Value> {
        let value = self.post(&format!("/customers/{id}/contact"), None).await?;
        Ok(entity(value, "customer"))
    }
}
