use async_trait::async_trait;
use serde_json::Value;

use crate::api::client::ApiClient;
use crate::api::errors::ApiResult;
use crate::api::request::ApiRequest;
use crate::api::{Page, ResourceReader, ResourceWriter, entity, query_number};
use crate::domain::resource::ResourceKind;
use crate::domain::types::ResourceId;

fn collection_path(kind: ResourceKind) -> String {
    format!("/{}", kind.segment())
}

fn item_path(kind: ResourceKind, id: ResourceId) -> String {
    format!("/{}/{id}", kind.segment())
}

#[async_trait(?Send)]
impl ResourceReader for ApiClient<'_> {
    async fn list_resources(
        &self,
        kind: ResourceKind,
        query: &[(String, String)],
    ) -> ApiResult<Page> {
        let mut request = ApiRequest::get(collection_path(kind));
        request.query.extend_from_slice(query);
        let value = self.send_json(request).await?;
        Ok(Page::from_response(
            &value,
            kind.segment(),
            query_number(query, "page", 1),
            query_number(query, "per_page", 10),
        ))
    }

    async fn get_resource(&self, kind: ResourceKind, id: ResourceId) -> ApiResult<Value> {
        let value = self.get(&item_path(kind, id), Vec::new()).await?;
        Ok(entity(value, kind.singular()))
    }

    async fn sub_resource(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        name: &str,
    ) -> ApiResult<Value> {
        let value = self
            .get(&format!("{}/{name}", item_path(kind, id)), Vec::new())
            .await?;
        Ok(entity(value, name))
    }
}

#[async_trait(?Send)]
impl ResourceWriter for ApiClient<'_> {
    async fn create_resource(&self, kind: ResourceKind, payload: &Value) -> ApiResult<Value> {
        let value = self.post(&collection_path(kind), Some(payload.clone())).await?;
        Ok(entity(value, kind.singular()))
    }

    async fn update_resource(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        payload: &Value,
    ) -> ApiResult<Value> {
        let value = self.put(&item_path(kind, id), payload.clone()).await?;
        Ok(entity(value, kind.singular()))
    }

    async fn delete_resource(&self, kind: ResourceKind, id: ResourceId) -> ApiResult<()> {
        self.delete(&item_path(kind, id)).await.map(|_| ())
    }

    async fn perform(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        action: &str,
        body: Option<Value>,
    ) -> ApiResult<Value> {
        self.post(&format!("{}/{action}", item_path(kind, id)), body)
            .await
    }
}
