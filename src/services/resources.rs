//! Quote, contract and order workflows.

use serde_json::{Value, json};

use crate::api::{ResourceReader, ResourceWriter};
use crate::domain::resource::ResourceKind;
use crate::domain::types::ResourceId;
use crate::domain::user::User;
use crate::dto::resources::{ResourceListData, ResourceOutcome, ResourcePageData};
use crate::forms::resource::{DeleteForm, ReasonForm, ResourceForm};
use crate::models::catalog::messages;
use crate::models::config::PaginationConfig;
use crate::pagination::{ListOptions, ListState, Paginated, SortOrder};
use crate::services::{ServiceError, ServiceResult, ensure_permission};
use crate::session::{Permission, has_permission};

const SORTABLE: &[&str] = &["created_at", "updated_at", "status", "total_amount"];

pub fn list_options(kind: ResourceKind) -> ListOptions {
    ListOptions {
        filter_keys: kind.filters(),
        sortable: SORTABLE,
        default_sort: ("created_at", SortOrder::Desc),
    }
}

pub async fn list_resources<R>(
    repo: &R,
    user: &User,
    kind: ResourceKind,
    query: &[(String, String)],
    limits: &PaginationConfig,
) -> ServiceResult<ResourceListData>
where
    R: ResourceReader + ?Sized,
{
    ensure_permission(user, Permission::Read)?;

    let state = ListState::from_query(query, list_options(kind), limits);
    let page = repo.list_resources(kind, &state.to_api_query()).await?;

    Ok(ResourceListData {
        kind,
        items: Paginated::from(page),
        state,
    })
}

/// Loads the document, its related collection and the actions the user may
/// trigger. A failing related collection is left out.
pub async fn show_resource<R>(
    repo: &R,
    user: &User,
    kind: ResourceKind,
    resource_id: i64,
) -> ServiceResult<ResourcePageData>
where
    R: ResourceReader + ?Sized,
{
    ensure_permission(user, Permission::Read)?;

    let id = ResourceId::new(resource_id)?;
    let resource = repo.get_resource(kind, id).await?;

    let related = match kind.sub_resource() {
        Some(name) => match repo.sub_resource(kind, id, name).await {
            Ok(value) => Some(value),
            Err(err) if err.is_unauthorized() => return Err(ServiceError::SessionExpired),
            Err(err) => {
                log::warn!("Failed to load {name} of {} {id}: {err}", kind.singular());
                None
            }
        },
        None => None,
    };

    let actions = if has_permission(user, Permission::Write) {
        kind.actions().to_vec()
    } else {
        Vec::new()
    };

    Ok(ResourcePageData {
        kind,
        resource,
        related,
        actions,
    })
}

/// Editor rows for a new document or one pre-filled from the backend.
pub async fn load_resource_form<R>(
    repo: &R,
    user: &User,
    kind: ResourceKind,
    resource_id: Option<i64>,
) -> ServiceResult<ResourceForm>
where
    R: ResourceReader + ?Sized,
{
    ensure_permission(user, Permission::Write)?;

    match resource_id {
        Some(resource_id) => {
            let document = repo.get_resource(kind, ResourceId::new(resource_id)?).await?;
            Ok(ResourceForm::from_document(&document))
        }
        None => Ok(ResourceForm::default()),
    }
}

fn created_id(value: &Value) -> Option<i64> {
    value.get("id").and_then(Value::as_i64)
}

pub async fn create_resource<R>(
    repo: &R,
    user: &User,
    kind: ResourceKind,
    form: ResourceForm,
) -> ServiceResult<ResourceOutcome>
where
    R: ResourceWriter + ?Sized,
{
    ensure_permission(user, Permission::Write)?;

    let payload = form.into_payload()?;
    let created = repo.create_resource(kind, &payload).await?;

    Ok(ResourceOutcome {
        kind,
        id: created_id(&created),
    })
}

pub async fn update_resource<R>(
    repo: &R,
    user: &User,
    kind: ResourceKind,
    resource_id: i64,
    form: ResourceForm,
) -> ServiceResult<ResourceOutcome>
where
    R: ResourceWriter + ?Sized,
{
    ensure_permission(user, Permission::Write)?;

    let id = ResourceId::new(resource_id)?;
    let payload = form.into_payload()?;
    repo.update_resource(kind, id, &payload).await?;

    Ok(ResourceOutcome {
        kind,
        id: Some(id.get()),
    })
}

/// Loads the document shown on the delete confirmation page.
pub async fn confirm_delete<R>(
    repo: &R,
    user: &User,
    kind: ResourceKind,
    resource_id: i64,
) -> ServiceResult<Value>
where
    R: ResourceReader + ?Sized,
{
    ensure_permission(user, Permission::Delete)?;

    Ok(repo.get_resource(kind, ResourceId::new(resource_id)?).await?)
}

pub async fn delete_resource<R>(
    repo: &R,
    user: &User,
    kind: ResourceKind,
    resource_id: i64,
    form: DeleteForm,
) -> ServiceResult<()>
where
    R: ResourceWriter + ?Sized,
{
    ensure_permission(user, Permission::Delete)?;

    let id = ResourceId::new(resource_id)?;
    if !form.is_confirmed() {
        return Err(ServiceError::ConfirmationRequired);
    }

    repo.delete_resource(kind, id).await.map_err(|err| {
        log::error!("Failed to delete {} {id}: {err}", kind.singular());
        ServiceError::from(err)
    })
}

/// Triggers a lifecycle transition. Reject, cancel and terminate need a
/// reason. The outcome points at the copy when the action created one.
pub async fn perform_action<R>(
    repo: &R,
    user: &User,
    kind: ResourceKind,
    resource_id: i64,
    action: &str,
    form: ReasonForm,
) -> ServiceResult<ResourceOutcome>
where
    R: ResourceWriter + ?Sized,
{
    ensure_permission(user, Permission::Write)?;

    let id = ResourceId::new(resource_id)?;
    let action = kind
        .action(action)
        .ok_or_else(|| ServiceError::NotFound(messages::NOT_FOUND.to_string()))?;

    let body = if action.needs_reason {
        Some(json!({ "reason": form.reason()?.as_str() }))
    } else {
        None
    };

    let result = repo.perform(kind, id, action.name, body).await?;
    log::info!("{} {id}: {} by {}", kind.singular(), action.name, user.username);

    let target = match action.name {
        "copy" => created_id(&result).unwrap_or(id.get()),
        _ => id.get(),
    };

    Ok(ResourceOutcome {
        kind,
        id: Some(target),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockGateway;
    use crate::api::{ApiError, Page};
    use crate::session::permissions::user_with_role;

    #[tokio::test]
    async fn reject_requires_reason() {
        let mut repo = MockGateway::new();
        repo.expect_perform().never();

        let result = perform_action(
            &repo,
            &user_with_role("sales"),
            ResourceKind::Quotes,
            4,
            "reject",
            ReasonForm::default(),
        )
        .await;

        assert!(matches!(result, Err(ServiceError::Form(message)) if message == "请输入原因"));
    }

    #[tokio::test]
    async fn cancel_sends_reason_body() {
        let mut repo = MockGateway::new();
        repo.expect_perform()
            .withf(|kind, id, action, body| {
                *kind == ResourceKind::Orders
                    && id.get() == 8
                    && action == "cancel"
                    && *body == Some(json!({"reason": "客户取消"}))
            })
            .times(1)
            .returning(|_, _, _, _| Ok(json!({"id": 8, "status": "cancelled"})));

        let outcome = perform_action(
            &repo,
            &user_with_role("manager"),
            ResourceKind::Orders,
            8,
            "cancel",
            ReasonForm {
                reason: "客户取消".to_string(),
            },
        )
        .await
        .expect("cancelled");

        assert_eq!(outcome.id, Some(8));
    }

    #[tokio::test]
    async fn copy_redirects_to_new_quote() {
        let mut repo = MockGateway::new();
        repo.expect_perform()
            .times(1)
            .returning(|_, _, _, _| Ok(json!({"id": 21})));

        let outcome = perform_action(
            &repo,
            &user_with_role("sales"),
            ResourceKind::Quotes,
            4,
            "copy",
            ReasonForm::default(),
        )
        .await
        .expect("copied");

        assert_eq!(outcome.id, Some(21));
    }

    #[tokio::test]
    async fn unknown_actions_are_not_found() {
        let mut repo = MockGateway::new();
        repo.expect_perform().never();

        let result = perform_action(
            &repo,
            &user_with_role("admin"),
            ResourceKind::Contracts,
            1,
            "ship",
            ReasonForm::default(),
        )
        .await;

        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn support_sees_no_actions_and_missing_payments_are_skipped() {
        let mut repo = MockGateway::new();
        repo.expect_get_resource()
            .times(1)
            .returning(|_, _| Ok(json!({"id": 2, "status": "signed"})));
        repo.expect_sub_resource()
            .withf(|kind, _, name| *kind == ResourceKind::Contracts && name == "payments")
            .times(1)
            .returning(|_, _, _| Err(ApiError::from_status(500, None)));

        let data = show_resource(&repo, &user_with_role("support"), ResourceKind::Contracts, 2)
            .await
            .expect("detail loads");

        assert!(data.actions.is_empty());
        assert!(data.related.is_none());
    }

    #[tokio::test]
    async fn list_uses_kind_filters() {
        let mut repo = MockGateway::new();
        repo.expect_list_resources()
            .withf(|kind, query| {
                *kind == ResourceKind::Orders
                    && query.iter().any(|(k, v)| k == "priority" && v == "high")
                    && query.iter().all(|(k, _)| k != "industry")
            })
            .times(1)
            .returning(|_, _| Ok(Page::empty(1, 10)));

        let query: Vec<(String, String)> =
            serde_html_form::from_str("priority=high&industry=tech").expect("query");
        let data = list_resources(
            &repo,
            &user_with_role("support"),
            ResourceKind::Orders,
            &query,
            &PaginationConfig::default(),
        )
        .await
        .expect("list loads");

        assert!(!data.items.visible);
    }

    #[tokio::test]
    async fn delete_requires_confirmation() {
        let mut repo = MockGateway::new();
        repo.expect_delete_resource().never();

        let result = delete_resource(
            &repo,
            &user_with_role("admin"),
            ResourceKind::Quotes,
            3,
            DeleteForm::default(),
        )
        .await;

        assert!(matches!(result, Err(ServiceError::ConfirmationRequired)));
    }
}
