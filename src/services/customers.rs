//! Customer list, detail, editor and live search workflows.

use serde_json::Value;

use crate::api::{CustomerReader, CustomerWriter};
use crate::debounce::Debouncer;
use crate::domain::types::{CustomerId, SearchTerm};
use crate::domain::user::User;
use crate::dto::customers::{
    CustomerFormData, CustomerListData, CustomerPageData, CustomerSuggestion, SearchResponse,
};
use crate::forms::customer::CustomerForm;
use crate::forms::resource::DeleteForm;
use crate::models::config::{PaginationConfig, SearchConfig};
use crate::pagination::{ListOptions, ListState, Paginated, SortOrder};
use crate::services::{ServiceError, ServiceResult, ensure_permission};
use crate::session::Permission;

pub const CUSTOMER_LIST: ListOptions = ListOptions {
    filter_keys: &["search", "status", "type", "level", "industry", "source"],
    sortable: &["name", "company", "status", "level", "last_contact", "created_at"],
    default_sort: ("created_at", SortOrder::Desc),
};

/// Loads one page of customers. The stats panel is optional and disappears
/// when the backend cannot provide it.
pub async fn list_customers<R>(
    repo: &R,
    user: &User,
    query: &[(String, String)],
    limits: &PaginationConfig,
) -> ServiceResult<CustomerListData>
where
    R: CustomerReader + ?Sized,
{
    ensure_permission(user, Permission::Read)?;

    let state = ListState::from_query(query, CUSTOMER_LIST, limits);
    let page = repo.list_customers(&state.to_api_query()).await?;

    let stats = match repo.customer_stats().await {
        Ok(stats) => Some(stats),
        Err(err) if err.is_unauthorized() => return Err(ServiceError::SessionExpired),
        Err(err) => {
            log::warn!("Failed to load customer stats: {err}");
            None
        }
    };

    Ok(CustomerListData {
        customers: Paginated::from(page),
        state,
        stats,
    })
}

/// Debounced live search keyed by the caller's session.
///
/// Terms shorter than `min_query_length` return nothing without a backend
/// call. A search replaced by a newer one from the same session is reported
/// as superseded, also without a backend call.
pub async fn search_customers<R>(
    repo: &R,
    user: &User,
    debouncer: &Debouncer,
    session_key: &str,
    term: &str,
    config: &SearchConfig,
) -> ServiceResult<SearchResponse>
where
    R: CustomerReader + ?Sized,
{
    ensure_permission(user, Permission::Read)?;

    let query = term.trim().to_string();
    let response = |results, superseded| SearchResponse {
        query: query.clone(),
        results,
        superseded,
    };

    if query.chars().count() < config.min_query_length {
        return Ok(response(Vec::new(), false));
    }
    let Ok(term) = SearchTerm::new(query.as_str()) else {
        return Ok(response(Vec::new(), false));
    };

    if !debouncer.settle(session_key).await {
        return Ok(response(Vec::new(), true));
    }

    let customers = repo.search_customers(term.as_str(), config.max_results).await?;
    let results = customers
        .iter()
        .map(CustomerSuggestion::from_customer)
        .collect();

    Ok(response(results, false))
}

pub async fn show_customer<R>(repo: &R, user: &User, customer_id: i64) -> ServiceResult<CustomerPageData>
where
    R: CustomerReader + ?Sized,
{
    ensure_permission(user, Permission::Read)?;

    let customer = repo.get_customer(CustomerId::new(customer_id)?).await?;
    Ok(CustomerPageData { customer })
}

/// Empty editor for a new customer, or one pre-filled from the backend.
pub async fn load_customer_form<R>(
    repo: &R,
    user: &User,
    customer_id: Option<i64>,
) -> ServiceResult<CustomerFormData>
where
    R: CustomerReader + ?Sized,
{
    ensure_permission(user, Permission::Write)?;

    let Some(customer_id) = customer_id else {
        return Ok(CustomerFormData {
            form: CustomerForm::default(),
            customer_id: None,
        });
    };

    let id = CustomerId::new(customer_id)?;
    let customer = repo.get_customer(id).await?;
    Ok(CustomerFormData {
        form: CustomerForm::from_customer(&customer),
        customer_id: Some(id.get()),
    })
}

/// Returns the id of the created customer when the backend reports one.
pub async fn create_customer<R>(repo: &R, user: &User, form: CustomerForm) -> ServiceResult<Option<i64>>
where
    R: CustomerWriter + ?Sized,
{
    ensure_permission(user, Permission::Write)?;

    let payload = form.into_payload()?;
    let created = repo.create_customer(&payload).await?;

    Ok(created.get("id").and_then(Value::as_i64))
}

pub async fn update_customer<R>(
    repo: &R,
    user: &User,
    customer_id: i64,
    form: CustomerForm,
) -> ServiceResult<()>
where
    R: CustomerWriter + ?Sized,
{
    ensure_permission(user, Permission::Write)?;

    let id = CustomerId::new(customer_id)?;
    let payload = form.into_payload()?;
    repo.update_customer(id, &payload).await?;

    Ok(())
}

/// Loads the customer shown on the delete confirmation page.
pub async fn confirm_delete<R>(repo: &R, user: &User, customer_id: i64) -> ServiceResult<CustomerPageData>
where
    R: CustomerReader + ?Sized,
{
    ensure_permission(user, Permission::Delete)?;

    let customer = repo.get_customer(CustomerId::new(customer_id)?).await?;
    Ok(CustomerPageData { customer })
}

/// Deletes only when the confirmation step was completed.
pub async fn delete_customer<R>(
    repo: &R,
    user: &User,
    customer_id: i64,
    form: DeleteForm,
) -> ServiceResult<()>
where
    R: CustomerWriter + ?Sized,
{
    ensure_permission(user, Permission::Delete)?;

    let id = CustomerId::new(customer_id)?;
    if !form.is_confirmed() {
        return Err(ServiceError::ConfirmationRequired);
    }

    repo.delete_customer(id).await.map_err(|err| {
        log::error!("Failed to delete customer {id}: {err}");
        ServiceError::from(err)
    })
}

/// Records that the user just contacted the customer.
pub async fn touch_last_contact<R>(repo: &R, user: &User, customer_id: i64) -> ServiceResult<()>
where
    R: CustomerWriter + ?Sized,
{
    ensure_permission(user, Permission::Write)?;

    repo.touch_last_contact(CustomerId::new(customer_id)?).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::api::{ApiError, Page};
    use crate::api::mock::MockGateway;
    use crate::session::permissions::user_with_role;

    fn query(raw: &str) -> Vec<(String, String)> {
        serde_html_form::from_str(raw).expect("query parses")
    }

    /// Page 2 filtered by status sends no other filter keys.
    #[tokio::test]
    async fn list_sends_only_non_empty_filters() {
        let mut repo = MockGateway::new();
        repo.expect_list_customers()
            .withf(|query| {
                let has = |key: &str, value: &str| {
                    query.iter().any(|(k, v)| k == key && v == value)
                };
                has("page", "2")
                    && has("status", "active")
                    && ["type", "level", "industry", "source"]
                        .iter()
                        .all(|absent| query.iter().all(|(k, _)| k != absent))
            })
            .times(1)
            .returning(|_| {
                Ok(Page {
                    items: vec![json!({"id": 11, "name": "Acme"})],
                    total: 11,
                    page: 2,
                    per_page: 10,
                    pages: 2,
                })
            });
        repo.expect_customer_stats()
            .times(1)
            .returning(|| Err(ApiError::from_status(500, None)));

        let data = list_customers(
            &repo,
            &user_with_role("sales"),
            &query("page=2&status=active&type=&level=&industry=&source="),
            &PaginationConfig::default(),
        )
        .await
        .expect("list loads");

        assert_eq!(data.customers.page, 2);
        assert_eq!(data.customers.total, 11);
        assert!(data.customers.has_previous);
        assert!(data.stats.is_none());
    }

    #[tokio::test]
    async fn delete_without_confirmation_makes_no_call() {
        let mut repo = MockGateway::new();
        repo.expect_delete_customer().never();

        let result = delete_customer(&repo, &user_with_role("manager"), 5, DeleteForm::default()).await;

        assert!(matches!(result, Err(ServiceError::ConfirmationRequired)));
    }

    #[tokio::test]
    async fn confirmed_delete_calls_backend() {
        let mut repo = MockGateway::new();
        repo.expect_delete_customer()
            .withf(|id| id.get() == 5)
            .times(1)
            .returning(|_| Ok(()));

        delete_customer(&repo, &user_with_role("manager"), 5, DeleteForm::confirmed())
            .await
            .expect("deleted");
    }

    #[tokio::test]
    async fn sales_cannot_delete() {
        let mut repo = MockGateway::new();
        repo.expect_delete_customer().never();

        let result = delete_customer(&repo, &user_with_role("sales"), 5, DeleteForm::confirmed()).await;

        assert!(matches!(result, Err(ServiceError::Unauthorized)));
    }

    #[tokio::test]
    async fn create_strips_empty_fields() {
        let mut repo = MockGateway::new();
        repo.expect_create_customer()
            .withf(|payload| *payload == json!({"name": "Acme", "status": "active"}))
            .times(1)
            .returning(|_| Ok(json!({"id": 12, "name": "Acme"})));

        let form = CustomerForm {
            name: " Acme ".to_string(),
            status: "active".to_string(),
            ..CustomerForm::default()
        };

        let id = create_customer(&repo, &user_with_role("sales"), form)
            .await
            .expect("created");

        assert_eq!(id, Some(12));
    }

    #[tokio::test]
    async fn invalid_customer_never_reaches_backend() {
        let mut repo = MockGateway::new();
        repo.expect_update_customer().never();

        let result = update_customer(
            &repo,
            &user_with_role("sales"),
            3,
            CustomerForm::default(),
        )
        .await;

        assert!(matches!(result, Err(ServiceError::Form(message)) if message == "请输入客户名称"));
    }

    #[tokio::test]
    async fn non_positive_ids_are_not_found() {
        let repo = MockGateway::new();

        let result = show_customer(&repo, &user_with_role("support"), 0).await;

        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn short_search_terms_skip_backend() {
        let mut repo = MockGateway::new();
        repo.expect_search_customers().never();
        let debouncer = Debouncer::new(Duration::from_millis(300));

        let response = search_customers(
            &repo,
            &user_with_role("sales"),
            &debouncer,
            "session",
            " a ",
            &SearchConfig::default(),
        )
        .await
        .expect("search runs");

        assert!(response.results.is_empty());
        assert!(!response.superseded);
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_search_skips_backend() {
        let mut repo = MockGateway::new();
        repo.expect_search_customers()
            .withf(|term, limit| term == "acme" && *limit == 50)
            .times(1)
            .returning(|_, _| Ok(vec![json!({"id": 1, "name": "Acme", "company": ""})]));
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let user = user_with_role("sales");
        let config = SearchConfig::default();

        let first = search_customers(&repo, &user, &debouncer, "session", "ac", &config);
        let second = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            search_customers(&repo, &user, &debouncer, "session", "acme", &config).await
        };
        let (first, second) = tokio::join!(first, second);

        assert!(first.expect("first").superseded);
        let second = second.expect("second");
        assert!(!second.superseded);
        assert_eq!(
            second.results,
            vec![CustomerSuggestion {
                id: json!(1),
                name: "Acme".to_string(),
                company: None,
            }]
        );
    }
}
