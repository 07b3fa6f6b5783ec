use actix_web::{HttpResponse, Responder, get, web};
use serde::Deserialize;

use crate::debounce::Debouncer;
use crate::extract::{AuthenticatedUser, BackendSession};
use crate::services::{ServiceError, customers as customers_service};

#[derive(Deserialize)]
struct SearchQueryParams {
    #[serde(default)]
    q: String,
}

/// Live customer search for the list page. Returns `superseded: true` when a
/// newer search from the same browser session replaced this one.
#[get("/v1/customers/search")]
pub async fn api_v1_customer_search(
    params: web::Query<SearchQueryParams>,
    user: AuthenticatedUser,
    session: BackendSession,
    debouncer: web::Data<Debouncer>,
) -> impl Responder {
    let api = session.api();
    let key = session.search_key();

    match customers_service::search_customers(
        &api,
        &user.user,
        &debouncer,
        &key,
        &params.q,
        &session.config().search,
    )
    .await
    {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(ServiceError::Unauthorized) => HttpResponse::Forbidden().finish(),
        Err(ServiceError::SessionExpired) => HttpResponse::Unauthorized().finish(),
        Err(err) => {
            log::error!("Failed to search customers: {err}");
            HttpResponse::InternalServerError().json(serde_json::json!({ "error": err.to_string() }))
        }
    }
}
