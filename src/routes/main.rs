use actix_web::{Responder, get, web};
use actix_web_flash_messages::IncomingFlashMessages;
use serde::Deserialize;
use tera::Tera;

use crate::extract::{AuthenticatedUser, BackendSession};
use crate::routes::{base_context, handle_service_error, render_template};
use crate::services::{ServiceError, dashboard as dashboard_service};
use crate::ui::Placeholder;

#[get("/")]
pub async fn show_dashboard(
    user: AuthenticatedUser,
    session: BackendSession,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let api = session.api();

    let ttl = session.config().session.page_cache_ttl();

    match dashboard_service::load_dashboard(&api, &user.user, session.cache(), ttl).await {
        Ok(data) => {
            let mut context = base_context(
                &flash_messages,
                Some(&user),
                "dashboard",
                &session.config().notification,
            );
            context.insert("stats", &data.stats);
            context.insert("activities", &data.activities);
            context.insert("errors", &data.errors);
            if data.activities.is_empty() {
                context.insert("activities_placeholder", &Placeholder::empty("暂无最近活动"));
            }
            render_template(&tera, "main/dashboard.html", &context)
        }
        Err(err) => handle_service_error(err, "/na"),
    }
}

#[derive(Deserialize)]
struct ReportQuery {
    report: Option<String>,
}

#[get("/reports")]
pub async fn show_reports(
    params: web::Query<ReportQuery>,
    user: AuthenticatedUser,
    session: BackendSession,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let api = session.api();

    match dashboard_service::load_reports(&api, &user.user, params.report.as_deref()).await {
        Ok(data) => {
            let mut context = base_context(
                &flash_messages,
                Some(&user),
                "reports",
                &session.config().notification,
            );
            context.insert("report", data.report);
            context.insert("reports", data.reports);
            context.insert("data", &data.data);
            render_template(&tera, "main/reports.html", &context)
        }
        Err(err @ (ServiceError::Unauthorized | ServiceError::SessionExpired)) => {
            handle_service_error(err, "/")
        }
        Err(err) => {
            log::error!("Failed to load report: {err}");
            let mut context = base_context(
                &flash_messages,
                Some(&user),
                "reports",
                &session.config().notification,
            );
            context.insert("report", params.report.as_deref().unwrap_or("sales"));
            context.insert("reports", dashboard_service::REPORTS);
            context.insert("placeholder", &Placeholder::failed(err.to_string()));
            render_template(&tera, "main/reports.html", &context)
        }
    }
}

#[get("/na")]
pub async fn not_assigned(
    user: AuthenticatedUser,
    session: BackendSession,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let context = base_context(
        &flash_messages,
        Some(&user),
        "na",
        &session.config().notification,
    );
    render_template(&tera, "main/not_assigned.html", &context)
}
