//! HTTP handlers and the helpers they share.

use std::collections::BTreeMap;

use actix_web::HttpResponse;
use actix_web::http::header;
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use tera::{Context, Tera};

use crate::extract::AuthenticatedUser;
use crate::models::catalog::{Choice, ChoiceKind, messages};
use crate::models::config::NotificationConfig;
use crate::pagination::{ListState, Paginated};
use crate::services::ServiceError;
use crate::ui::{Notification, alert_level_to_str, notification_level};

pub mod api;
pub mod auth;
pub mod customers;
pub mod main;
pub mod resources;
pub mod settings;

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

pub fn render_template(tera: &Tera, template: &str, context: &Context) -> HttpResponse {
    match tera.render(template, context) {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(err) => {
            log::error!("Failed to render template '{template}': {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Context shared by every page: notifications, the signed-in user and the
/// active navigation entry.
pub fn base_context(
    flash_messages: &IncomingFlashMessages,
    user: Option<&AuthenticatedUser>,
    current_page: &str,
    notifications: &NotificationConfig,
) -> Context {
    let alerts = flash_messages
        .iter()
        .map(|f| (f.content(), alert_level_to_str(&f.level())))
        .collect::<Vec<_>>();
    let toasts = flash_messages
        .iter()
        .map(|f| Notification::new(notification_level(&f.level()), f.content(), notifications))
        .collect::<Vec<_>>();

    let mut context = Context::new();
    context.insert("alerts", &alerts);
    context.insert("notifications", &toasts);
    context.insert("current_page", current_page);
    if let Some(user) = user {
        context.insert("current_user", user);
    }
    context
}

/// Everything a list template needs to render its toolbar, sortable headers
/// and pagination without building URLs itself.
pub fn insert_list<T: serde::Serialize>(
    context: &mut Context,
    base: &str,
    state: &ListState,
    items: &Paginated<T>,
) {
    context.insert("list", state);
    context.insert("base_url", base);
    context.insert("items", items);
    context.insert("page_links", &state.page_links(base, items));
    context.insert("sort_links", &state.sort_links(base));
    context.insert("page_size_links", &state.page_size_links(base));
    context.insert("reset_href", &state.reset_href(base));
    context.insert("current_href", &state.current_href(base));
}

/// Select options keyed by the name templates use.
pub fn choices(names: &[&'static str]) -> BTreeMap<&'static str, &'static [Choice]> {
    names
        .iter()
        .filter_map(|name| ChoiceKind::from_name(name).map(|kind| (*name, kind.choices())))
        .collect()
}

/// Decodes a form body that may repeat keys, e.g. the `field`/`value` rows of
/// the document editor.
pub fn parse_form<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, ServiceError> {
    serde_html_form::from_bytes(body).map_err(|err| {
        log::warn!("Malformed form body: {err}");
        ServiceError::Form(messages::VALIDATION_ERROR.to_string())
    })
}

/// Shared translation of service failures. `fallback` is where form and
/// backend errors send the user back to.
pub fn handle_service_error(err: ServiceError, fallback: &str) -> HttpResponse {
    match err {
        ServiceError::Unauthorized => {
            FlashMessage::error(messages::FORBIDDEN).send();
            redirect("/na")
        }
        ServiceError::SessionExpired => {
            FlashMessage::warning(messages::UNAUTHORIZED).send();
            redirect("/login")
        }
        ServiceError::Form(message) | ServiceError::Forbidden(message) => {
            FlashMessage::error(message).send();
            redirect(fallback)
        }
        ServiceError::NotFound(message) => {
            FlashMessage::error(message).send();
            redirect(fallback)
        }
        ServiceError::ConfirmationRequired => {
            FlashMessage::warning(messages::CONFIRM_DELETE).send();
            redirect(fallback)
        }
        ServiceError::Api(err) => {
            log::error!("Backend call failed: {err:?}");
            FlashMessage::error(err.message()).send();
            redirect(fallback)
        }
    }
}
