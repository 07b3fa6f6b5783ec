use actix_web::{Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use tera::Tera;

use crate::extract::{AuthenticatedUser, BackendSession};
use crate::forms::resource::ResourceForm;
use crate::models::catalog::messages;
use crate::routes::{base_context, handle_service_error, parse_form, redirect, render_template};
use crate::services::settings::{self as settings_service, SettingsScope};
use crate::services::ServiceError;

#[get("/settings")]
pub async fn show_settings(
    user: AuthenticatedUser,
    session: BackendSession,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let api = session.api();

    match settings_service::load_settings(&api, &user.user).await {
        Ok(data) => {
            let mut context = base_context(
                &flash_messages,
                Some(&user),
                "settings",
                &session.config().notification,
            );
            context.insert("system", &data.system);
            context.insert("user_settings", &data.user);
            render_template(&tera, "settings/index.html", &context)
        }
        Err(err) => handle_service_error(err, "/"),
    }
}

#[post("/settings/{scope}")]
pub async fn save_settings(
    scope: web::Path<String>,
    user: AuthenticatedUser,
    session: BackendSession,
    body: web::Bytes,
) -> impl Responder {
    let Some(scope) = SettingsScope::from_segment(&scope) else {
        return handle_service_error(
            ServiceError::NotFound(messages::NOT_FOUND.to_string()),
            "/settings",
        );
    };
    let form = match parse_form::<ResourceForm>(&body) {
        Ok(form) => form,
        Err(err) => return handle_service_error(err, "/settings"),
    };
    let api = session.api();

    match settings_service::save_settings(&api, &user.user, scope, form).await {
        Ok(()) => {
            FlashMessage::success(messages::SAVE).send();
            redirect("/settings")
        }
        Err(err) => handle_service_error(err, "/settings"),
    }
}
