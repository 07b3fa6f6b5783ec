//! Quotes, contracts and orders share these handlers; the first path segment
//! selects the kind.

use actix_web::{HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use tera::{Context, Tera};

use crate::domain::resource::ResourceKind;
use crate::dto::resources::ResourceOutcome;
use crate::extract::{AuthenticatedUser, BackendSession};
use crate::forms::resource::{DeleteForm, ReasonForm, ResourceForm};
use crate::models::catalog::messages;
use crate::routes::{
    base_context, choices, handle_service_error, insert_list, parse_form, redirect,
    render_template,
};
use crate::services::{ServiceError, resources as resources_service};
use crate::ui::Placeholder;

fn resource_kind(segment: &str) -> Result<ResourceKind, HttpResponse> {
    ResourceKind::from_segment(segment).ok_or_else(|| {
        handle_service_error(ServiceError::NotFound(messages::NOT_FOUND.to_string()), "/")
    })
}

fn page_context(
    flash_messages: &IncomingFlashMessages,
    user: &AuthenticatedUser,
    session: &BackendSession,
    kind: ResourceKind,
) -> Context {
    let mut context = base_context(
        flash_messages,
        Some(user),
        kind.segment(),
        &session.config().notification,
    );
    context.insert("kind", kind.segment());
    context.insert("title", kind.title());
    context.insert("status_kind", kind.singular());
    context
}

fn outcome_location(outcome: &ResourceOutcome) -> String {
    match outcome.id {
        Some(id) => format!("/{}/{id}", outcome.kind.segment()),
        None => format!("/{}", outcome.kind.segment()),
    }
}

fn editor_rows(form: &ResourceForm) -> Vec<(&str, &str)> {
    form.field
        .iter()
        .zip(&form.value)
        .map(|(field, value)| (field.as_str(), value.as_str()))
        .collect()
}

#[get("/{kind:quotes|contracts|orders}")]
pub async fn list_resources(
    kind: web::Path<String>,
    query: web::Query<Vec<(String, String)>>,
    user: AuthenticatedUser,
    session: BackendSession,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let kind = match resource_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    let api = session.api();
    let limits = &session.config().pagination;

    match resources_service::list_resources(&api, &user.user, kind, &query, limits).await {
        Ok(data) => {
            let mut context = page_context(&flash_messages, &user, &session, kind);
            let base = format!("/{}", kind.segment());
            insert_list(&mut context, &base, &data.state, &data.items);
            context.insert("choices", &choices(&[kind.singular(), "priority"]));
            if data.items.items.is_empty() {
                context.insert("placeholder", &Placeholder::empty("暂无数据"));
            }
            render_template(&tera, "resources/index.html", &context)
        }
        Err(err @ (ServiceError::Unauthorized | ServiceError::SessionExpired)) => {
            handle_service_error(err, "/")
        }
        Err(err) => {
            log::error!("Failed to list {}: {err}", kind.segment());
            let mut context = page_context(&flash_messages, &user, &session, kind);
            context.insert("placeholder", &Placeholder::failed(err.to_string()));
            render_template(&tera, "resources/index.html", &context)
        }
    }
}

#[get("/{kind:quotes|contracts|orders}/new")]
pub async fn new_resource(
    kind: web::Path<String>,
    user: AuthenticatedUser,
    session: BackendSession,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let kind = match resource_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    let api = session.api();

    match resources_service::load_resource_form(&api, &user.user, kind, None).await {
        Ok(form) => {
            let mut context = page_context(&flash_messages, &user, &session, kind);
            context.insert("rows", &editor_rows(&form));
            context.insert("resource_id", &None::<i64>);
            render_template(&tera, "resources/form.html", &context)
        }
        Err(err) => handle_service_error(err, &format!("/{}", kind.segment())),
    }
}

#[post("/{kind:quotes|contracts|orders}")]
pub async fn create_resource(
    kind: web::Path<String>,
    user: AuthenticatedUser,
    session: BackendSession,
    body: web::Bytes,
) -> impl Responder {
    let kind = match resource_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    let fallback = format!("/{}/new", kind.segment());
    let form = match parse_form::<ResourceForm>(&body) {
        Ok(form) => form,
        Err(err) => return handle_service_error(err, &fallback),
    };
    let api = session.api();

    match resources_service::create_resource(&api, &user.user, kind, form).await {
        Ok(outcome) => {
            FlashMessage::success(messages::CREATE).send();
            redirect(&outcome_location(&outcome))
        }
        Err(err) => handle_service_error(err, &fallback),
    }
}

#[get("/{kind:quotes|contracts|orders}/{resource_id}")]
pub async fn show_resource(
    path: web::Path<(String, i64)>,
    user: AuthenticatedUser,
    session: BackendSession,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let (kind, resource_id) = path.into_inner();
    let kind = match resource_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    let api = session.api();

    match resources_service::show_resource(&api, &user.user, kind, resource_id).await {
        Ok(data) => {
            let mut context = page_context(&flash_messages, &user, &session, kind);
            context.insert("resource", &data.resource);
            context.insert("related", &data.related);
            context.insert("related_name", &kind.sub_resource());
            context.insert("actions", &data.actions);
            render_template(&tera, "resources/show.html", &context)
        }
        Err(err) => handle_service_error(err, &format!("/{}", kind.segment())),
    }
}

#[get("/{kind:quotes|contracts|orders}/{resource_id}/edit")]
pub async fn edit_resource(
    path: web::Path<(String, i64)>,
    user: AuthenticatedUser,
    session: BackendSession,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let (kind, resource_id) = path.into_inner();
    let kind = match resource_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    let api = session.api();

    match resources_service::load_resource_form(&api, &user.user, kind, Some(resource_id)).await {
        Ok(form) => {
            let mut context = page_context(&flash_messages, &user, &session, kind);
            context.insert("rows", &editor_rows(&form));
            context.insert("resource_id", &Some(resource_id));
            render_template(&tera, "resources/form.html", &context)
        }
        Err(err) => handle_service_error(err, &format!("/{}/{resource_id}", kind.segment())),
    }
}

#[post("/{kind:quotes|contracts|orders}/{resource_id}")]
pub async fn update_resource(
    path: web::Path<(String, i64)>,
    user: AuthenticatedUser,
    session: BackendSession,
    body: web::Bytes,
) -> impl Responder {
    let (kind, resource_id) = path.into_inner();
    let kind = match resource_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    let fallback = format!("/{}/{resource_id}/edit", kind.segment());
    let form = match parse_form::<ResourceForm>(&body) {
        Ok(form) => form,
        Err(err) => return handle_service_error(err, &fallback),
    };
    let api = session.api();

    match resources_service::update_resource(&api, &user.user, kind, resource_id, form).await {
        Ok(outcome) => {
            FlashMessage::success(messages::UPDATE).send();
            redirect(&outcome_location(&outcome))
        }
        Err(err) => handle_service_error(err, &fallback),
    }
}

#[get("/{kind:quotes|contracts|orders}/{resource_id}/delete")]
pub async fn confirm_delete_resource(
    path: web::Path<(String, i64)>,
    user: AuthenticatedUser,
    session: BackendSession,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let (kind, resource_id) = path.into_inner();
    let kind = match resource_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    let api = session.api();

    match resources_service::confirm_delete(&api, &user.user, kind, resource_id).await {
        Ok(resource) => {
            let mut context = page_context(&flash_messages, &user, &session, kind);
            context.insert("resource", &resource);
            context.insert("confirm_message", messages::CONFIRM_DELETE);
            render_template(&tera, "resources/delete.html", &context)
        }
        Err(err) => handle_service_error(err, &format!("/{}", kind.segment())),
    }
}

#[post("/{kind:quotes|contracts|orders}/{resource_id}/delete")]
pub async fn delete_resource(
    path: web::Path<(String, i64)>,
    user: AuthenticatedUser,
    session: BackendSession,
    web::Form(form): web::Form<DeleteForm>,
) -> impl Responder {
    let (kind, resource_id) = path.into_inner();
    let kind = match resource_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    let api = session.api();

    match resources_service::delete_resource(&api, &user.user, kind, resource_id, form).await {
        Ok(()) => {
            FlashMessage::success(messages::DELETE).send();
            redirect(&format!("/{}", kind.segment()))
        }
        Err(err @ ServiceError::ConfirmationRequired) => handle_service_error(
            err,
            &format!("/{}/{resource_id}/delete", kind.segment()),
        ),
        Err(err) => handle_service_error(err, &format!("/{}/{resource_id}", kind.segment())),
    }
}

#[post("/{kind:quotes|contracts|orders}/{resource_id}/actions/{action}")]
pub async fn perform_action(
    path: web::Path<(String, i64, String)>,
    user: AuthenticatedUser,
    session: BackendSession,
    web::Form(form): web::Form<ReasonForm>,
) -> impl Responder {
    let (kind, resource_id, action) = path.into_inner();
    let kind = match resource_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    let api = session.api();

    match resources_service::perform_action(&api, &user.user, kind, resource_id, &action, form).await
    {
        Ok(outcome) => {
            FlashMessage::success(messages::UPDATE).send();
            redirect(&outcome_location(&outcome))
        }
        Err(err) => handle_service_error(err, &format!("/{}/{resource_id}", kind.segment())),
    }
}
