use actix_web::{Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use tera::Tera;

use crate::extract::{AuthenticatedUser, BackendSession};
use crate::forms::customer::CustomerForm;
use crate::forms::resource::DeleteForm;
use crate::models::catalog::messages;
use crate::routes::{base_context, choices, handle_service_error, insert_list, redirect, render_template};
use crate::services::{ServiceError, customers as customers_service};
use crate::ui::Placeholder;

const CUSTOMER_CHOICES: &[&str] = &[
    "customer_status",
    "customer_type",
    "customer_level",
    "customer_source",
    "industry",
];

#[get("/customers")]
pub async fn list_customers(
    query: web::Query<Vec<(String, String)>>,
    user: AuthenticatedUser,
    session: BackendSession,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let api = session.api();
    let limits = &session.config().pagination;

    match customers_service::list_customers(&api, &user.user, &query, limits).await {
        Ok(data) => {
            let mut context = base_context(
                &flash_messages,
                Some(&user),
                "customers",
                &session.config().notification,
            );
            insert_list(&mut context, "/customers", &data.state, &data.customers);
            context.insert("stats", &data.stats);
            context.insert("choices", &choices(CUSTOMER_CHOICES));
            if data.customers.items.is_empty() {
                context.insert("placeholder", &Placeholder::empty("暂无客户数据"));
            }
            render_template(&tera, "customers/index.html", &context)
        }
        Err(err @ (ServiceError::Unauthorized | ServiceError::SessionExpired)) => {
            handle_service_error(err, "/")
        }
        Err(err) => {
            log::error!("Failed to list customers: {err}");
            let mut context = base_context(
                &flash_messages,
                Some(&user),
                "customers",
                &session.config().notification,
            );
            context.insert("placeholder", &Placeholder::failed(err.to_string()));
            render_template(&tera, "customers/index.html", &context)
        }
    }
}

#[get("/customers/new")]
pub async fn new_customer(
    user: AuthenticatedUser,
    session: BackendSession,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let api = session.api();

    match customers_service::load_customer_form(&api, &user.user, None).await {
        Ok(data) => {
            let mut context = base_context(
                &flash_messages,
                Some(&user),
                "customers",
                &session.config().notification,
            );
            context.insert("form", &data.form);
            context.insert("customer_id", &data.customer_id);
            context.insert("choices", &choices(CUSTOMER_CHOICES));
            render_template(&tera, "customers/form.html", &context)
        }
        Err(err) => handle_service_error(err, "/customers"),
    }
}

#[post("/customers")]
pub async fn create_customer(
    user: AuthenticatedUser,
    session: BackendSession,
    web::Form(form): web::Form<CustomerForm>,
) -> impl Responder {
    let api = session.api();

    match customers_service::create_customer(&api, &user.user, form).await {
        Ok(id) => {
            FlashMessage::success(messages::CREATE).send();
            match id {
                Some(id) => redirect(&format!("/customers/{id}")),
                None => redirect("/customers"),
            }
        }
        Err(err) => handle_service_error(err, "/customers/new"),
    }
}

#[get("/customers/{customer_id}")]
pub async fn show_customer(
    customer_id: web::Path<i64>,
    user: AuthenticatedUser,
    session: BackendSession,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let api = session.api();

    match customers_service::show_customer(&api, &user.user, customer_id.into_inner()).await {
        Ok(data) => {
            let mut context = base_context(
                &flash_messages,
                Some(&user),
                "customers",
                &session.config().notification,
            );
            context.insert("customer", &data.customer);
            render_template(&tera, "customers/show.html", &context)
        }
        Err(err) => handle_service_error(err, "/customers"),
    }
}

#[get("/customers/{customer_id}/edit")]
pub async fn edit_customer(
    customer_id: web::Path<i64>,
    user: AuthenticatedUser,
    session: BackendSession,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let api = session.api();

    match customers_service::load_customer_form(&api, &user.user, Some(customer_id.into_inner()))
        .await
    {
        Ok(data) => {
            let mut context = base_context(
                &flash_messages,
                Some(&user),
                "customers",
                &session.config().notification,
            );
            context.insert("form", &data.form);
            context.insert("customer_id", &data.customer_id);
            context.insert("choices", &choices(CUSTOMER_CHOICES));
            render_template(&tera, "customers/form.html", &context)
        }
        Err(err) => handle_service_error(err, "/customers"),
    }
}

#[post("/customers/{customer_id}")]
pub async fn update_customer(
    customer_id: web::Path<i64>,
    user: AuthenticatedUser,
    session: BackendSession,
    web::Form(form): web::Form<CustomerForm>,
) -> impl Responder {
    let api = session.api();
    let customer_id = customer_id.into_inner();

    match customers_service::update_customer(&api, &user.user, customer_id, form).await {
        Ok(()) => {
            FlashMessage::success(messages::UPDATE).send();
            redirect(&format!("/customers/{customer_id}"))
        }
        Err(err) => handle_service_error(err, &format!("/customers/{customer_id}/edit")),
    }
}

#[get("/customers/{customer_id}/delete")]
pub async fn confirm_delete_customer(
    customer_id: web::Path<i64>,
    user: AuthenticatedUser,
    session: BackendSession,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let api = session.api();

    match customers_service::confirm_delete(&api, &user.user, customer_id.into_inner()).await {
        Ok(data) => {
            let mut context = base_context(
                &flash_messages,
                Some(&user),
                "customers",
                &session.config().notification,
            );
            context.insert("customer", &data.customer);
            context.insert("confirm_message", messages::CONFIRM_DELETE);
            render_template(&tera, "customers/delete.html", &context)
        }
        Err(err) => handle_service_error(err, "/customers"),
    }
}

#[post("/customers/{customer_id}/delete")]
pub async fn delete_customer(
    customer_id: web::Path<i64>,
    user: AuthenticatedUser,
    session: BackendSession,
    web::Form(form): web::Form<DeleteForm>,
) -> impl Responder {
    let api = session.api();
    let customer_id = customer_id.into_inner();

    match customers_service::delete_customer(&api, &user.user, customer_id, form).await {
        Ok(()) => {
            FlashMessage::success(messages::DELETE).send();
            redirect("/customers")
        }
        Err(err @ ServiceError::ConfirmationRequired) => {
            handle_service_error(err, &format!("/customers/{customer_id}/delete"))
        }
        Err(err) => handle_service_error(err, &format!("/customers/{customer_id}")),
    }
}

#[post("/customers/{customer_id}/contact")]
pub async fn touch_customer(
    customer_id: web::Path<i64>,
    user: AuthenticatedUser,
    session: BackendSession,
) -> impl Responder {
    let api = session.api();
    let customer_id = customer_id.into_inner();

    match customers_service::touch_last_contact(&api, &user.user, customer_id).await {
        Ok(()) => {
            FlashMessage::success(messages::UPDATE).send();
            redirect(&format!("/customers/{customer_id}"))
        }
        Err(err) => handle_service_error(err, &format!("/customers/{customer_id}")),
    }
}
