use actix_web::{HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use tera::Tera;

use crate::extract::{AuthenticatedUser, BackendSession};
use crate::forms::auth::{ChangePasswordForm, LoginForm, ProfileForm, RegisterForm};
use crate::models::catalog::messages;
use crate::routes::{base_context, handle_service_error, redirect, render_template};
use crate::services::{ServiceError, auth as auth_service};

#[get("/login")]
pub async fn show_login(
    session: BackendSession,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let api = session.api();
    if session.manager(&api).is_authenticated() {
        return redirect("/");
    }

    let context = base_context(
        &flash_messages,
        None,
        "login",
        &session.config().notification,
    );
    render_template(&tera, "auth/login.html", &context)
}

#[post("/login")]
pub async fn login(session: BackendSession, web::Form(form): web::Form<LoginForm>) -> impl Responder {
    let api = session.api();
    let manager = session.manager(&api);

    match auth_service::login(&manager, form).await {
        Ok(user) => {
            log::info!("User {} signed in", user.username);
            FlashMessage::success(messages::LOGIN).send();
            redirect("/")
        }
        Err(ServiceError::Form(message)) => {
            FlashMessage::error(message).send();
            redirect("/login")
        }
        Err(err) => {
            log::error!("Failed to sign in: {err}");
            FlashMessage::error(err.to_string()).send();
            redirect("/login")
        }
    }
}

#[get("/register")]
pub async fn show_register(
    session: BackendSession,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let context = base_context(
        &flash_messages,
        None,
        "register",
        &session.config().notification,
    );
    render_template(&tera, "auth/register.html", &context)
}

#[post("/register")]
pub async fn register(
    session: BackendSession,
    web::Form(form): web::Form<RegisterForm>,
) -> impl Responder {
    let api = session.api();
    let manager = session.manager(&api);

    match auth_service::register(&manager, form).await {
        Ok(()) => {
            FlashMessage::success(messages::REGISTER).send();
            redirect("/login")
        }
        Err(ServiceError::Form(message)) => {
            FlashMessage::error(message).send();
            redirect("/register")
        }
        Err(err) => {
            log::error!("Failed to register: {err}");
            FlashMessage::error(err.to_string()).send();
            redirect("/register")
        }
    }
}

#[post("/logout")]
pub async fn logout(session: BackendSession) -> impl Responder {
    let api = session.api();
    let manager = session.manager(&api);

    auth_service::logout(&manager).await;
    FlashMessage::success(messages::LOGOUT).send();
    redirect("/login")
}

#[get("/profile")]
pub async fn show_profile(
    user: AuthenticatedUser,
    session: BackendSession,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let api = session.api();
    let manager = session.manager(&api);

    match auth_service::load_profile(&manager).await {
        Ok(profile) => {
            let user = AuthenticatedUser::new(profile);
            let mut context = base_context(
                &flash_messages,
                Some(&user),
                "profile",
                &session.config().notification,
            );
            context.insert("profile", &user.user);
            render_template(&tera, "auth/profile.html", &context)
        }
        Err(err @ ServiceError::SessionExpired) => handle_service_error(err, "/"),
        Err(err) => {
            log::warn!("Showing cached profile of {}: {err}", user.user.username);
            let mut context = base_context(
                &flash_messages,
                Some(&user),
                "profile",
                &session.config().notification,
            );
            context.insert("profile", &user.user);
            context.insert("load_error", &err.to_string());
            render_template(&tera, "auth/profile.html", &context)
        }
    }
}

#[post("/profile")]
pub async fn update_profile(
    _user: AuthenticatedUser,
    session: BackendSession,
    web::Form(form): web::Form<ProfileForm>,
) -> impl Responder {
    let api = session.api();
    let manager = session.manager(&api);

    match auth_service::update_profile(&manager, form).await {
        Ok(_) => {
            FlashMessage::success(messages::UPDATE).send();
            redirect("/profile")
        }
        Err(err) => handle_service_error(err, "/profile"),
    }
}

#[post("/profile/password")]
pub async fn change_password(
    _user: AuthenticatedUser,
    session: BackendSession,
    web::Form(form): web::Form<ChangePasswordForm>,
) -> HttpResponse {
    let api = session.api();
    let manager = session.manager(&api);

    match auth_service::change_password(&manager, form).await {
        Ok(()) => {
            FlashMessage::success("密码修改成功，请重新登录").send();
            redirect("/login")
        }
        Err(err) => handle_service_error(err, "/profile"),
    }
}
