use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;
use actix_web::{
    App, HttpResponse,
    http::{StatusCode, header},
    middleware::from_fn,
    test, web,
};

use crm_frontend::api::HttpClient;
use crm_frontend::middleware::{LOGIN_PATH, RedirectUnauthorized, silent_refresh};

mod common;

use common::{ScriptedTransport, server_config};

#[actix_web::test]
async fn unauthorized_becomes_login_redirect() {
    let app = test::init_service(
        App::new()
            .wrap(RedirectUnauthorized)
            .default_service(web::to(|| async { HttpResponse::Unauthorized().finish() })),
    )
    .await;

    let req = test::TestRequest::default().to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), LOGIN_PATH);
}

#[actix_web::test]
async fn forbidden_is_left_alone() {
    let app = test::init_service(
        App::new()
            .wrap(RedirectUnauthorized)
            .default_service(web::to(|| async { HttpResponse::Forbidden().body("no") })),
    )
    .await;

    let req = test::TestRequest::default().to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(resp.headers().get(header::LOCATION).is_none());
}

#[actix_web::test]
async fn silent_refresh_without_backend_client_is_a_no_op() {
    let app = test::init_service(
        App::new()
            .wrap(from_fn(silent_refresh))
            .default_service(web::to(|| async { HttpResponse::Ok().body("page") })),
    )
    .await;

    let req = test::TestRequest::default().to_request();
    let body = test::call_and_read_body(&app, req).await;

    assert_eq!(body, "page");
}

#[actix_web::test]
async fn anonymous_visit_triggers_no_refresh() {
    let config = server_config();
    let key = Key::from(config.secret.as_bytes());
    let transport = ScriptedTransport::new(vec![]);
    let http = HttpClient::new(config.resolved_api(), transport.clone()).with_default_interceptors();

    let app = test::init_service(
        App::new()
            .wrap(from_fn(silent_refresh))
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), key)
                    .cookie_secure(false)
                    .build(),
            )
            .app_data(web::Data::new(http))
            .app_data(web::Data::new(config))
            .default_service(web::to(|| async { HttpResponse::Ok().body("page") })),
    )
    .await;

    let req = test::TestRequest::default().to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(transport.sent().is_empty());
}
