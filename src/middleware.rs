//! Application middleware.

use std::future::{Future, Ready, ready};
use std::pin::Pin;

use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::{StatusCode, header};
use actix_web::middleware::Next;
use actix_web::{Error, HttpResponse, web};
use actix_web_flash_messages::FlashMessage;
use chrono::Utc;

use crate::api::HttpClient;
use crate::extract::session_cache;
use crate::models::catalog::messages;
use crate::models::config::ServerConfig;
use crate::session::{RefreshOutcome, SessionManager};

pub const LOGIN_PATH: &str = "/login";

/// Turns 401 responses into a `303 See Other` to the login page.
pub struct RedirectUnauthorized;

impl<S, B> Transform<S, ServiceRequest> for RedirectUnauthorized
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RedirectUnauthorizedMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RedirectUnauthorizedMiddleware { service }))
    }
}

pub struct RedirectUnauthorizedMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RedirectUnauthorizedMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;

            if res.status() == StatusCode::UNAUTHORIZED {
                let (req, _) = res.into_parts();
                let redirect = HttpResponse::SeeOther()
                    .insert_header((header::LOCATION, LOGIN_PATH))
                    .finish()
                    .map_into_right_body();
                return Ok(ServiceResponse::new(req, redirect));
            }

            Ok(res.map_into_left_body())
        })
    }
}

/// Runs one silent token refresh step before handling the request. A session
/// that can no longer be refreshed is cleared and sent to the login page.
pub async fn silent_refresh(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<EitherBody<impl MessageBody>>, Error> {
    let http = req.app_data::<web::Data<HttpClient>>().cloned();
    let config = req.app_data::<web::Data<ServerConfig>>().cloned();

    if let (Some(http), Some(config)) = (http, config) {
        let cache = session_cache(req.request());
        let api = http.bind(&cache);
        let manager = SessionManager::new(&api, &cache, &config.session);
        let now = Utc::now();

        if manager.restore(now).is_some()
            && manager.silent_refresh_tick(now).await == RefreshOutcome::LoggedOut
        {
            FlashMessage::warning(messages::UNAUTHORIZED).send();
            let redirect = HttpResponse::SeeOther()
                .insert_header((header::LOCATION, LOGIN_PATH))
                .finish()
                .map_into_right_body();
            return Ok(req.into_response(redirect));
        }
    }

    next.call(req)
        .await
        .map(ServiceResponse::map_into_left_body)
}
