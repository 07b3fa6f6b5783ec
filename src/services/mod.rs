//! Page workflows between routes and the backend gateways.
//!
//! Services check permissions, validate forms and call the gateway traits;
//! routes only translate [`ServiceError`] into redirects and flash messages.

use thiserror::Error;

use crate::api::ApiError;
use crate::domain::types::TypeConstraintError;
use crate::domain::user::User;
use crate::forms::FormError;
use crate::models::catalog::messages;
use crate::session::permissions::{Permission, has_permission, has_role};
use crate::session::SessionError;

pub mod auth;
pub mod customers;
pub mod dashboard;
pub mod resources;
pub mod settings;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The user lacks the permission or role the page needs.
    #[error("{}", messages::FORBIDDEN)]
    Unauthorized,

    /// The backend no longer accepts the session; the user must sign in again.
    #[error("{}", messages::UNAUTHORIZED)]
    SessionExpired,

    /// The backend refused the operation with 403.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Local validation failed; carries the message to show.
    #[error("{0}")]
    Form(String),

    /// A destructive operation was submitted without confirmation.
    #[error("{}", messages::CONFIRM_DELETE)]
    ConfirmationRequired,

    #[error(transparent)]
    Api(ApiError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<ApiError> for ServiceError {
    fn from(err: ApiError) -> Self {
        if err.is_unauthorized() {
            return ServiceError::SessionExpired;
        }
        match err.status() {
            Some(403) => ServiceError::Forbidden(err.message()),
            Some(404) => ServiceError::NotFound(err.message()),
            _ => ServiceError::Api(err),
        }
    }
}

impl From<FormError> for ServiceError {
    fn from(err: FormError) -> Self {
        ServiceError::Form(err.to_string())
    }
}

impl From<TypeConstraintError> for ServiceError {
    fn from(err: TypeConstraintError) -> Self {
        match err {
            TypeConstraintError::NonPositiveId => ServiceError::NotFound(messages::NOT_FOUND.to_string()),
            other => ServiceError::Form(other.to_string()),
        }
    }
}

impl From<SessionError> for ServiceError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Form(err) => err.into(),
            SessionError::Api(err) => err.into(),
            SessionError::Storage(err) => ServiceError::Api(ApiError::Storage(err)),
        }
    }
}

/// Fails with [`ServiceError::Unauthorized`] unless the user holds `permission`.
pub fn ensure_permission(user: &User, permission: Permission) -> ServiceResult<()> {
    if has_permission(user, permission) {
        Ok(())
    } else {
        Err(ServiceError::Unauthorized)
    }
}

pub fn ensure_role(user: &User, role: &str) -> ServiceResult<()> {
    if has_role(user, role) {
        Ok(())
    } else {
        Err(ServiceError::Unauthorized)
    }
}
