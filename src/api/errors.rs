use thiserror::Error;

use crate::cache::CacheError;
use crate::models::catalog::messages;

/// Normalised failure of a backend call. `Display` is the message shown to users.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{}", messages::NETWORK_ERROR)]
    NetworkUnavailable,

    #[error("{}", messages::TIMEOUT)]
    Timeout,

    #[error("{}", messages::UNAUTHORIZED)]
    SessionExpired,

    #[error("{}", messages::NO_REFRESH_TOKEN)]
    MissingRefreshToken,

    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("{}", messages::NETWORK_ERROR)]
    Transport(String),

    #[error("{}", messages::SERVER_ERROR)]
    Decode(String),

    /// A request body could not be encoded; nothing was sent.
    #[error("{}", messages::UNKNOWN_ERROR)]
    Encode(String),

    #[error("{}", messages::UNKNOWN_ERROR)]
    Storage(#[from] CacheError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Builds the error of a non-2xx response. A server-supplied message wins
    /// over the status default.
    pub fn from_status(status: u16, server_message: Option<String>) -> Self {
        let message = server_message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| default_status_message(status).to_string());
        ApiError::Http { status, message }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The backend no longer accepts the session's credentials.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            ApiError::SessionExpired | ApiError::MissingRefreshToken | ApiError::Http { status: 401, .. }
        )
    }
}

pub fn default_status_message(status: u16) -> &'static str {
    match status {
        401 => messages::UNAUTHORIZED,
        403 => messages::FORBIDDEN,
        404 => messages::NOT_FOUND,
        422 => messages::VALIDATION_ERROR,
        500 => messages::SERVER_ERROR,
        _ => messages::UNKNOWN_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_defaults() {
        assert_eq!(ApiError::from_status(403, None).message(), messages::FORBIDDEN);
        assert_eq!(ApiError::from_status(404, None).message(), messages::NOT_FOUND);
        assert_eq!(ApiError::from_status(422, None).message(), messages::VALIDATION_ERROR);
        assert_eq!(ApiError::from_status(500, None).message(), messages::SERVER_ERROR);
        assert_eq!(ApiError::from_status(418, None).message(), messages::UNKNOWN_ERROR);
    }

    #[test]
    fn server_message_overrides_default() {
        let err = ApiError::from_status(400, Some("客户名称已存在".to_string()));
        assert_eq!(err.message(), "客户名称已存在");
        assert_eq!(err.status(), Some(400));

        let blank = ApiError::from_status(500, Some("  ".to_string()));
        assert_eq!(blank.message(), messages::SERVER_ERROR);
    }

    #[test]
    fn timeout_is_distinct_from_network_failure() {
        assert_eq!(ApiError::Timeout.message(), "请求超时");
        assert_ne!(ApiError::Timeout.message(), ApiError::NetworkUnavailable.message());
    }
}
