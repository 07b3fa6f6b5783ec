//! Structural checks on access tokens. Signatures are the backend's business;
//! the front end only looks at shape and the `exp` claim.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

/// Tokens issued by the backend's development stub.
pub const MOCK_TOKEN_PREFIX: &str = "mock_token_";
const MIN_TOKEN_LENGTH: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token payload is not valid base64")]
    Encoding,
    #[error("token payload is not valid JSON")]
    Payload,
}

#[derive(Deserialize)]
struct Claims {
    exp: Option<i64>,
}

/// Expiry encoded in a JWT-shaped token. `Ok(None)` for tokens that carry no
/// payload or no `exp` claim.
pub fn expires_at(token: &str) -> Result<Option<DateTime<Utc>>, TokenError> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload)) = (parts.next(), parts.next()) else {
        return Ok(None);
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| TokenError::Encoding)?;
    let claims: Claims = serde_json::from_slice(&bytes).map_err(|_| TokenError::Payload)?;

    Ok(claims.exp.and_then(|exp| DateTime::from_timestamp(exp, 0)))
}

/// A token is trusted when it is long enough and, if it is JWT-shaped, its
/// payload decodes and has not expired.
pub fn is_valid_token(token: &str, now: DateTime<Utc>) -> bool {
    if token.len() < MIN_TOKEN_LENGTH {
        return false;
    }
    if token.starts_with(MOCK_TOKEN_PREFIX) {
        return true;
    }
    if !token.contains('.') {
        return true;
    }
    match expires_at(token) {
        Ok(Some(expiry)) => expiry > now,
        Ok(None) => true,
        Err(err) => {
            log::debug!("Rejecting malformed token: {err}");
            false
        }
    }
}

/// The token expires before `now + buffer`.
pub fn expires_within(token: &str, buffer: std::time::Duration, now: DateTime<Utc>) -> bool {
    let Ok(Some(expiry)) = expires_at(token) else {
        return false;
    };
    let buffer = chrono::Duration::from_std(buffer).unwrap_or(chrono::Duration::zero());
    expiry <= now + buffer
}

#[cfg(test)]
pub(crate) fn jwt_with_exp(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"1","exp":{exp}}}"#));
    format!("{header}.{payload}.signature")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn short_tokens_are_invalid() {
        assert!(!is_valid_token("", Utc::now()));
        assert!(!is_valid_token("abc.def", Utc::now()));
    }

    #[test]
    fn mock_and_opaque_tokens_are_valid() {
        assert!(is_valid_token("mock_token_12345", Utc::now()));
        assert!(is_valid_token("opaque-session-token", Utc::now()));
    }

    #[test]
    fn jwt_expiry_is_checked() {
        let now = Utc::now();
        let live = jwt_with_exp(now.timestamp() + 3600);
        let expired = jwt_with_exp(now.timestamp() - 1);

        assert!(is_valid_token(&live, now));
        assert!(!is_valid_token(&expired, now));
    }

    #[test]
    fn undecodable_payload_is_invalid() {
        assert!(!is_valid_token("header.%%%not-base64%%%.sig", Utc::now()));
        let not_json = format!("header.{}.sig", URL_SAFE_NO_PAD.encode("plain text"));
        assert!(!is_valid_token(&not_json, Utc::now()));
    }

    #[test]
    fn expiry_buffer_window() {
        let now = Utc::now();
        let soon = jwt_with_exp(now.timestamp() + 120);
        let later = jwt_with_exp(now.timestamp() + 3600);

        assert!(expires_within(&soon, Duration::from_secs(300), now));
        assert!(!expires_within(&later, Duration::from_secs(300), now));
        assert!(!expires_within("mock_token_12345", Duration::from_secs(300), now));
    }
}
