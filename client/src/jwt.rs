//! Reading the expiry out of an access token.
//!
//! Only the payload segment is decoded. The signature is never checked here;
//! the server does that on every request.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use visitdesk_types::AccessToken;

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("token is not a three-part JWT")]
    Malformed,
    #[error("token payload is not base64url: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("token payload is not JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("token exp {0} is out of range")]
    ExpOutOfRange(i64),
}

#[derive(Deserialize)]
struct Claims {
    exp: i64,
}

pub fn expires_at(token: &AccessToken) -> Result<DateTime<Utc>, JwtError> {
    let mut parts = token.as_str().split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(JwtError::Malformed);
    };

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
    let claims: Claims = serde_json::from_slice(&bytes)?;
    DateTime::from_timestamp(claims.exp, 0).ok_or(JwtError::ExpOutOfRange(claims.exp))
}

/// Time to wait before refreshing a token expiring at `exp`, `lead` ahead of
/// expiry. Zero when that moment has already passed.
#[must_use]
pub fn refresh_delay(exp: DateTime<Utc>, lead: Duration, now: DateTime<Utc>) -> Duration {
    let lead = chrono::Duration::from_std(lead).unwrap_or(chrono::Duration::zero());
    (exp - lead - now).to_std().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
pub(crate) fn token_expiring_at(exp: i64) -> AccessToken {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"token_type":"access","exp":{exp},"user_id":3}}"#));
    AccessToken::new(format!("{header}.{payload}.c2lnbmF0dXJl"))
}
