use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single API call.
///
/// Transport problems, authentication failures and server-side rejections are
/// kept apart so callers can decide between retrying, logging out and showing
/// the server's message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("invalid request path {path:?}: {source}")]
    InvalidPath {
        path: String,
        source: url::ParseError,
    },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        source: reqwest::Error,
    },

    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        source: serde_json::Error,
    },

    #[error("not signed in")]
    NoSession,

    /// Refresh failed or the retried request was rejected again.
    #[error("session expired")]
    SessionExpired,
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(StatusCode::UNAUTHORIZED))
    }

    /// Whether the caller no longer holds a usable session.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::NoSession | Self::SessionExpired) || self.is_unauthorized()
    }

    /// Server-provided `detail`/`error` text when the body is JSON, else the raw body.
    #[must_use]
    pub fn server_message(&self) -> Option<String> {
        let Self::Status { body, .. } = self else {
            return None;
        };
        let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
        let field = parsed.as_ref().and_then(|value| {
            ["detail", "error", "message"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        });
        Some(field.map_or_else(|| body.clone(), str::to_string))
    }
}
