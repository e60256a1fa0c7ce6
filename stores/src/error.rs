use thiserror::Error;
use visitdesk_client::ApiError;
use visitdesk_types::{BatchId, BatchStatus, SlotError, UserId};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("not signed in")]
    NotSignedIn,

    #[error("signed-in account has no guide, advisor or visitor profile")]
    NoProfile,

    #[error("tours can only be rejected at least 14 days ahead ({days_left} days left)")]
    RejectionWindowClosed { days_left: i64 },

    #[error("cannot cancel a {status} tour request")]
    NotCancellable { status: BatchStatus },

    #[error("tour request batch {0} is not loaded")]
    UnknownBatch(BatchId),

    #[error("account {0} is not loaded")]
    UnknownAccount(UserId),

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error(transparent)]
    Slot(#[from] SlotError),
}

impl StoreError {
    /// Text suitable for a notification: the server's own message when it
    /// sent one.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(err) => err.server_message().unwrap_or_else(|| err.to_string()),
            other => other.to_string(),
        }
    }
}
