use thiserror::Error;
use visitdesk_client::ApiError;

use crate::token_store::TokenStoreError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    TokenStore(#[from] TokenStoreError),

    #[error("not signed in")]
    NotAuthenticated,

    #[error("chat socket is not connected")]
    SocketClosed,

    #[error("failed to encode socket frame: {0}")]
    Frame(#[source] serde_json::Error),
}
