use thiserror::Error;
use visitdesk_client::ApiError;
use visitdesk_config::ConfigError;
use visitdesk_session::SessionError;
use visitdesk_stores::StoreError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] ApiError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
