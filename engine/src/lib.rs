//! Application state for Visitdesk.
//!
//! [`App`] wires configuration, the HTTP client, the session and every store
//! together, and answers navigation requests through the route guard.

mod app;
mod error;
mod router;

pub use app::{App, Stores};
pub use error::EngineError;
pub use router::{
    CALENDAR_PATH, FORBIDDEN_PATH, HOME_PATH, LOGIN_PATH, Navigation, REGISTER_PATH, Route, guard,
};

pub use visitdesk_client::{self as client, ApiClient, ApiError};
pub use visitdesk_config::{self as config, Settings, VisitdeskConfig};
pub use visitdesk_session::{
    self as session, NotificationLevel, Session, SessionError, SessionEvent, SessionState,
    SocketStatus,
};
pub use visitdesk_stores::{self as stores, StoreError};
pub use visitdesk_types as types;
