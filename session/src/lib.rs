//! Session layer for Visitdesk.
//!
//! Owns the signed-in user: token persistence, proactive refresh, the chat
//! socket and the shared messaging state it feeds. Everything above this
//! crate observes the session through [`SessionEvent`]s.

#![allow(clippy::missing_errors_doc)]

mod auth;
mod error;
mod events;
mod messaging;
mod realtime;
mod token_store;

pub use auth::{LOGIN_PATH, Session, is_session_failure};
pub use error::SessionError;
pub use events::{NotificationLevel, SessionEvent, SessionState};
pub use messaging::{MessagingState, MessagingStore, SharedMessaging};
pub use realtime::{RealtimeSocket, SocketStatus, socket_url};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore, TokenStoreError};
