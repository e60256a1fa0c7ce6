//! HTTP access to the Visitdesk backend.
//!
//! [`ApiClient`] owns the connection pool, the session credentials and the
//! refresh policy. Per-resource controllers hang off it:
//!
//! ```ignore
//! let tours = client.tours().of_guide(profile_id).await?;
//! ```

mod backoff;
mod controllers;
mod error;
mod http;
pub mod jwt;

pub use backoff::{Backoff, BackoffConfig, calculate_delay};
pub use controllers::{
    Advisors, AuthApi, Fairs, Guides, Messaging, RegRequests, Reviews, TourReports, TourRequestBatches,
    TourRequests, Tours, UserDetails, Users, Visitors,
};
pub use error::ApiError;
pub use http::{ApiClient, CredentialEvent, read_capped_error_body};
