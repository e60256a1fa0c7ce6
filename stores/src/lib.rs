//! View-model stores for Visitdesk.
//!
//! Each store keeps an in-memory copy of what it last fetched and patches it
//! locally after a successful mutation. There is no reconciliation with the
//! server beyond the next fetch, and overlapping fetches are not sequenced:
//! the last one to finish wins.

#![allow(clippy::missing_errors_doc)]

mod accounts;
mod advisor;
mod availability;
mod calendar;
mod error;
mod fairs;
mod guides;
mod profile;
mod reg_requests;
mod reviews;
mod tour_requests;
mod tours;
mod visitor;

#[cfg(test)]
mod testing;

pub use accounts::{Account, AccountStore, AccountUpdate, NewAccount};
pub use advisor::AdvisorStore;
pub use availability::{AvailabilityStore, Toggle};
pub use calendar::{CalendarStore, UnknownViewMode, ViewMode};
pub use error::StoreError;
pub use fairs::{FairInvitationStore, FairStore};
pub use guides::GuideStore;
pub use profile::ProfileStore;
pub use reg_requests::RegRequestStore;
pub use reviews::{ReviewStore, TourReportStore};
pub use tour_requests::{
    BatchSummary, SlotChoice, TourRequestForm, TourRequestStore, VisitorBatch,
};
pub use tours::{REJECTION_NOTICE_DAYS, TourStore};
pub use visitor::VisitorStore;

use visitdesk_session::Session;
use visitdesk_types::ProfileId;

/// Guide, advisor or visitor row id of the signed-in user.
fn profile_id(session: &Session) -> Result<ProfileId, StoreError> {
    let profile = session.profile().ok_or(StoreError::NotSignedIn)?;
    profile.profile_id.ok_or(StoreError::NoProfile)
}
