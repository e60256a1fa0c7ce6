//! Core domain types for Visitdesk.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application: the HTTP
//! client deserializes into these records, the session and stores cache them.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod ids;
mod message;
mod records;
mod role;
mod session;
mod slot;

pub use ids::{
    BatchId, ChatId, FairId, MessageId, ProfileId, RegRequestId, ReportId, ReviewId, TourId,
    TourRequestId, UserId,
};
pub use message::{
    BroadcastEntry, Chat, ChatMessage, Contact, MessageHistory, MessageType, OutgoingFrame,
    Participant, SendMessage, SocketEnvelope,
};
pub use records::{
    Advisor, AuthorizedDays, AvailabilityCell, AvailabilityMove, BatchPatch, BatchStatus, Fair,
    FairRequest, FairStatus, Guide, GuideReportRequest, NewBatch, NewRegRequest, NewReview,
    NewTourReport, NewTourRequest, NewUser, ProfilePicture, RegRequest, Rejection, RejectionAck,
    Review, Tour, TourDraft, TourRejection, TourReport, TourRequest, TourRequestBatch, TourStatus,
    UserPatch, UserRecord, UserSummary, Visitor, VisitorUser,
};
pub use role::{Role, UnknownRole};
pub use session::{
    AccessToken, Credentials, PasswordChange, RefreshToken, RefreshedAccess, TokenPair,
    UserProfile,
};
pub use slot::{
    DAYS_PER_WEEK, GRID_LEN, SLOTS_PER_DAY, Slot, SlotError, Weekday, WeeklySlot,
    decode_availability, slot_to_string,
};
