//! Server records for tours, batches, fairs, registrations, reviews and
//! accounts, plus the request bodies the client sends for them.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    BatchId, FairId, ProfileId, RegRequestId, ReportId, ReviewId, Role, Slot, SlotError, TourId,
    TourRequestId, UserId,
};

// ============================================================================
// Accounts
// ============================================================================

/// Entry of `GET api/users/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub profile_picture: Option<String>,
    /// Only present on the `create-user` response for advisors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advisor_id: Option<ProfileId>,
}

/// Body of `POST api/users/create-user/`.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Body of `PATCH api/users/{id}/`. The role is not editable.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Response of `PATCH api/user/update-profile-picture/`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfilePicture {
    pub profile_picture: String,
}

/// A visitor row's `user` field: a bare id on tour payloads, the nested user
/// on batch, fair and review payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VisitorUser {
    Id(UserId),
    Nested(UserSummary),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visitor {
    pub id: ProfileId,
    #[serde(default)]
    pub user: Option<VisitorUser>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, rename = "highSchoolName")]
    pub high_school_name: Option<String>,
    #[serde(default, rename = "contactNumber")]
    pub contact_number: Option<String>,
}

impl Visitor {
    /// Display name: the nested user's name, else the high school, else the id.
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.user {
            Some(VisitorUser::Nested(user)) if !user.name.is_empty() => user.name.clone(),
            _ => self
                .high_school_name
                .clone()
                .unwrap_or_else(|| format!("visitor #{}", self.id)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guide {
    pub id: ProfileId,
    #[serde(default)]
    pub user: Option<UserSummary>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub availability: Vec<u8>,
    #[serde(default, rename = "reviewCount")]
    pub review_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisor {
    pub id: ProfileId,
    #[serde(default)]
    pub user: Option<UserId>,
    #[serde(default, rename = "authorizedDay")]
    pub authorized_day: Vec<u8>,
    #[serde(default, rename = "isCoordinator")]
    pub is_coordinator: bool,
}

/// Body of `PATCH api/advisor/{id}/` for authorized days.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizedDays {
    #[serde(rename = "authorizedDay")]
    pub authorized_day: Vec<u8>,
}

/// Body of `POST api/guide/{id}/add-availability/` and `remove-availability/`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AvailabilityCell {
    pub day: u8,
    pub slot: u8,
}

/// Body of `POST api/guide/{id}/update-availability/`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AvailabilityMove {
    pub source_day: u8,
    pub source_slot: u8,
    pub target_day: u8,
    pub target_slot: u8,
}

// ============================================================================
// Tours
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TourStatus {
    #[default]
    Unassigned,
    Assigned,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tour {
    pub id: TourId,
    pub date: NaiveDate,
    /// Server slot label, e.g. `"11.00 AM"`.
    pub slot: String,
    #[serde(default)]
    pub time_slot_id: Option<String>,
    #[serde(default)]
    pub visitor: Option<Visitor>,
    #[serde(default)]
    pub guides: Vec<ProfileId>,
    #[serde(default)]
    pub review: Option<ReviewId>,
    #[serde(default)]
    pub status: TourStatus,
}

impl Tour {
    pub fn slot(&self) -> Result<Slot, SlotError> {
        Slot::from_label(&self.slot)
    }

    /// Editable fields, as sent back on `PUT api/tour/{id}/`.
    #[must_use]
    pub fn to_draft(&self) -> TourDraft {
        TourDraft {
            date: self.date,
            slot: self.slot.clone(),
            visitor_id: self.visitor.as_ref().map(|v| v.id),
            guides: self.guides.clone(),
            status: Some(self.status),
        }
    }
}

/// Body of `POST api/tour/` and `PUT api/tour/{id}/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TourDraft {
    pub date: NaiveDate,
    pub slot: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visitor_id: Option<ProfileId>,
    pub guides: Vec<ProfileId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TourStatus>,
}

/// Body of `POST api/tour/{id}/reject/`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TourRejection {
    pub guide_id: ProfileId,
}

// ============================================================================
// Tour requests
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Scheduled,
    Cancelled,
}

impl BatchStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Scheduled => "scheduled",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TourRequest {
    pub id: TourRequestId,
    pub date: NaiveDate,
    /// Server slot label, e.g. `"09.00 AM"`.
    pub time_slot: String,
    #[serde(default)]
    pub batch: Option<BatchId>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Body of `POST api/tour_request/`.
#[derive(Debug, Clone, Serialize)]
pub struct NewTourRequest {
    pub batch: BatchId,
    pub date: NaiveDate,
    pub time_slot: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TourRequestBatch {
    pub id: BatchId,
    #[serde(default)]
    pub visitor: Option<Visitor>,
    #[serde(default)]
    pub status: BatchStatus,
    #[serde(default)]
    pub tour_requests: Vec<TourRequest>,
    #[serde(default = "one")]
    pub number_of_visitors: u32,
    #[serde(default)]
    pub additional_notes: Option<String>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub tour: Option<Tour>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

const fn one() -> u32 {
    1
}

/// Body of `POST api/tour_request_batch/create-with-requests/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewBatch {
    pub visitor_id: ProfileId,
    pub dates: Vec<NaiveDate>,
    /// Server slot labels, parallel to `dates`.
    pub time_slots: Vec<String>,
    pub additional_notes: String,
    pub number_of_visitors: u32,
}

/// Body of `PATCH api/tour_request_batch/{id}/`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BatchStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

impl BatchPatch {
    #[must_use]
    pub fn status(status: BatchStatus) -> Self {
        Self {
            status: Some(status),
            rejection_reason: None,
        }
    }
}

// ============================================================================
// Fairs
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FairStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fair {
    pub id: FairId,
    pub date: NaiveDate,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub status: FairStatus,
    #[serde(default)]
    pub visitor: Option<Visitor>,
}

/// Body of `POST api/fair/`.
#[derive(Debug, Clone, Serialize)]
pub struct FairRequest {
    pub status: FairStatus,
    pub date: NaiveDate,
    pub visitor: ProfileId,
    pub explanation: String,
}

/// Body of the reject endpoints that carry a free-text reason.
#[derive(Debug, Clone, Serialize)]
pub struct Rejection {
    pub reason: String,
}

// ============================================================================
// Registration requests
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegRequest {
    pub id: RegRequestId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone_no: String,
    #[serde(default)]
    pub user_type: String,
    #[serde(default)]
    pub high_school_name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<BatchStatus>,
}

/// Body of `POST api/reg_request/`.
#[derive(Debug, Clone, Serialize)]
pub struct NewRegRequest {
    pub name: String,
    pub email: String,
    pub phone_no: String,
    pub user_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_school_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

/// Response of `POST api/reg_request/{id}/reject/`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RejectionAck {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

// ============================================================================
// Reviews and reports
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub review: String,
    #[serde(rename = "reviewRating")]
    pub rating: f64,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reviewer: Option<Visitor>,
}

/// Body of `POST api/tour/{id}/post-review/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewReview {
    pub review: String,
    #[serde(rename = "reviewRating")]
    pub rating: f64,
    pub tour_id: TourId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TourReport {
    pub id: ReportId,
    pub tour: TourId,
    pub report: String,
    #[serde(rename = "finishedAtHour")]
    pub finished_at_hour: u8,
    #[serde(rename = "finishedAtMinute")]
    pub finished_at_minute: u8,
    pub guide: ProfileId,
}

/// Body of `POST api/tour_report/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTourReport {
    pub report: String,
    #[serde(rename = "finishedAtHour")]
    pub finished_at_hour: u8,
    #[serde(rename = "finishedAtMinute")]
    pub finished_at_minute: u8,
    pub tour: TourId,
    pub guide: ProfileId,
}

/// Body of `POST api/advisor/send-guide-report/`.
#[derive(Debug, Clone, Serialize)]
pub struct GuideReportRequest {
    pub email: String,
}
