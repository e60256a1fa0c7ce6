//! Tour request batches, reshaped for list views.

use chrono::NaiveDate;
use visitdesk_session::Session;
use visitdesk_types::{
    BatchId, BatchPatch, BatchStatus, NewBatch, Slot, TourDraft, TourId, TourRequest,
    TourRequestBatch, Visitor,
};

use crate::{StoreError, profile_id};

/// A batch as staff review it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub id: BatchId,
    pub visitor: Option<Visitor>,
    /// `"first - last"` over the requested dates, empty for a batch without
    /// requests.
    pub date_range: String,
    pub tour_requests: Vec<TourRequest>,
    pub visitor_count: u32,
    pub additional_notes: Option<String>,
    pub status: BatchStatus,
}

impl From<TourRequestBatch> for BatchSummary {
    fn from(batch: TourRequestBatch) -> Self {
        let date_range = match (batch.tour_requests.first(), batch.tour_requests.last()) {
            (Some(first), Some(last)) => format!("{} - {}", first.date, last.date),
            _ => String::new(),
        };
        Self {
            id: batch.id,
            visitor: batch.visitor,
            date_range,
            tour_requests: batch.tour_requests,
            visitor_count: batch.number_of_visitors,
            additional_notes: batch.additional_notes,
            status: batch.status,
        }
    }
}

/// A batch as its visitor sees it, with the scheduled tour flattened in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitorBatch {
    pub id: BatchId,
    pub status: BatchStatus,
    pub number_of_visitors: u32,
    pub rejection_reason: Option<String>,
    pub additional_notes: Option<String>,
    pub scheduled_date: Option<NaiveDate>,
    /// Server slot label of the scheduled tour.
    pub scheduled_time_slot: Option<String>,
    pub scheduled_tour_id: Option<TourId>,
    pub tour_requests: Vec<TourRequest>,
}

impl From<TourRequestBatch> for VisitorBatch {
    fn from(batch: TourRequestBatch) -> Self {
        let scheduled_time_slot = batch.tour.as_ref().map(|tour| {
            tour.time_slot_id
                .as_deref()
                .and_then(|id| id.parse::<u8>().ok())
                .and_then(|index| Slot::new(index).ok())
                .map_or_else(|| tour.slot.clone(), |slot| slot.label().to_string())
        });
        Self {
            id: batch.id,
            status: batch.status,
            number_of_visitors: batch.number_of_visitors,
            rejection_reason: batch.rejection_reason,
            additional_notes: batch.additional_notes,
            scheduled_date: batch.tour.as_ref().map(|t| t.date),
            scheduled_time_slot,
            scheduled_tour_id: batch.tour.as_ref().map(|t| t.id),
            tour_requests: batch.tour_requests,
        }
    }
}

/// One date/slot pair picked on the request form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotChoice {
    pub date: NaiveDate,
    pub slot: Slot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TourRequestForm {
    pub selected: Vec<SlotChoice>,
    pub notes: String,
    pub number_of_visitors: u32,
}

#[derive(Debug)]
pub struct TourRequestStore {
    session: Session,
    summaries: Vec<BatchSummary>,
    visitor_batches: Vec<VisitorBatch>,
}

impl TourRequestStore {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            summaries: Vec::new(),
            visitor_batches: Vec::new(),
        }
    }

    #[must_use]
    pub fn summaries(&self) -> &[BatchSummary] {
        &self.summaries
    }

    #[must_use]
    pub fn visitor_batches(&self) -> &[VisitorBatch] {
        &self.visitor_batches
    }

    pub async fn fetch_all(&mut self) -> Result<(), StoreError> {
        let batches = self.session.client().tour_request_batches().list().await?;
        self.set_summaries(batches);
        Ok(())
    }

    pub async fn fetch_pending(&mut self) -> Result<(), StoreError> {
        let batches = self
            .session
            .client()
            .tour_request_batches()
            .pending()
            .await?;
        self.set_summaries(batches);
        Ok(())
    }

    pub async fn fetch_approved(&mut self) -> Result<(), StoreError> {
        let batches = self
            .session
            .client()
            .tour_request_batches()
            .approved()
            .await?;
        self.set_summaries(batches);
        Ok(())
    }

    fn set_summaries(&mut self, batches: Vec<TourRequestBatch>) {
        self.summaries = batches.into_iter().map(BatchSummary::from).collect();
    }

    /// The signed-in visitor's own batches.
    pub async fn fetch_of_visitor(&mut self) -> Result<(), StoreError> {
        let visitor = profile_id(&self.session)?;
        let batches = self
            .session
            .client()
            .visitors()
            .tour_request_batches(visitor)
            .await?;
        self.visitor_batches = batches.into_iter().map(VisitorBatch::from).collect();
        Ok(())
    }

    pub async fn create(&self, form: &TourRequestForm) -> Result<TourRequestBatch, StoreError> {
        let body = NewBatch {
            visitor_id: profile_id(&self.session)?,
            dates: form.selected.iter().map(|c| c.date).collect(),
            time_slots: form
                .selected
                .iter()
                .map(|c| c.slot.label().to_string())
                .collect(),
            additional_notes: form.notes.clone(),
            number_of_visitors: form.number_of_visitors,
        };
        let batch = self
            .session
            .client()
            .tour_request_batches()
            .create_with_requests(&body)
            .await?;
        tracing::info!(batch = %batch.id, requests = body.dates.len(), "Tour requests submitted");
        Ok(batch)
    }

    pub async fn approve(&mut self, id: BatchId) -> Result<(), StoreError> {
        self.session
            .client()
            .tour_request_batches()
            .partial_update(id, &BatchPatch::status(BatchStatus::Approved))
            .await?;
        if let Some(summary) = self.summaries.iter_mut().find(|s| s.id == id) {
            summary.status = BatchStatus::Approved;
        }
        Ok(())
    }

    /// Reject a batch with a reason. The batch leaves the local list before
    /// the server is asked.
    pub async fn remove(&mut self, id: BatchId, reason: &str) -> Result<(), StoreError> {
        self.summaries.retain(|s| s.id != id);
        let patch = BatchPatch {
            status: Some(BatchStatus::Rejected),
            rejection_reason: Some(reason.to_string()),
        };
        self.session
            .client()
            .tour_request_batches()
            .partial_update(id, &patch)
            .await?;
        Ok(())
    }

    /// Withdraw one of the visitor's own batches. A scheduled batch loses its
    /// tour first; one without a linked tour is refused, as are rejected and
    /// cancelled batches.
    pub async fn cancel(&mut self, id: BatchId) -> Result<(), StoreError> {
        let batch = self
            .visitor_batches
            .iter()
            .find(|b| b.id == id)
            .ok_or(StoreError::UnknownBatch(id))?;
        let (status, scheduled_tour) = (batch.status, batch.scheduled_tour_id);

        let client = self.session.client();
        match (status, scheduled_tour) {
            (BatchStatus::Scheduled, Some(tour)) => {
                client.tours().delete(tour).await?;
                tracing::debug!(%tour, "Deleted scheduled tour");
            }
            (BatchStatus::Pending | BatchStatus::Approved, _) => {}
            (BatchStatus::Scheduled | BatchStatus::Rejected | BatchStatus::Cancelled, _) => {
                return Err(StoreError::NotCancellable { status });
            }
        }
        client
            .tour_request_batches()
            .partial_update(id, &BatchPatch::status(BatchStatus::Cancelled))
            .await?;
        tracing::info!(batch = %id, "Tour request cancelled");

        self.fetch_of_visitor().await
    }

    pub async fn schedule(
        &self,
        id: BatchId,
        tour: &TourDraft,
    ) -> Result<TourRequestBatch, StoreError> {
        Ok(self
            .session
            .client()
            .tour_request_batches()
            .schedule(id, tour)
            .await?)
    }

    /// The batch a tour was scheduled from.
    pub async fn of_tour(&self, tour: TourId) -> Result<BatchSummary, StoreError> {
        let batch = self
            .session
            .client()
            .tour_request_batches()
            .by_tour(tour)
            .await?;
        Ok(batch.into())
    }
}
