use visitdesk_types::{BatchId, NewBatch, TourDraft, TourId, TourRequestBatch};

use crate::{ApiClient, ApiError};

pub struct TourRequestBatches<'a> {
    pub(crate) client: &'a ApiClient,
}

impl TourRequestBatches<'_> {
    crud_routes!("api/tour_request_batch/", BatchId, TourRequestBatch);

    /// Create the batch and its per-date tour requests in one call.
    pub async fn create_with_requests(&self, batch: &NewBatch) -> Result<TourRequestBatch, ApiError> {
        self.client
            .post("api/tour_request_batch/create-with-requests/", batch)
            .await
    }

    pub async fn schedule(&self, id: BatchId, tour: &TourDraft) -> Result<TourRequestBatch, ApiError> {
        self.client
            .post(&format!("api/tour_request_batch/{id}/schedule/"), tour)
            .await
    }

    pub async fn by_tour(&self, tour: TourId) -> Result<TourRequestBatch, ApiError> {
        self.client
            .get(&format!("api/tour_request_batch/by-tour/{tour}/"))
            .await
    }

    pub async fn approved(&self) -> Result<Vec<TourRequestBatch>, ApiError> {
        self.client.get("api/tour_request_batch/approved/").await
    }

    pub async fn pending(&self) -> Result<Vec<TourRequestBatch>, ApiError> {
        self.client.get("api/tour_request_batch/pending/").await
    }
}
