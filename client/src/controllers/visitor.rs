use visitdesk_types::{ProfileId, TourRequestBatch, Visitor};

use crate::{ApiClient, ApiError};

pub struct Visitors<'a> {
    pub(crate) client: &'a ApiClient,
}

impl Visitors<'_> {
    crud_routes!("api/visitor/", ProfileId, Visitor);

    pub async fn tour_request_batches(
        &self,
        id: ProfileId,
    ) -> Result<Vec<TourRequestBatch>, ApiError> {
        self.client
            .get(&format!("api/visitor/{id}/tour-request-batches/"))
            .await
    }
}
