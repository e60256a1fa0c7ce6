use visitdesk_types::{RegRequest, RegRequestId, RejectionAck};

use crate::{ApiClient, ApiError};

pub struct RegRequests<'a> {
    pub(crate) client: &'a ApiClient,
}

impl RegRequests<'_> {
    crud_routes!("api/reg_request/", RegRequestId, RegRequest);

    /// Approving creates the visitor account server-side.
    pub async fn approve(&self, id: RegRequestId) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .client
            .post_empty(&format!("api/reg_request/{id}/approve/"))
            .await?;
        Ok(())
    }

    pub async fn reject<B>(&self, id: RegRequestId, data: &B) -> Result<RejectionAck, ApiError>
    where
        B: serde::Serialize + ?Sized + Sync,
    {
        self.client
            .post(&format!("api/reg_request/{id}/reject/"), data)
            .await
    }
}
