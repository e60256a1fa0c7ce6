use visitdesk_types::{Fair, FairId, FairRequest, Rejection};

use crate::{ApiClient, ApiError};

pub struct Fairs<'a> {
    pub(crate) client: &'a ApiClient,
}

impl Fairs<'_> {
    pub async fn list(&self) -> Result<Vec<Fair>, ApiError> {
        self.client.get("api/fair/").await
    }

    pub async fn send(&self, request: &FairRequest) -> Result<Fair, ApiError> {
        self.client.post("api/fair/", request).await
    }

    pub async fn approve(&self, id: FairId) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .client
            .put(&format!("api/fair/{id}/approve/"), &serde_json::json!({}))
            .await?;
        Ok(())
    }

    pub async fn reject(&self, id: FairId, reason: &str) -> Result<(), ApiError> {
        let body = Rejection {
            reason: reason.to_string(),
        };
        let _: serde_json::Value = self
            .client
            .put(&format!("api/fair/{id}/reject/"), &body)
            .await?;
        Ok(())
    }
}
