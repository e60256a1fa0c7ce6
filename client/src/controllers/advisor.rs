use visitdesk_types::{Advisor, AuthorizedDays, GuideReportRequest, ProfileId};

use crate::{ApiClient, ApiError};

pub struct Advisors<'a> {
    pub(crate) client: &'a ApiClient,
}

impl Advisors<'_> {
    crud_routes!("api/advisor/", ProfileId, Advisor);

    pub async fn set_authorized_days(
        &self,
        id: ProfileId,
        days: &AuthorizedDays,
    ) -> Result<Advisor, ApiError> {
        self.partial_update(id, days).await
    }

    /// Ask the server to mail the guide working-hours report to `email`.
    pub async fn send_guide_report(&self, email: &str) -> Result<(), ApiError> {
        let body = GuideReportRequest {
            email: email.to_string(),
        };
        let _: serde_json::Value = self
            .client
            .post("api/advisor/send-guide-report/", &body)
            .await?;
        Ok(())
    }
}
