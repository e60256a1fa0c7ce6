use visitdesk_session::Session;
use visitdesk_types::{Advisor, ProfileId};

use crate::StoreError;

#[derive(Debug)]
pub struct AdvisorStore {
    session: Session,
    advisor: Option<Advisor>,
}

impl AdvisorStore {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            advisor: None,
        }
    }

    #[must_use]
    pub fn advisor(&self) -> Option<&Advisor> {
        self.advisor.as_ref()
    }

    pub async fn fetch(&mut self, id: ProfileId) -> Result<(), StoreError> {
        self.advisor = Some(self.session.client().advisors().get(id).await?);
        Ok(())
    }

    /// Have the guide working-hours report mailed to the signed-in user.
    pub async fn send_working_hours(&self) -> Result<(), StoreError> {
        let email = self
            .session
            .profile()
            .map(|p| p.email)
            .ok_or(StoreError::NotSignedIn)?;
        self.session
            .client()
            .advisors()
            .send_guide_report(&email)
            .await?;
        tracing::info!(%email, "Requested guide working-hours report");
        Ok(())
    }
}
