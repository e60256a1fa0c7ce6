//! Fair requests: visitors invite the university, staff decide.

use chrono::NaiveDate;
use visitdesk_client::ApiClient;
use visitdesk_session::Session;
use visitdesk_types::{Fair, FairId, FairRequest, FairStatus};

use crate::{StoreError, profile_id};

#[derive(Debug)]
pub struct FairStore {
    session: Session,
    fairs: Vec<Fair>,
}

impl FairStore {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            fairs: Vec::new(),
        }
    }

    #[must_use]
    pub fn fairs(&self) -> &[Fair] {
        &self.fairs
    }

    pub async fn fetch(&mut self) -> Result<(), StoreError> {
        self.fairs = self.session.client().fairs().list().await?;
        Ok(())
    }

    /// Invite the university to a fair on behalf of the signed-in visitor.
    pub async fn create_request(
        &self,
        date: NaiveDate,
        explanation: &str,
    ) -> Result<Fair, StoreError> {
        let request = FairRequest {
            status: FairStatus::Pending,
            date,
            visitor: profile_id(&self.session)?,
            explanation: explanation.to_string(),
        };
        Ok(self.session.client().fairs().send(&request).await?)
    }

    pub async fn approve(&mut self, id: FairId) -> Result<(), StoreError> {
        self.session.client().fairs().approve(id).await?;
        self.set_status(id, FairStatus::Approved);
        Ok(())
    }

    pub async fn reject(&mut self, id: FairId, reason: &str) -> Result<(), StoreError> {
        self.session.client().fairs().reject(id, reason).await?;
        self.set_status(id, FairStatus::Rejected);
        Ok(())
    }

    fn set_status(&mut self, id: FairId, status: FairStatus) {
        if let Some(fair) = self.fairs.iter_mut().find(|f| f.id == id) {
            fair.status = status;
        }
    }
}

/// Invitations created from this client, plus whatever the server lists.
#[derive(Debug)]
pub struct FairInvitationStore {
    client: ApiClient,
    invitations: Vec<Fair>,
}

impl FairInvitationStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            invitations: Vec::new(),
        }
    }

    #[must_use]
    pub fn invitations(&self) -> &[Fair] {
        &self.invitations
    }

    pub async fn create(&mut self, request: &FairRequest) -> Result<Fair, StoreError> {
        let fair = self.client.fairs().send(request).await?;
        self.invitations.push(fair.clone());
        Ok(fair)
    }

    pub async fn fetch(&mut self) -> Result<(), StoreError> {
        self.invitations = self.client.fairs().list().await?;
        Ok(())
    }
}
