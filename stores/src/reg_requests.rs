use visitdesk_session::Session;
use visitdesk_types::{RegRequest, RegRequestId, Rejection, RejectionAck, Role};

use crate::StoreError;

/// Pending sign-up requests. Only secretaries see any.
#[derive(Debug)]
pub struct RegRequestStore {
    session: Session,
    requests: Vec<RegRequest>,
    loaded: bool,
}

impl RegRequestStore {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            requests: Vec::new(),
            loaded: false,
        }
    }

    #[must_use]
    pub fn requests(&self) -> &[RegRequest] {
        &self.requests
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub async fn fetch(&mut self) -> Result<(), StoreError> {
        let role = self.session.role().ok_or(StoreError::NotSignedIn)?;
        if role != Role::Secretary {
            self.requests.clear();
            self.loaded = true;
            return Ok(());
        }

        match self.session.client().reg_requests().list().await {
            Ok(requests) => {
                self.requests = requests;
                self.loaded = true;
                Ok(())
            }
            Err(e) => {
                self.loaded = false;
                Err(e.into())
            }
        }
    }

    pub async fn approve(&mut self, id: RegRequestId) -> Result<(), StoreError> {
        self.session.client().reg_requests().approve(id).await?;
        tracing::info!(request = %id, "Registration approved");
        self.requests.retain(|r| r.id != id);
        Ok(())
    }

    pub async fn reject(
        &mut self,
        id: RegRequestId,
        reason: &str,
    ) -> Result<RejectionAck, StoreError> {
        let body = Rejection {
            reason: reason.to_string(),
        };
        let ack = self.session.client().reg_requests().reject(id, &body).await?;
        tracing::info!(request = %id, reason = ?ack.reason, "Registration rejected");
        self.requests.retain(|r| r.id != id);
        Ok(ack)
    }
}
