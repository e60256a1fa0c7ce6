use visitdesk_client::ApiClient;
use visitdesk_types::{Guide, ProfileId, Slot, Weekday};

use crate::StoreError;

#[derive(Debug)]
pub struct GuideStore {
    client: ApiClient,
    guides: Vec<Guide>,
}

impl GuideStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            guides: Vec::new(),
        }
    }

    #[must_use]
    pub fn guides(&self) -> &[Guide] {
        &self.guides
    }

    pub async fn fetch(&mut self) -> Result<(), StoreError> {
        self.guides = self.client.guides().list().await?;
        Ok(())
    }

    pub async fn by_ids(&self, ids: &[ProfileId]) -> Result<Vec<Guide>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.client.guides().by_ids(ids).await?)
    }

    pub async fn get(&self, id: ProfileId) -> Result<Guide, StoreError> {
        Ok(self.client.guides().get(id).await?)
    }

    /// Guides free in one weekly cell.
    pub async fn available_at(&self, day: Weekday, slot: Slot) -> Result<Vec<Guide>, StoreError> {
        Ok(self.client.guides().available_guides(day, slot).await?)
    }
}
