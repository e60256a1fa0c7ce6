use visitdesk_client::ApiClient;
use visitdesk_types::{ProfileId, Visitor};

use crate::StoreError;

#[derive(Debug)]
pub struct VisitorStore {
    client: ApiClient,
}

impl VisitorStore {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn get(&self, id: ProfileId) -> Result<Visitor, StoreError> {
        Ok(self.client.visitors().get(id).await?)
    }
}
