use visitdesk_types::{AvailabilityCell, AvailabilityMove, Guide, ProfileId, Slot, Weekday};

use crate::{ApiClient, ApiError};

pub struct Guides<'a> {
    pub(crate) client: &'a ApiClient,
}

impl Guides<'_> {
    crud_routes!("api/guide/", ProfileId, Guide);

    /// Raw 28-flag weekly availability of one guide.
    pub async fn available_slots(&self, id: ProfileId) -> Result<Vec<u8>, ApiError> {
        self.client
            .get(&format!("api/guide/{id}/available_slots/"))
            .await
    }

    pub async fn add_availability(
        &self,
        id: ProfileId,
        day: Weekday,
        slot: Slot,
    ) -> Result<(), ApiError> {
        let cell = AvailabilityCell {
            day: day.index(),
            slot: slot.index(),
        };
        let _: serde_json::Value = self
            .client
            .post(&format!("api/guide/{id}/add-availability/"), &cell)
            .await?;
        Ok(())
    }

    pub async fn remove_availability(
        &self,
        id: ProfileId,
        day: Weekday,
        slot: Slot,
    ) -> Result<(), ApiError> {
        let cell = AvailabilityCell {
            day: day.index(),
            slot: slot.index(),
        };
        let _: serde_json::Value = self
            .client
            .post(&format!("api/guide/{id}/remove-availability/"), &cell)
            .await?;
        Ok(())
    }

    pub async fn update_availability(
        &self,
        id: ProfileId,
        change: &AvailabilityMove,
    ) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .client
            .post(&format!("api/guide/{id}/update-availability/"), change)
            .await?;
        Ok(())
    }

    pub async fn available_guides(&self, day: Weekday, slot: Slot) -> Result<Vec<Guide>, ApiError> {
        self.client
            .get_with_query(
                "api/guide/available_guides/",
                &[
                    ("day", day.index().to_string()),
                    ("slot", slot.index().to_string()),
                ],
            )
            .await
    }

    pub async fn by_ids(&self, ids: &[ProfileId]) -> Result<Vec<Guide>, ApiError> {
        let joined = ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        self.client
            .get_with_query("api/guide/guides-by-id-list/", &[("guide_ids", joined)])
            .await
    }
}
