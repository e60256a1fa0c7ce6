//! A guide's weekly availability grid.

use visitdesk_session::Session;
use visitdesk_types::{AvailabilityMove, Slot, Weekday, WeeklySlot, decode_availability};

use crate::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
    /// The account has no guide profile; nothing was sent.
    Skipped,
}

#[derive(Debug)]
pub struct AvailabilityStore {
    session: Session,
    selected: Vec<WeeklySlot>,
}

impl AvailabilityStore {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            selected: Vec::new(),
        }
    }

    /// Selected cells, grid order after a fetch, then in toggle order.
    #[must_use]
    pub fn selected(&self) -> &[WeeklySlot] {
        &self.selected
    }

    #[must_use]
    pub fn is_available(&self, day: Weekday, slot: Slot) -> bool {
        self.selected.contains(&WeeklySlot::new(day, slot))
    }

    pub async fn fetch(&mut self) -> Result<(), StoreError> {
        let Some(guide) = self.session.profile().and_then(|p| p.profile_id) else {
            return Ok(());
        };
        let flags = self.session.client().guides().available_slots(guide).await?;
        self.selected = decode_availability(&flags)?;
        tracing::debug!(%guide, selected = self.selected.len(), "Loaded availability");
        Ok(())
    }

    pub async fn toggle(&mut self, day: Weekday, slot: Slot) -> Result<Toggle, StoreError> {
        let Some(guide) = self.session.profile().and_then(|p| p.profile_id) else {
            return Ok(Toggle::Skipped);
        };
        let cell = WeeklySlot::new(day, slot);
        let guides = self.session.client().guides();

        if let Some(pos) = self.selected.iter().position(|c| *c == cell) {
            guides.remove_availability(guide, day, slot).await?;
            self.selected.remove(pos);
            tracing::debug!(index = cell.flat_index(), %cell, "Availability removed");
            Ok(Toggle::Removed)
        } else {
            guides.add_availability(guide, day, slot).await?;
            self.selected.push(cell);
            tracing::debug!(index = cell.flat_index(), %cell, "Availability added");
            Ok(Toggle::Added)
        }
    }

    /// Move one selected cell to another in a single server call.
    pub async fn move_slot(
        &mut self,
        source: WeeklySlot,
        target: WeeklySlot,
    ) -> Result<(), StoreError> {
        let Some(guide) = self.session.profile().and_then(|p| p.profile_id) else {
            return Ok(());
        };
        let request = AvailabilityMove {
            source_day: source.day.index(),
            source_slot: source.slot.index(),
            target_day: target.day.index(),
            target_slot: target.slot.index(),
        };
        self.session
            .client()
            .guides()
            .update_availability(guide, &request)
            .await?;

        self.selected.retain(|c| *c != source);
        self.selected.push(target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use visitdesk_types::{GRID_LEN, Role};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::testing::signed_in;

    fn cell(day: Weekday, slot: u8) -> WeeklySlot {
        WeeklySlot::new(day, Slot::new(slot).unwrap())
    }

    #[tokio::test]
    async fn fetch_decodes_flag_grid() {
        let server = MockServer::start().await;
        let mut flags = vec![0u8; GRID_LEN];
        flags[0] = 1;
        flags[6] = 1;
        Mock::given(method("GET"))
            .and(path("/api/guide/11/available_slots/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&flags))
            .mount(&server)
            .await;

        let mut store = AvailabilityStore::new(signed_in(&server, Role::Guide, Some(11)).await);
        store.fetch().await.unwrap();

        assert_eq!(
            store.selected(),
            [cell(Weekday::Monday, 0), cell(Weekday::Tuesday, 2)]
        );
        assert!(store.is_available(Weekday::Tuesday, Slot::new(2).unwrap()));
        assert!(!store.is_available(Weekday::Tuesday, Slot::new(3).unwrap()));
    }

    #[tokio::test]
    async fn toggle_tuesday_slot_two_adds_then_removes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/guide/11/add-availability/"))
            .and(body_json(serde_json::json!({"day": 1, "slot": 2})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/guide/11/remove-availability/"))
            .and(body_json(serde_json::json!({"day": 1, "slot": 2})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let mut store = AvailabilityStore::new(signed_in(&server, Role::Guide, Some(11)).await);
        let slot = Slot::new(2).unwrap();

        assert_eq!(store.toggle(Weekday::Tuesday, slot).await.unwrap(), Toggle::Added);
        assert_eq!(store.selected()[0].flat_index(), 6);
        assert_eq!(store.toggle(Weekday::Tuesday, slot).await.unwrap(), Toggle::Removed);
        assert!(store.selected().is_empty());
    }

    #[tokio::test]
    async fn toggle_without_profile_sends_nothing() {
        let server = MockServer::start().await;
        let mut store = AvailabilityStore::new(signed_in(&server, Role::Director, None).await);

        let outcome = store
            .toggle(Weekday::Monday, Slot::new(0).unwrap())
            .await
            .unwrap();
        assert_eq!(outcome, Toggle::Skipped);
        assert!(store.selected().is_empty());
    }

    #[tokio::test]
    async fn move_slot_replaces_source_with_target() {
        let server = MockServer::start().await;
        let mut flags = vec![0u8; GRID_LEN];
        flags[1] = 1;
        Mock::given(method("GET"))
            .and(path("/api/guide/11/available_slots/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&flags))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/guide/11/update-availability/"))
            .and(body_json(serde_json::json!({
                "source_day": 0, "source_slot": 1, "target_day": 4, "target_slot": 3
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let mut store = AvailabilityStore::new(signed_in(&server, Role::Guide, Some(11)).await);
        store.fetch().await.unwrap();
        store
            .move_slot(cell(Weekday::Monday, 1), cell(Weekday::Friday, 3))
            .await
            .unwrap();

        assert_eq!(store.selected(), [cell(Weekday::Friday, 3)]);
    }
}
