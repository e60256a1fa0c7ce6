//! Visitor reviews and guide-written tour reports.

use visitdesk_session::Session;
use visitdesk_types::{NewTourReport, Review, TourId, TourReport};

use crate::{StoreError, profile_id};

/// Reviews left for the signed-in guide.
#[derive(Debug)]
pub struct ReviewStore {
    session: Session,
    reviews: Vec<Review>,
}

impl ReviewStore {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            reviews: Vec::new(),
        }
    }

    #[must_use]
    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    /// Mean rating, or `None` with no reviews.
    #[must_use]
    pub fn average_rating(&self) -> Option<f64> {
        if self.reviews.is_empty() {
            return None;
        }
        let total: f64 = self.reviews.iter().map(|r| r.rating).sum();
        Some(total / self.reviews.len() as f64)
    }

    pub async fn fetch(&mut self) -> Result<(), StoreError> {
        let guide = profile_id(&self.session)?;
        self.reviews = self.session.client().reviews().of_guide(guide).await?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct TourReportStore {
    session: Session,
}

impl TourReportStore {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// File a report for `tour` as the signed-in guide.
    pub async fn create(
        &self,
        report: &str,
        finished_at_hour: u8,
        finished_at_minute: u8,
        tour: TourId,
    ) -> Result<TourReport, StoreError> {
        let body = NewTourReport {
            report: report.to_string(),
            finished_at_hour,
            finished_at_minute,
            tour,
            guide: profile_id(&self.session)?,
        };
        Ok(self.session.client().tour_reports().post(&body).await?)
    }

    pub async fn by_tour(&self, tour: TourId) -> Result<Vec<TourReport>, StoreError> {
        Ok(self.session.client().tour_reports().by_tour(tour).await?)
    }
}

#[cfg(test)]
mod tests {
    use visitdesk_types::Role;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::testing::signed_in;

    #[tokio::test]
    async fn reviews_of_current_guide_and_average() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/reviews/guide/11/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 1, "review": "Great", "reviewRating": 5.0},
                {"id": 2, "review": "Fine", "reviewRating": 3.0}
            ])))
            .mount(&server)
            .await;

        let mut store = ReviewStore::new(signed_in(&server, Role::Guide, Some(11)).await);
        assert_eq!(store.average_rating(), None);
        store.fetch().await.unwrap();
        assert_eq!(store.reviews().len(), 2);
        assert_eq!(store.average_rating(), Some(4.0));
    }

    #[tokio::test]
    async fn report_carries_guide_profile_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/tour_report/"))
            .and(body_json(serde_json::json!({
                "report": "Went well", "finishedAtHour": 11, "finishedAtMinute": 40,
                "tour": 5, "guide": 11
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": 1, "report": "Went well", "finishedAtHour": 11, "finishedAtMinute": 40,
                "tour": 5, "guide": 11
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = TourReportStore::new(signed_in(&server, Role::Guide, Some(11)).await);
        let report = store
            .create("Went well", 11, 40, TourId::new(5))
            .await
            .unwrap();
        assert_eq!(report.finished_at_minute, 40);
    }
}
