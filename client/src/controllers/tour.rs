use visitdesk_types::{NewReview, ProfileId, Review, Tour, TourId, TourRejection};

use crate::{ApiClient, ApiError};

pub struct Tours<'a> {
    pub(crate) client: &'a ApiClient,
}

impl Tours<'_> {
    crud_routes!("api/tour/", TourId, Tour);

    pub async fn of_guide(&self, guide: ProfileId) -> Result<Vec<Tour>, ApiError> {
        self.client
            .get(&format!("api/tour/guide-tours/{guide}/"))
            .await
    }

    pub async fn of_advisor(&self, advisor: ProfileId) -> Result<Vec<Tour>, ApiError> {
        self.client
            .get(&format!("api/tour/advisor-tours/{advisor}/"))
            .await
    }

    pub async fn of_visitor(&self, visitor: ProfileId) -> Result<Vec<Tour>, ApiError> {
        self.client
            .get(&format!("api/tour/visitor-tours/{visitor}/"))
            .await
    }

    /// A guide drops out of an assigned tour.
    pub async fn reject(&self, id: TourId, guide: ProfileId) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .client
            .post(
                &format!("api/tour/{id}/reject/"),
                &TourRejection { guide_id: guide },
            )
            .await?;
        Ok(())
    }

    pub async fn completed_of_advisor(&self, advisor: ProfileId) -> Result<Vec<Tour>, ApiError> {
        self.client
            .get(&format!("api/tour/{advisor}/completed-tours-of-advisor/"))
            .await
    }

    /// The tour's review. The server serializes a missing review as an
    /// object of empty fields, which comes back as `None`.
    pub async fn review(&self, id: TourId) -> Result<Option<Review>, ApiError> {
        let value: serde_json::Value = self
            .client
            .get(&format!("api/tour/{id}/get-review/"))
            .await?;
        Ok(serde_json::from_value(value).ok())
    }

    pub async fn post_review(&self, review: &NewReview) -> Result<Review, ApiError> {
        self.client
            .post(&format!("api/tour/{}/post-review/", review.tour_id), review)
            .await
    }
}
