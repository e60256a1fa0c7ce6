use visitdesk_types::{NewReview, ProfileId, Review};

use crate::{ApiClient, ApiError};

pub struct Reviews<'a> {
    pub(crate) client: &'a ApiClient,
}

impl Reviews<'_> {
    pub async fn of_guide(&self, guide: ProfileId) -> Result<Vec<Review>, ApiError> {
        self.client
            .get(&format!("api/reviews/guide/{guide}/"))
            .await
    }

    pub async fn post(&self, review: &NewReview) -> Result<Review, ApiError> {
        self.client.tours().post_review(review).await
    }
}
