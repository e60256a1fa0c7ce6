//! Tours visible to the signed-in user.

use chrono::NaiveDate;
use visitdesk_session::Session;
use visitdesk_types::{NewReview, Review, Role, Tour, TourDraft, TourId};

use crate::{StoreError, profile_id};

/// A guide may drop out of a tour only this many days ahead.
pub const REJECTION_NOTICE_DAYS: i64 = 14;

#[derive(Debug)]
pub struct TourStore {
    session: Session,
    tours: Vec<Tour>,
    loaded: bool,
}

impl TourStore {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            tours: Vec::new(),
            loaded: false,
        }
    }

    #[must_use]
    pub fn tours(&self) -> &[Tour] {
        &self.tours
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Load the tours of the current role: a guide's, an advisor's or a
    /// visitor's own, or every tour for coordinators. Other roles see none.
    pub async fn fetch(&mut self) -> Result<(), StoreError> {
        let role = self.session.role().ok_or(StoreError::NotSignedIn)?;
        let tours = self.session.client().tours();

        let result = match role {
            Role::Guide => tours.of_guide(profile_id(&self.session)?).await,
            Role::Advisor => tours.of_advisor(profile_id(&self.session)?).await,
            Role::Visitor => tours.of_visitor(profile_id(&self.session)?).await,
            Role::Coordinator => tours.list().await,
            Role::Director | Role::Secretary => {
                tracing::debug!(%role, "Role has no tour list");
                self.tours.clear();
                return Ok(());
            }
        };

        match result {
            Ok(list) => {
                self.tours = list;
                self.loaded = true;
                Ok(())
            }
            Err(e) => {
                self.loaded = false;
                Err(e.into())
            }
        }
    }

    /// Tours on `date`, by id.
    #[must_use]
    pub fn on_date(&self, date: NaiveDate) -> Vec<&Tour> {
        let mut tours: Vec<&Tour> = self.tours.iter().filter(|t| t.date == date).collect();
        tours.sort_by_key(|t| t.id);
        tours
    }

    #[must_use]
    pub fn get(&self, id: TourId) -> Option<&Tour> {
        self.tours.iter().find(|t| t.id == id)
    }

    pub async fn update(&mut self, tour: &Tour) -> Result<(), StoreError> {
        self.session
            .client()
            .tours()
            .update(tour.id, &tour.to_draft())
            .await?;
        tracing::info!(tour = %tour.id, "Tour updated");
        self.fetch().await
    }

    pub async fn create(&mut self, draft: &TourDraft) -> Result<Tour, StoreError> {
        let tour = self.session.client().tours().create(draft).await?;
        tracing::info!(tour = %tour.id, "Tour created");
        self.fetch().await?;
        Ok(tour)
    }

    pub fn clear(&mut self) {
        self.tours.clear();
        self.loaded = false;
    }

    /// Drop the signed-in guide from `tour`. Refused inside the notice window.
    pub async fn reject(&mut self, tour: TourId, today: NaiveDate) -> Result<(), StoreError> {
        let guide = profile_id(&self.session)?;
        if let Some(date) = self.get(tour).map(|t| t.date) {
            let days_left = (date - today).num_days();
            if days_left < REJECTION_NOTICE_DAYS {
                return Err(StoreError::RejectionWindowClosed { days_left });
            }
        }

        self.session.client().tours().reject(tour, guide).await?;
        tracing::info!(%tour, "Tour rejected; now unassigned");
        self.fetch().await
    }

    /// Replace the list with the advisor's completed tours.
    pub async fn completed(&mut self) -> Result<(), StoreError> {
        let advisor = profile_id(&self.session)?;
        self.tours = self
            .session
            .client()
            .tours()
            .completed_of_advisor(advisor)
            .await?;
        Ok(())
    }

    pub async fn review_of(&self, tour: TourId) -> Result<Option<Review>, StoreError> {
        Ok(self.session.client().tours().review(tour).await?)
    }

    pub async fn post_review(
        &self,
        tour: TourId,
        review: &str,
        rating: f64,
    ) -> Result<Review, StoreError> {
        let body = NewReview {
            review: review.to_string(),
            rating,
            tour_id: tour,
        };
        Ok(self.session.client().tours().post_review(&body).await?)
    }
}
