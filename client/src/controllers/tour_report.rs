use visitdesk_types::{NewTourReport, TourId, TourReport};

use crate::{ApiClient, ApiError};

pub struct TourReports<'a> {
    pub(crate) client: &'a ApiClient,
}

impl TourReports<'_> {
    pub async fn post(&self, report: &NewTourReport) -> Result<TourReport, ApiError> {
        self.client.post("api/tour_report/", report).await
    }

    pub async fn by_tour(&self, tour: TourId) -> Result<Vec<TourReport>, ApiError> {
        self.client
            .get(&format!("api/tour_report/by-tour/{tour}/"))
            .await
    }
}
