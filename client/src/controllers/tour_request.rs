use visitdesk_types::{TourRequest, TourRequestId};

use crate::ApiClient;

pub struct TourRequests<'a> {
    pub(crate) client: &'a ApiClient,
}

impl TourRequests<'_> {
    crud_routes!("api/tour_request/", TourRequestId, TourRequest);
}
