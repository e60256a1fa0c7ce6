//! One thin wrapper per server resource.
//!
//! Controllers only map calls to paths. They do not retry, validate or cache,
//! and server errors come back unchanged as [`ApiError`](crate::ApiError).

/// Standard collection routes: `GET base`, `POST base`, and
/// `GET/PUT/PATCH/DELETE base{id}/`.
macro_rules! crud_routes {
    ($base:literal, $id:ty, $record:ty) => {
        pub async fn list(&self) -> Result<Vec<$record>, $crate::ApiError> {
            self.client.get($base).await
        }

        pub async fn get(&self, id: $id) -> Result<$record, $crate::ApiError> {
            self.client.get(&format!(concat!($base, "{}/"), id)).await
        }

        pub async fn create<B>(&self, body: &B) -> Result<$record, $crate::ApiError>
        where
            B: serde::Serialize + ?Sized + Sync,
        {
            self.client.post($base, body).await
        }

        pub async fn update<B>(&self, id: $id, body: &B) -> Result<$record, $crate::ApiError>
        where
            B: serde::Serialize + ?Sized + Sync,
        {
            self.client
                .put(&format!(concat!($base, "{}/"), id), body)
                .await
        }

        pub async fn partial_update<B>(
            &self,
            id: $id,
            body: &B,
        ) -> Result<$record, $crate::ApiError>
        where
            B: serde::Serialize + ?Sized + Sync,
        {
            self.client
                .patch(&format!(concat!($base, "{}/"), id), body)
                .await
        }

        pub async fn delete(&self, id: $id) -> Result<(), $crate::ApiError> {
            self.client
                .delete(&format!(concat!($base, "{}/"), id))
                .await
        }
    };
}

mod advisor;
mod auth;
mod fair;
mod guide;
mod messaging;
mod reg_request;
mod review;
mod tour;
mod tour_report;
mod tour_request;
mod tour_request_batch;
mod user;
mod visitor;

pub use advisor::Advisors;
pub use auth::AuthApi;
pub use fair::Fairs;
pub use guide::Guides;
pub use messaging::Messaging;
pub use reg_request::RegRequests;
pub use review::Reviews;
pub use tour::Tours;
pub use tour_report::TourReports;
pub use tour_request::TourRequests;
pub use tour_request_batch::TourRequestBatches;
pub use user::{UserDetails, Users};
pub use visitor::Visitors;

use crate::ApiClient;

impl ApiClient {
    #[must_use]
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi { client: self }
    }

    #[must_use]
    pub fn advisors(&self) -> Advisors<'_> {
        Advisors { client: self }
    }

    #[must_use]
    pub fn guides(&self) -> Guides<'_> {
        Guides { client: self }
    }

    #[must_use]
    pub fn tours(&self) -> Tours<'_> {
        Tours { client: self }
    }

    #[must_use]
    pub fn visitors(&self) -> Visitors<'_> {
        Visitors { client: self }
    }

    #[must_use]
    pub fn fairs(&self) -> Fairs<'_> {
        Fairs { client: self }
    }

    #[must_use]
    pub fn reg_requests(&self) -> RegRequests<'_> {
        RegRequests { client: self }
    }

    #[must_use]
    pub fn tour_requests(&self) -> TourRequests<'_> {
        TourRequests { client: self }
    }

    #[must_use]
    pub fn tour_request_batches(&self) -> TourRequestBatches<'_> {
        TourRequestBatches { client: self }
    }

    #[must_use]
    pub fn messaging(&self) -> Messaging<'_> {
        Messaging { client: self }
    }

    #[must_use]
    pub fn reviews(&self) -> Reviews<'_> {
        Reviews { client: self }
    }

    #[must_use]
    pub fn tour_reports(&self) -> TourReports<'_> {
        TourReports { client: self }
    }

    #[must_use]
    pub fn users(&self) -> Users<'_> {
        Users { client: self }
    }
}
