use reqwest::multipart::{Form, Part};
use visitdesk_types::{NewUser, ProfileId, ProfilePicture, Role, UserId, UserRecord};

use crate::{ApiClient, ApiError};

pub struct Users<'a> {
    pub(crate) client: &'a ApiClient,
}

/// A user row, with the advisor's authorized days when the user is an advisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDetails {
    pub user: UserRecord,
    pub authorized_day: Option<Vec<u8>>,
}

impl Users<'_> {
    pub async fn list(&self) -> Result<Vec<UserRecord>, ApiError> {
        self.client.get("api/users/").await
    }

    pub async fn create(&self, user: &NewUser) -> Result<UserRecord, ApiError> {
        self.client.post("api/users/create-user/", user).await
    }

    /// Fetch a user; advisors are enriched from their advisor record, looked
    /// up by the user id.
    pub async fn get(&self, id: UserId) -> Result<UserDetails, ApiError> {
        let user: UserRecord = self.client.get(&format!("api/users/{id}/")).await?;
        let authorized_day = if user.role == Role::Advisor {
            let advisor = self
                .client
                .advisors()
                .get(ProfileId::new(user.id.value()))
                .await?;
            Some(advisor.authorized_day)
        } else {
            None
        };
        Ok(UserDetails {
            user,
            authorized_day,
        })
    }

    pub async fn update<B>(&self, id: UserId, body: &B) -> Result<UserRecord, ApiError>
    where
        B: serde::Serialize + ?Sized + Sync,
    {
        self.client.put(&format!("api/users/{id}/"), body).await
    }

    pub async fn partial_update<B>(&self, id: UserId, body: &B) -> Result<UserRecord, ApiError>
    where
        B: serde::Serialize + ?Sized + Sync,
    {
        self.client.patch(&format!("api/users/{id}/"), body).await
    }

    pub async fn delete(&self, id: UserId) -> Result<(), ApiError> {
        self.client.delete(&format!("api/users/{id}/")).await
    }

    /// Upload a new profile picture as the `profile_picture` multipart field.
    pub async fn update_profile_picture(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<ProfilePicture, ApiError> {
        let file_name = file_name.to_string();
        self.client
            .patch_multipart("api/user/update-profile-picture/", move || {
                Form::new().part(
                    "profile_picture",
                    Part::bytes(bytes.clone()).file_name(file_name.clone()),
                )
            })
            .await
    }
}
