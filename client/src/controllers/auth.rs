use visitdesk_types::{Credentials, PasswordChange, TokenPair, UserProfile};

use crate::{ApiClient, ApiError};

pub struct AuthApi<'a> {
    pub(crate) client: &'a ApiClient,
}

impl AuthApi<'_> {
    /// `POST auth/login/`. Sent without a bearer token; a 401 here means bad
    /// credentials, never a refresh.
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenPair, ApiError> {
        self.client.post_anonymous("auth/login/", credentials).await
    }

    pub async fn profile(&self) -> Result<UserProfile, ApiError> {
        self.client.get("auth/me/").await
    }

    /// `POST auth/refresh/`, coalesced with any in-flight reactive refresh.
    pub async fn refresh(&self) -> Result<TokenPair, ApiError> {
        self.client.refresh_access().await
    }

    pub async fn change_password(&self, change: &PasswordChange) -> Result<(), ApiError> {
        let _: serde_json::Value = self.client.post("auth/change-password/", change).await?;
        Ok(())
    }
}
