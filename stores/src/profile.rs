use visitdesk_session::Session;
use visitdesk_types::{PasswordChange, UserProfile};

use crate::StoreError;

/// The signed-in user's own account page.
#[derive(Debug)]
pub struct ProfileStore {
    session: Session,
    profile: Option<UserProfile>,
}

impl ProfileStore {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            profile: None,
        }
    }

    #[must_use]
    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub async fn fetch(&mut self) -> Result<(), StoreError> {
        self.profile = Some(self.session.client().auth().profile().await?);
        Ok(())
    }

    /// `confirm` must repeat `new`; nothing is sent otherwise.
    pub async fn change_password(
        &self,
        current: &str,
        new: &str,
        confirm: &str,
    ) -> Result<(), StoreError> {
        if new != confirm {
            return Err(StoreError::PasswordMismatch);
        }
        let change = PasswordChange {
            current_password: current.to_string(),
            new_password: new.to_string(),
        };
        self.session.client().auth().change_password(&change).await?;
        tracing::info!("Password changed");
        Ok(())
    }

    /// Upload a new picture and point both this store and the session at it.
    pub async fn save_profile_picture(
        &mut self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StoreError> {
        let uploaded = self
            .session
            .client()
            .users()
            .update_profile_picture(file_name, bytes)
            .await?;
        let url = uploaded.profile_picture;

        if let Some(profile) = self.profile.as_mut() {
            profile.profile_picture = Some(url.clone());
        }
        self.session.set_profile_picture(url.clone());
        Ok(url)
    }
}
