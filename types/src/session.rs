//! Credentials, tokens and the authenticated profile.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ProfileId, Role, UserId};

/// JWT access token. `Debug` never prints the token itself.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

/// JWT refresh token. `Debug` never prints the token itself.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefreshToken(String);

macro_rules! token_impls {
    ($name:ident) => {
        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(concat!(stringify!($name), "([REDACTED])"))
            }
        }
    };
}

token_impls!(AccessToken);
token_impls!(RefreshToken);

/// Body of `POST auth/login/`.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Access + refresh pair returned by login and kept in the token store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: AccessToken,
    pub refresh: RefreshToken,
}

/// Response of `POST auth/refresh/`. Servers with rotation enabled also hand
/// back a new refresh token.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshedAccess {
    pub access: AccessToken,
    #[serde(default)]
    pub refresh: Option<RefreshToken>,
}

/// Response of `GET auth/me/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub role: Role,
    /// Guide, advisor or visitor row id. Absent for directors and secretaries.
    #[serde(default)]
    pub profile_id: Option<ProfileId>,
    #[serde(default, rename = "profilePicture")]
    pub profile_picture: Option<String>,
}

/// Body of `POST auth/change-password/`.
#[derive(Clone, Serialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

impl fmt::Debug for PasswordChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordChange([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_debug_is_redacted() {
        let token = AccessToken::new("eyJhbGciOi.secret.sig");
        assert_eq!(format!("{token:?}"), "AccessToken([REDACTED])");
        let creds = Credentials::new("a@b.c", "hunter2");
        assert!(!format!("{creds:?}").contains("hunter2"));
    }

    #[test]
    fn profile_reads_camel_case_picture_and_optional_profile_id() {
        let json = serde_json::json!({
            "id": 3,
            "email": "guide@uni.edu",
            "name": "Ada",
            "role": "guide",
            "profilePicture": "https://cdn/ada.png",
            "profile_id": 11
        });
        let profile: UserProfile = serde_json::from_value(json).unwrap();
        assert_eq!(profile.role, Role::Guide);
        assert_eq!(profile.profile_id, Some(ProfileId::new(11)));
        assert_eq!(profile.profile_picture.as_deref(), Some("https://cdn/ada.png"));

        let director: UserProfile = serde_json::from_value(serde_json::json!({
            "id": 1, "email": "d@uni.edu", "name": "D", "role": "director"
        }))
        .unwrap();
        assert_eq!(director.profile_id, None);
    }
}
