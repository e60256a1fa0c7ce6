//! Account roles and their home routes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Director,
    Secretary,
    Coordinator,
    Advisor,
    Guide,
    Visitor,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Director,
        Role::Secretary,
        Role::Coordinator,
        Role::Advisor,
        Role::Guide,
        Role::Visitor,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Director => "director",
            Self::Secretary => "secretary",
            Self::Coordinator => "coordinator",
            Self::Advisor => "advisor",
            Self::Guide => "guide",
            Self::Visitor => "visitor",
        }
    }

    /// Landing path after login: `"/" + role`.
    #[must_use]
    pub fn home_path(self) -> String {
        format!("/{}", self.as_str())
    }

    /// Roles whose profile id is an advisor row (coordinators are advisors with
    /// every day authorized).
    #[must_use]
    pub const fn is_advisor_like(self) -> bool {
        matches!(self, Self::Advisor | Self::Coordinator)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == lower)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}
