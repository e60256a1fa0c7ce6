use std::fmt;

/// Declares an integer primary-key newtype as the server serializes it.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn value(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

define_id!(
    /// Account id (`auth/me/` `id`, chat participants, message senders).
    UserId
);
define_id!(
    /// Role-specific profile id: the guide, advisor or visitor row behind a user.
    ProfileId
);
define_id!(ChatId);
define_id!(MessageId);
define_id!(TourId);
define_id!(BatchId);
define_id!(TourRequestId);
define_id!(FairId);
define_id!(RegRequestId);
define_id!(ReviewId);
define_id!(ReportId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_bare_integers() {
        let json = serde_json::to_string(&ChatId::new(42)).unwrap();
        assert_eq!(json, "42");
        let back: MessageId = serde_json::from_str("7").unwrap();
        assert_eq!(back, MessageId::new(7));
    }

    #[test]
    fn display_is_the_raw_number() {
        assert_eq!(TourId::new(9).to_string(), "9");
    }
}
