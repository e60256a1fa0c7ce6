use std::fmt;

/// Authentication lifecycle.
///
/// `Anonymous → Authenticating → Authenticated ⇄ Refreshing`, with any
/// failure of an established session ending in `LoggedOut`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticating,
    Authenticated,
    Refreshing,
    LoggedOut,
}

impl SessionState {
    /// Whether requests currently carry credentials.
    #[must_use]
    pub const fn is_logged_in(self) -> bool {
        matches!(self, Self::Authenticated | Self::Refreshing)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Anonymous => "anonymous",
            Self::Authenticating => "authenticating",
            Self::Authenticated => "authenticated",
            Self::Refreshing => "refreshing",
            Self::LoggedOut => "logged_out",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// What the session tells whoever is driving the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    StateChanged(SessionState),
    /// Navigate to this path.
    Redirect(String),
    Notification {
        level: NotificationLevel,
        text: String,
    },
}

impl SessionEvent {
    pub fn info(text: impl Into<String>) -> Self {
        Self::Notification {
            level: NotificationLevel::Info,
            text: text.into(),
        }
    }
}
