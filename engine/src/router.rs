//! Route table and navigation guard.
//!
//! Paths are matched without their query string, fragment or trailing slash.
//! Role-gated routes need a signed-in user of exactly that role; anything not
//! in the table passes through untouched.

use visitdesk_types::Role;

pub const HOME_PATH: &str = "/";
pub const CALENDAR_PATH: &str = "/calendar";
pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";
pub const FORBIDDEN_PATH: &str = "/403";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Calendar,
    Login,
    Register,
    Forbidden,
    /// A role's dashboard, e.g. `/guide`.
    Dashboard(Role),
}

impl Route {
    #[must_use]
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        let path = if trimmed.is_empty() { HOME_PATH } else { trimmed };

        match path {
            HOME_PATH => Some(Self::Home),
            CALENDAR_PATH => Some(Self::Calendar),
            LOGIN_PATH => Some(Self::Login),
            REGISTER_PATH => Some(Self::Register),
            FORBIDDEN_PATH => Some(Self::Forbidden),
            _ => Role::ALL
                .into_iter()
                .find(|role| path.strip_prefix('/') == Some(role.as_str()))
                .map(Self::Dashboard),
        }
    }

    #[must_use]
    pub fn path(self) -> String {
        match self {
            Self::Home => HOME_PATH.to_string(),
            Self::Calendar => CALENDAR_PATH.to_string(),
            Self::Login => LOGIN_PATH.to_string(),
            Self::Register => REGISTER_PATH.to_string(),
            Self::Forbidden => FORBIDDEN_PATH.to_string(),
            Self::Dashboard(role) => role.home_path(),
        }
    }

    #[must_use]
    pub const fn required_role(self) -> Option<Role> {
        match self {
            Self::Dashboard(role) => Some(role),
            _ => None,
        }
    }
}

/// Outcome of a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Go where asked.
    Allow(String),
    /// Go here instead.
    Redirect(String),
}

impl Navigation {
    /// Where the user ends up.
    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Self::Allow(path) | Self::Redirect(path) => path,
        }
    }
}

/// Decide a navigation to `path` for a user who is signed in as `role`, or
/// not signed in when `role` is `None`.
#[must_use]
pub fn guard(path: &str, role: Option<Role>) -> Navigation {
    let Some(required) = Route::parse(path).and_then(Route::required_role) else {
        return Navigation::Allow(path.to_string());
    };
    match role {
        None => Navigation::Redirect(LOGIN_PATH.to_string()),
        Some(role) if role != required => Navigation::Redirect(FORBIDDEN_PATH.to_string()),
        Some(_) => Navigation::Allow(path.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_routes_are_always_allowed() {
        for path in ["/", "/calendar", "/login", "/register", "/403"] {
            assert_eq!(guard(path, None), Navigation::Allow(path.to_string()));
        }
    }

    #[test]
    fn anonymous_user_is_sent_to_login() {
        assert_eq!(
            guard("/guide", None),
            Navigation::Redirect("/login".to_string())
        );
    }

    #[test]
    fn wrong_role_is_forbidden() {
        assert_eq!(
            guard("/director", Some(Role::Guide)),
            Navigation::Redirect("/403".to_string())
        );
        assert_eq!(
            guard("/coordinator", Some(Role::Advisor)),
            Navigation::Redirect("/403".to_string())
        );
    }

    #[test]
    fn own_dashboard_is_allowed_with_query_and_trailing_slash() {
        assert_eq!(
            guard("/visitor/?tab=fairs", Some(Role::Visitor)),
            Navigation::Allow("/visitor/?tab=fairs".to_string())
        );
    }

    #[test]
    fn unknown_paths_pass_through() {
        assert_eq!(
            guard("/no/such/page", None),
            Navigation::Allow("/no/such/page".to_string())
        );
        assert_eq!(Route::parse("/guides"), None);
    }

    #[test]
    fn every_role_has_a_dashboard_route() {
        for role in Role::ALL {
            let route = Route::parse(&role.home_path()).unwrap();
            assert_eq!(route, Route::Dashboard(role));
            assert_eq!(route.path(), role.home_path());
        }
    }
}
