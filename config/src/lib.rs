//! Configuration for Visitdesk.
//!
//! Read from `~/.visitdesk/config.toml`. Every section is optional; missing
//! values fall back to the defaults below. String values may reference
//! environment variables as `${VAR}`.
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:8000/"
//! ws_base_url = "ws://localhost:8001"
//! timeout_seconds = 10
//!
//! [realtime]
//! reconnect_initial_seconds = 5
//! reconnect_max_seconds = 60
//! max_reconnect_attempts = 10
//!
//! [session]
//! token_path = "~/.visitdesk/session.json"
//! refresh_lead_seconds = 60
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/";
pub const DEFAULT_WS_BASE_URL: &str = "ws://localhost:8001/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RECONNECT_INITIAL_SECS: u64 = 5;
pub const DEFAULT_RECONNECT_MAX_SECS: u64 = 60;
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 10;
pub const DEFAULT_REFRESH_LEAD_SECS: u64 = 60;

pub const API_BASE_URL_ENV: &str = "VISITDESK_API_BASE_URL";
pub const WS_BASE_URL_ENV: &str = "VISITDESK_WS_BASE_URL";

#[derive(Debug, Default, Deserialize)]
pub struct VisitdeskConfig {
    pub api: Option<ApiConfig>,
    pub realtime: Option<RealtimeConfig>,
    pub session: Option<SessionConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid {field} URL {value:?}: {source}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        source: url::ParseError,
    },
}

/// REST and socket endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub ws_base_url: Option<String>,
    /// Per-request timeout. Default: 10.
    pub timeout_seconds: Option<u64>,
}

/// Chat socket reconnection policy.
#[derive(Debug, Default, Deserialize)]
pub struct RealtimeConfig {
    pub reconnect_initial_seconds: Option<u64>,
    pub reconnect_max_seconds: Option<u64>,
    /// Reconnect attempts after a close before giving up. `0` disables reconnects.
    pub max_reconnect_attempts: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionConfig {
    pub token_path: Option<String>,
    /// How long before `exp` the access token is proactively refreshed.
    pub refresh_lead_seconds: Option<u64>,
}

/// Fully resolved settings handed to the client, session and engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: Url,
    pub ws_base_url: Url,
    pub request_timeout: Duration,
    pub reconnect: ReconnectSettings,
    pub token_path: PathBuf,
    pub refresh_lead: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectSettings {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(DEFAULT_RECONNECT_INITIAL_SECS),
            max_delay: Duration::from_secs(DEFAULT_RECONNECT_MAX_SECS),
            max_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
        }
    }
}

impl Settings {
    /// Defaults pointed at a specific API host; the socket host defaults to the
    /// same authority with the `ws`/`wss` scheme.
    pub fn for_base_url(api_base_url: &str) -> Result<Self, ConfigError> {
        let config = VisitdeskConfig {
            api: Some(ApiConfig {
                base_url: Some(api_base_url.to_string()),
                ws_base_url: None,
                timeout_seconds: None,
            }),
            ..VisitdeskConfig::default()
        };
        config.resolve_with(|_| None)
    }
}

/// Replace `${VAR}` references with environment values. Unset variables
/// become empty; an unclosed `${` is kept verbatim.
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let var = &after[..end];
                if !var.is_empty() {
                    out.push_str(&env::var(var).unwrap_or_default());
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    PathBuf::from(path)
}

/// Parse a base URL, ensuring it ends with `/` so relative endpoint paths join
/// underneath it instead of replacing its last segment.
fn parse_base_url(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Url::parse(&normalized).map_err(|source| ConfigError::InvalidUrl {
        field,
        value: raw.to_string(),
        source,
    })
}

/// `http://host:8000/` → `ws://host:8000/`, `https` → `wss`.
fn derive_ws_url(api: &Url) -> Url {
    let mut ws = api.clone();
    let scheme = if api.scheme() == "https" { "wss" } else { "ws" };
    if ws.set_scheme(scheme).is_err() {
        tracing::debug!(url = %api, "Could not derive socket scheme from API URL");
    }
    ws
}

impl VisitdeskConfig {
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    /// Resolve against the process environment.
    pub fn resolve(&self) -> Result<Settings, ConfigError> {
        self.resolve_with(|key| env::var(key).ok())
    }

    /// Resolve with an explicit environment lookup (overrides win over the file).
    pub fn resolve_with<F>(&self, lookup: F) -> Result<Settings, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api = self.api.as_ref();
        let realtime = self.realtime.as_ref();
        let session = self.session.as_ref();

        let api_raw = lookup(API_BASE_URL_ENV)
            .or_else(|| api.and_then(|a| a.base_url.as_deref()).map(expand_env_vars))
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let api_base_url = parse_base_url("api.base_url", &api_raw)?;

        let ws_raw = lookup(WS_BASE_URL_ENV)
            .or_else(|| api.and_then(|a| a.ws_base_url.as_deref()).map(expand_env_vars))
            .filter(|s| !s.trim().is_empty());
        let ws_base_url = match ws_raw {
            Some(raw) => parse_base_url("api.ws_base_url", &raw)?,
            None if api.and_then(|a| a.base_url.as_ref()).is_some()
                || lookup(API_BASE_URL_ENV).is_some() =>
            {
                derive_ws_url(&api_base_url)
            }
            None => parse_base_url("api.ws_base_url", DEFAULT_WS_BASE_URL)?,
        };

        let request_timeout = Duration::from_secs(
            api.and_then(|a| a.timeout_seconds)
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        );

        let defaults = ReconnectSettings::default();
        let initial_delay = realtime
            .and_then(|r| r.reconnect_initial_seconds)
            .map_or(defaults.initial_delay, Duration::from_secs);
        let max_delay = realtime
            .and_then(|r| r.reconnect_max_seconds)
            .map_or(defaults.max_delay, Duration::from_secs)
            .max(initial_delay);
        let reconnect = ReconnectSettings {
            initial_delay,
            max_delay,
            max_attempts: realtime
                .and_then(|r| r.max_reconnect_attempts)
                .unwrap_or(defaults.max_attempts),
        };

        let token_path = session
            .and_then(|s| s.token_path.as_deref())
            .map(|p| expand_home(&expand_env_vars(p)))
            .or_else(default_token_path)
            .unwrap_or_else(|| PathBuf::from(".visitdesk").join("session.json"));

        let refresh_lead = Duration::from_secs(
            session
                .and_then(|s| s.refresh_lead_seconds)
                .unwrap_or(DEFAULT_REFRESH_LEAD_SECS),
        );

        Ok(Settings {
            api_base_url,
            ws_base_url,
            request_timeout,
            reconnect,
            token_path,
            refresh_lead,
        })
    }
}

pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".visitdesk"))
}

pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

fn default_token_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("session.json"))
}
