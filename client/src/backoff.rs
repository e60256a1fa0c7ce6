//! Exponential backoff for reconnecting the chat socket.
//!
//! - Initial delay: 5 seconds
//! - Doubling per attempt, capped at 60 seconds
//! - Jitter: down-jitter up to 25% (multiplier in [0.75, 1.0])
//! - At most 10 attempts per outage; the counter resets after a successful connect

use std::time::Duration;

use visitdesk_config::ReconnectSettings;

#[derive(Debug, Clone, PartialEq)]
pub struct BackoffConfig {
    /// Attempts allowed after a close before giving up.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Jitter factor for down-jitter (0.25 = up to 25% reduction).
    pub jitter_factor: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self::from(ReconnectSettings::default())
    }
}

impl From<ReconnectSettings> for BackoffConfig {
    fn from(settings: ReconnectSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            initial_delay: settings.initial_delay,
            max_delay: settings.max_delay,
            jitter_factor: 0.25,
        }
    }
}

/// Delay before attempt `step` (0 for the first reconnect).
#[must_use]
pub fn calculate_delay(step: u32, config: &BackoffConfig) -> Duration {
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(step.min(30) as i32);
    let capped = base.min(config.max_delay.as_secs_f64());

    let jitter = 1.0 - rand::random::<f64>() * config.jitter_factor.clamp(0.0, 1.0);
    Duration::from_secs_f64(capped * jitter)
}

/// Attempt counter for one outage.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    attempts: u32,
}

impl Backoff {
    #[must_use]
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            attempts: 0,
        }
    }

    /// Delay for the next attempt, or `None` once the budget is spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.config.max_attempts {
            return None;
        }
        let delay = calculate_delay(self.attempts, &self.config);
        self.attempts += 1;
        Some(delay)
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }
}
