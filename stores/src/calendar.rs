//! Calendar navigation state. No server access.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Day,
    Week,
    #[default]
    Month,
}

impl ViewMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown calendar view: {0} (expected day, week or month)")]
pub struct UnknownViewMode(pub String);

impl FromStr for ViewMode {
    type Err = UnknownViewMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            _ => Err(UnknownViewMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarStore {
    current: NaiveDate,
    mode: ViewMode,
}

impl Default for CalendarStore {
    fn default() -> Self {
        Self::new(Local::now().date_naive())
    }
}

impl CalendarStore {
    #[must_use]
    pub fn new(today: NaiveDate) -> Self {
        Self {
            current: today,
            mode: ViewMode::default(),
        }
    }

    #[must_use]
    pub fn current_date(&self) -> NaiveDate {
        self.current
    }

    #[must_use]
    pub fn view_mode(&self) -> ViewMode {
        self.mode
    }

    pub fn next_day(&mut self) {
        self.current = self
            .current
            .checked_add_days(Days::new(1))
            .unwrap_or(self.current);
    }

    pub fn previous_day(&mut self) {
        self.current = self
            .current
            .checked_sub_days(Days::new(1))
            .unwrap_or(self.current);
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.current = date;
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
    }
}
