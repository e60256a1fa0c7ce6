//! Weekly scheduling grid: four fixed slots per day, seven days per week.
//!
//! The server stores a guide's availability as a flat array of 28 flags where
//! the flag for `(day, slot)` lives at `day * 4 + slot`, with Monday as day 0.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SLOTS_PER_DAY: usize = 4;
pub const DAYS_PER_WEEK: usize = 7;
pub const GRID_LEN: usize = SLOTS_PER_DAY * DAYS_PER_WEEK;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SlotError {
    #[error("slot index {0} is out of range (0..=3)")]
    SlotOutOfRange(u8),
    #[error("day index {0} is out of range (0..=6)")]
    DayOutOfRange(u8),
    #[error("unknown slot label: {0}")]
    UnknownLabel(String),
    #[error("unknown weekday: {0}")]
    UnknownDay(String),
    #[error("grid index {0} is out of range (0..28)")]
    IndexOutOfRange(usize),
    #[error("availability grid must hold {GRID_LEN} flags, got {0}")]
    GridLength(usize),
}

/// One of the four daily time windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Slot(u8);

const SLOT_LABELS: [&str; SLOTS_PER_DAY] = ["09.00 AM", "11.00 AM", "13.30 PM", "16.00 PM"];
const SLOT_STARTS: [&str; SLOTS_PER_DAY] = ["9:00", "11:30", "14:00", "16:00"];

impl Slot {
    pub const ALL: [Slot; SLOTS_PER_DAY] = [Slot(0), Slot(1), Slot(2), Slot(3)];

    pub fn new(index: u8) -> Result<Self, SlotError> {
        if usize::from(index) < SLOTS_PER_DAY {
            Ok(Self(index))
        } else {
            Err(SlotError::SlotOutOfRange(index))
        }
    }

    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }

    /// The label the server uses for `time_slot` fields (`"13.30 PM"`).
    #[must_use]
    pub fn label(self) -> &'static str {
        SLOT_LABELS[usize::from(self.0)]
    }

    /// Display start time (`"14:00"`).
    #[must_use]
    pub fn start_time(self) -> &'static str {
        SLOT_STARTS[usize::from(self.0)]
    }

    pub fn from_label(label: &str) -> Result<Self, SlotError> {
        SLOT_LABELS
            .iter()
            .position(|l| *l == label.trim())
            .map(|i| Self(i as u8))
            .ok_or_else(|| SlotError::UnknownLabel(label.to_string()))
    }
}

/// Start time for a raw slot index, or `"Invalid Slot"` outside 0..=3.
#[must_use]
pub fn slot_to_string(index: i64) -> &'static str {
    u8::try_from(index)
        .ok()
        .and_then(|i| Slot::new(i).ok())
        .map_or("Invalid Slot", Slot::start_time)
}

impl TryFrom<u8> for Slot {
    type Error = SlotError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Slot> for u8 {
    fn from(slot: Slot) -> Self {
        slot.0
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; DAYS_PER_WEEK] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Result<Self, SlotError> {
        Self::ALL
            .get(usize::from(index))
            .copied()
            .ok_or(SlotError::DayOutOfRange(index))
    }

    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Monday => "Mon",
            Self::Tuesday => "Tue",
            Self::Wednesday => "Wed",
            Self::Thursday => "Thu",
            Self::Friday => "Fri",
            Self::Saturday => "Sat",
            Self::Sunday => "Sun",
        }
    }
}

impl TryFrom<u8> for Weekday {
    type Error = SlotError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_index(value)
    }
}

impl From<Weekday> for u8 {
    fn from(day: Weekday) -> Self {
        day.index()
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for Weekday {
    type Err = SlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(index) = trimmed.parse::<u8>() {
            return Self::from_index(index);
        }
        let lower = trimmed.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|day| {
                let short = day.short_name().to_ascii_lowercase();
                lower == short || (lower.len() > 3 && format!("{day:?}").to_ascii_lowercase() == lower)
            })
            .ok_or_else(|| SlotError::UnknownDay(s.to_string()))
    }
}

/// A `(day, slot)` cell of the weekly grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WeeklySlot {
    pub day: Weekday,
    pub slot: Slot,
}

impl WeeklySlot {
    #[must_use]
    pub const fn new(day: Weekday, slot: Slot) -> Self {
        Self { day, slot }
    }

    /// Position of this cell in the flat 28-flag array.
    #[must_use]
    pub const fn flat_index(self) -> usize {
        self.day.index() as usize * SLOTS_PER_DAY + self.slot.index() as usize
    }

    pub fn from_flat_index(index: usize) -> Result<Self, SlotError> {
        if index >= GRID_LEN {
            return Err(SlotError::IndexOutOfRange(index));
        }
        let day = Weekday::from_index((index / SLOTS_PER_DAY) as u8)?;
        let slot = Slot::new((index % SLOTS_PER_DAY) as u8)?;
        Ok(Self { day, slot })
    }
}

impl fmt::Display for WeeklySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.day, self.slot.start_time())
    }
}

/// Decode the server's 28-flag availability array into the selected cells,
/// in grid order.
pub fn decode_availability(flags: &[u8]) -> Result<Vec<WeeklySlot>, SlotError> {
    if flags.len() != GRID_LEN {
        return Err(SlotError::GridLength(flags.len()));
    }
    flags
        .iter()
        .enumerate()
        .filter(|(_, flag)| **flag == 1)
        .map(|(index, _)| WeeklySlot::from_flat_index(index))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuesday_slot_two_is_flat_index_six() {
        let cell = WeeklySlot::new(Weekday::Tuesday, Slot::new(2).unwrap());
        assert_eq!(cell.flat_index(), 6);
        assert_eq!(WeeklySlot::from_flat_index(6).unwrap(), cell);
    }

    #[test]
    fn slot_rejects_out_of_range() {
        assert_eq!(Slot::new(4), Err(SlotError::SlotOutOfRange(4)));
        assert_eq!(Weekday::from_index(7), Err(SlotError::DayOutOfRange(7)));
    }

    #[test]
    fn slot_labels_round_trip_through_server_names() {
        for slot in Slot::ALL {
            assert_eq!(Slot::from_label(slot.label()).unwrap(), slot);
        }
        assert!(Slot::from_label("noon").is_err());
    }

    #[test]
    fn slot_to_string_matches_display_table() {
        assert_eq!(slot_to_string(0), "9:00");
        assert_eq!(slot_to_string(1), "11:30");
        assert_eq!(slot_to_string(2), "14:00");
        assert_eq!(slot_to_string(3), "16:00");
        assert_eq!(slot_to_string(4), "Invalid Slot");
        assert_eq!(slot_to_string(-1), "Invalid Slot");
    }

    #[test]
    fn decode_availability_picks_set_flags() {
        let mut flags = vec![0u8; GRID_LEN];
        flags[0] = 1;
        flags[6] = 1;
        flags[27] = 1;
        let cells = decode_availability(&flags).unwrap();
        assert_eq!(
            cells,
            vec![
                WeeklySlot::new(Weekday::Monday, Slot::new(0).unwrap()),
                WeeklySlot::new(Weekday::Tuesday, Slot::new(2).unwrap()),
                WeeklySlot::new(Weekday::Sunday, Slot::new(3).unwrap()),
            ]
        );
    }

    #[test]
    fn decode_availability_rejects_wrong_length() {
        assert_eq!(
            decode_availability(&[1, 0, 1]),
            Err(SlotError::GridLength(3))
        );
    }

    #[test]
    fn weekday_parses_names_and_indices() {
        assert_eq!("tue".parse::<Weekday>().unwrap(), Weekday::Tuesday);
        assert_eq!("Tuesday".parse::<Weekday>().unwrap(), Weekday::Tuesday);
        assert_eq!("1".parse::<Weekday>().unwrap(), Weekday::Tuesday);
        assert!("someday".parse::<Weekday>().is_err());
    }
}
