use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use thiserror::Error;

const INPUT_FORMAT: &str = "%I:%M %p";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not parse time of day {input:?}, expected hh:mm AM|PM")]
pub struct TimeParseError {
    pub input: String,
}

/// Wall-clock time without a date, ordered within a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    /// Parses `hh:mm AM|PM`. Surrounding whitespace is ignored and the
    /// meridiem is case-insensitive.
    pub fn parse(text: &str) -> Result<Self, TimeParseError> {
        NaiveTime::parse_from_str(text.trim(), INPUT_FORMAT)
            .map(Self)
            .map_err(|_| TimeParseError {
                input: text.to_string(),
            })
    }

    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }
}

impl FromStr for TimeOfDay {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(INPUT_FORMAT))
    }
}

/// Inclusive `[from, to]` range of times of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    from: TimeOfDay,
    to: TimeOfDay,
}

impl TimeWindow {
    /// Returns `None` when `from` is after `to`; the bounds are never swapped.
    pub fn new(from: TimeOfDay, to: TimeOfDay) -> Option<Self> {
        (from <= to).then_some(Self { from, to })
    }

    pub fn contains(&self, time: TimeOfDay) -> bool {
        self.from <= time && time <= self.to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_pads_hour() {
        let t = TimeOfDay::parse("3:05 pm").unwrap();
        assert_eq!(t.to_string(), "03:05 PM");
    }

    #[test]
    fn noon_and_midnight_order() {
        let midnight = TimeOfDay::parse("12:00 AM").unwrap();
        let noon = TimeOfDay::parse("12:00 PM").unwrap();
        assert!(midnight < noon);
        assert_eq!(midnight, TimeOfDay::from_hm(0, 0).unwrap());
        assert_eq!(noon, TimeOfDay::from_hm(12, 0).unwrap());
    }
}
