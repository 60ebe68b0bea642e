//! Fixed-step grid frequencies.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

static FREQUENCY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+)?\s*([A-Za-z]+)\s*$").expect("frequency pattern is valid")
});

const CALENDAR_ALIASES: [&str; 11] = [
    "M", "MS", "ME", "Q", "QS", "QE", "Y", "YS", "YE", "A", "AS",
];

/// Base unit of a grid frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrequencyUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
}

impl FrequencyUnit {
    fn millis(self) -> i64 {
        match self {
            Self::Second => 1_000,
            Self::Minute => 60_000,
            Self::Hour => 3_600_000,
            Self::Day => 86_400_000,
            Self::Week => 7 * 86_400_000,
        }
    }

    fn alias(self) -> &'static str {
        match self {
            Self::Second => "S",
            Self::Minute => "min",
            Self::Hour => "H",
            Self::Day => "D",
            Self::Week => "W",
        }
    }
}

/// Step of a regular time grid, e.g. `D` (daily) or `15min`.
///
/// Parsed from pandas-style offset aliases with an optional multiplier.
/// Only fixed-length units are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Frequency {
    multiple: u32,
    unit: FrequencyUnit,
}

impl Frequency {
    pub fn new(multiple: u32, unit: FrequencyUnit) -> Result<Self, ParseFrequencyError> {
        if multiple == 0 {
            return Err(ParseFrequencyError::ZeroMultiple);
        }
        Ok(Self { multiple, unit })
    }

    pub fn daily() -> Self {
        Self {
            multiple: 1,
            unit: FrequencyUnit::Day,
        }
    }

    pub fn unit(&self) -> FrequencyUnit {
        self.unit
    }

    pub fn multiple(&self) -> u32 {
        self.multiple
    }

    /// Grid step in milliseconds.
    pub fn step_millis(&self) -> i64 {
        i64::from(self.multiple) * self.unit.millis()
    }
}

impl Default for Frequency {
    fn default() -> Self {
        Self::daily()
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.multiple == 1 {
            write!(f, "{}", self.unit.alias())
        } else {
            write!(f, "{}{}", self.multiple, self.unit.alias())
        }
    }
}

/// Errors produced when parsing a frequency alias.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseFrequencyError {
    #[error("Unrecognized frequency '{0}' (expected S, min, H, D or W with an optional multiple)")]
    Unrecognized(String),

    #[error("Frequency '{0}' has no fixed length; use S, min, H, D or W")]
    CalendarUnit(String),

    #[error("Frequency multiple must be at least 1")]
    ZeroMultiple,
}

impl FromStr for Frequency {
    type Err = ParseFrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = FREQUENCY_PATTERN
            .captures(s)
            .ok_or_else(|| ParseFrequencyError::Unrecognized(s.to_string()))?;

        let multiple = match caps.get(1) {
            Some(m) => m
                .as_str()
                .parse::<u32>()
                .map_err(|_| ParseFrequencyError::Unrecognized(s.to_string()))?,
            None => 1,
        };

        // lowercase "ms" is milliseconds, not month start
        let alias = &caps[2];
        if alias != "ms" && CALENDAR_ALIASES.contains(&alias.to_ascii_uppercase().as_str()) {
            return Err(ParseFrequencyError::CalendarUnit(s.trim().to_string()));
        }

        let unit = match alias.to_ascii_lowercase().as_str() {
            "s" => FrequencyUnit::Second,
            "t" | "min" => FrequencyUnit::Minute,
            "h" => FrequencyUnit::Hour,
            "d" => FrequencyUnit::Day,
            "w" => FrequencyUnit::Week,
            _ => return Err(ParseFrequencyError::Unrecognized(s.to_string())),
        };

        Self::new(multiple, unit)
    }
}

impl TryFrom<String> for Frequency {
    type Error = ParseFrequencyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Frequency> for String {
    fn from(freq: Frequency) -> Self {
        freq.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("D".parse::<Frequency>().unwrap(), Frequency::daily());
        assert_eq!("H".parse::<Frequency>().unwrap().step_millis(), 3_600_000);
        assert_eq!("15min".parse::<Frequency>().unwrap().step_millis(), 900_000);
        assert_eq!("2W".parse::<Frequency>().unwrap().step_millis(), 14 * 86_400_000);
        assert_eq!(" 30S ".parse::<Frequency>().unwrap().step_millis(), 30_000);
    }

    #[test]
    fn test_display_is_canonical() {
        assert_eq!("1D".parse::<Frequency>().unwrap().to_string(), "D");
        assert_eq!("15T".parse::<Frequency>().unwrap().to_string(), "15min");
        assert_eq!("6h".parse::<Frequency>().unwrap().to_string(), "6H");
    }

    #[test]
    fn test_units_ignore_case() {
        for alias in ["t", "Min", "MIN", "T", "min"] {
            assert_eq!(alias.parse::<Frequency>().unwrap().step_millis(), 60_000, "{}", alias);
        }
        assert_eq!("2W".parse::<Frequency>(), "2w".parse::<Frequency>());
        assert!(matches!(
            "ms".parse::<Frequency>(),
            Err(ParseFrequencyError::Unrecognized(_))
        ));
    }

    #[test]
    fn test_rejects_calendar_units() {
        assert!(matches!(
            "M".parse::<Frequency>(),
            Err(ParseFrequencyError::CalendarUnit(_))
        ));
        assert!(matches!(
            "1Y".parse::<Frequency>(),
            Err(ParseFrequencyError::CalendarUnit(_))
        ));
    }

    #[test]
    fn test_rejects_garbage_and_zero() {
        assert!(matches!(
            "daily".parse::<Frequency>(),
            Err(ParseFrequencyError::Unrecognized(_))
        ));
        assert!(matches!(
            "".parse::<Frequency>(),
            Err(ParseFrequencyError::Unrecognized(_))
        ));
        assert_eq!(
            "0D".parse::<Frequency>(),
            Err(ParseFrequencyError::ZeroMultiple)
        );
    }
}
