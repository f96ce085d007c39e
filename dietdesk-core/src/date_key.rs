//! Canonical day identifiers.
//!
//! A [`DateKey`] names one calendar day as `YYYY-MM-DD`. Keys are built from
//! the calendar fields of the zone a datetime was expressed in, never from its
//! UTC instant, so a local-midnight datetime always maps to its own day.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, TimeZone};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Format of a serialized [`DateKey`].
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Errors from parsing keys or months.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateKeyError {
    #[error("Invalid date '{0}'. Use YYYY-MM-DD.")]
    InvalidDate(String),

    #[error("Invalid month '{0}'. Use YYYY-MM.")]
    InvalidMonth(String),
}

/// A calendar day, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Key for the day `datetime` falls on in its own time zone.
    pub fn from_datetime<Tz: TimeZone>(datetime: &DateTime<Tz>) -> Self {
        Self(datetime.date_naive())
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Today according to the local clock.
    pub fn today() -> Self {
        Self::from_datetime(&Local::now())
    }

    pub fn to_date(self) -> NaiveDate {
        self.0
    }

    /// Reads a date as the backend sends it: either a plain key or an RFC 3339
    /// timestamp, which is keyed by the day it falls on in `zone`.
    fn from_wire<Tz: TimeZone>(raw: &str, zone: &Tz) -> Result<Self, DateKeyError> {
        if let Ok(key) = raw.parse() {
            return Ok(key);
        }
        DateTime::parse_from_rfc3339(raw.trim())
            .map(|instant| Self::from_datetime(&instant.with_timezone(zone)))
            .map_err(|_| DateKeyError::InvalidDate(raw.to_string()))
    }

    pub fn month(self) -> CalendarMonth {
        CalendarMonth {
            year: self.0.year(),
            month: self.0.month(),
        }
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_KEY_FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = DateKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        // chrono accepts unpadded fields; keys are always zero-padded
        if s.len() != 10 {
            return Err(DateKeyError::InvalidDate(s.to_string()));
        }
        NaiveDate::parse_from_str(s, DATE_KEY_FORMAT)
            .map(Self)
            .map_err(|_| DateKeyError::InvalidDate(s.to_string()))
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl Serialize for DateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateKey::from_wire(&raw, &Local).map_err(serde::de::Error::custom)
    }
}

/// Inclusive list of keys from `start` to `end`. Empty when `start > end`.
pub fn keys_between(start: DateKey, end: DateKey) -> Vec<DateKey> {
    if start > end {
        return Vec::new();
    }
    let days = (end.0 - start.0).num_days();
    (0..=days).map(|n| DateKey(start.0 + Duration::days(n))).collect()
}

/// A displayed calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarMonth {
    year: i32,
    month: u32,
}

impl CalendarMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn current() -> Self {
        DateKey::today().month()
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> DateKey {
        DateKey(NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default())
    }

    pub fn last_day(&self) -> DateKey {
        let next = self.next().first_day();
        DateKey(next.0 - Duration::days(1))
    }

    /// Every day of the month, 1st through last.
    pub fn keys(&self) -> Vec<DateKey> {
        keys_between(self.first_day(), self.last_day())
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

impl fmt::Display for CalendarMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for CalendarMonth {
    type Err = DateKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || DateKeyError::InvalidMonth(s.to_string());
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }
}
