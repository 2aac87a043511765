//! Fixed textual timestamps shared by the catalog, the ledger and the on-disk files.
//!
//! The representation is second-precision local wall time rendered as
//! `"Www Mmm dd hh:mm:ss yyyy"` (for example `"Tue Mar 04 13:05:02 2025"`).

use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// chrono format string for [`Timestamp`].
pub const TIMESTAMP_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid timestamp '{input}': {message}")]
pub struct TimestampParseError {
    pub input: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    /// Wrap a chrono value, dropping sub-second precision.
    pub fn from_naive(dt: NaiveDateTime) -> Self {
        Self(dt.with_nanosecond(0).unwrap_or(dt))
    }

    pub fn from_ymd_hms(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)?
            .and_hms_opt(hour, minute, second)
            .map(Self)
    }

    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }

    /// Shift by whole days. Negative values move backwards.
    pub fn add_days(self, days: i64) -> Self {
        Self(self.0 + TimeDelta::days(days))
    }

    /// Like [`Timestamp::add_days`], but `None` when the result leaves chrono's range.
    pub fn checked_add_days(self, days: i64) -> Option<Self> {
        let delta = TimeDelta::try_days(days)?;
        self.0.checked_add_signed(delta).map(Self)
    }

    /// Shift by whole seconds.
    pub fn add_seconds(self, seconds: i64) -> Self {
        Self(self.0 + TimeDelta::seconds(seconds))
    }

    /// Whole days elapsed from `from` to `to`: floor(seconds / 86400).
    ///
    /// Negative when `to` precedes `from`.
    pub fn days_between(from: Self, to: Self) -> i64 {
        (to.0 - from.0).num_seconds().div_euclid(SECONDS_PER_DAY)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl FromStr for Timestamp {
    type Err = TimestampParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT)
            .map(Self)
            .map_err(|e| TimestampParseError {
                input: s.to_string(),
                message: e.to_string(),
            })
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
