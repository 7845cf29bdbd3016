//! Window step granularity.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Granularity used to split a time range into jobs or snapshot points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    /// 15-minute steps.
    #[serde(rename = "m15")]
    Minute15,
    /// 1-hour steps.
    #[serde(rename = "h1")]
    Hour1,
    /// 6-hour steps.
    #[serde(rename = "h6")]
    Hour6,
    /// 1-day steps.
    #[default]
    #[serde(rename = "d1")]
    Day1,
    /// 1-week steps.
    #[serde(rename = "w1")]
    Week1,
}

impl Step {
    /// Returns the step length in seconds.
    #[must_use]
    pub const fn seconds(&self) -> i64 {
        match self {
            Self::Minute15 => 900,
            Self::Hour1 => 3_600,
            Self::Hour6 => 21_600,
            Self::Day1 => 86_400,
            Self::Week1 => 604_800,
        }
    }

    /// Returns the step length as a [`TimeDelta`].
    #[must_use]
    pub fn delta(&self) -> TimeDelta {
        TimeDelta::seconds(self.seconds())
    }

    /// Returns the step as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Minute15 => "m15",
            Self::Hour1 => "h1",
            Self::Hour6 => "h6",
            Self::Day1 => "d1",
            Self::Week1 => "w1",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Step {
    type Err = StepParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "m15" | "15m" => Ok(Self::Minute15),
            "h1" | "1h" | "hour" | "hourly" => Ok(Self::Hour1),
            "h6" | "6h" => Ok(Self::Hour6),
            "d1" | "1d" | "day" | "daily" => Ok(Self::Day1),
            "w1" | "1w" | "week" | "weekly" => Ok(Self::Week1),
            _ => Err(StepParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an invalid step string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepParseError(String);

impl std::fmt::Display for StepParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid step '{}', expected one of: m15, h1, h6, d1, w1",
            self.0
        )
    }
}

impl std::error::Error for StepParseError {}
