//! Relative "last seen" ages and online/offline classification.

use chrono::{DateTime, Utc};
use std::fmt;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const MONTH: u64 = 30 * DAY;
const YEAR: u64 = 12 * MONTH;

/// Members heard from within this many seconds are online.
pub const ONLINE_THRESHOLD_SECS: u64 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Months,
    Years,
}

impl AgeUnit {
    pub fn seconds(self) -> u64 {
        match self {
            AgeUnit::Seconds => 1,
            AgeUnit::Minutes => MINUTE,
            AgeUnit::Hours => HOUR,
            AgeUnit::Days => DAY,
            AgeUnit::Months => MONTH,
            AgeUnit::Years => YEAR,
        }
    }

    fn label(self, value: u64) -> &'static str {
        let plural = value != 1;
        match self {
            AgeUnit::Seconds => "sec",
            AgeUnit::Minutes => "min",
            AgeUnit::Hours if plural => "hours",
            AgeUnit::Hours => "hour",
            AgeUnit::Days if plural => "days",
            AgeUnit::Days => "day",
            AgeUnit::Months if plural => "months",
            AgeUnit::Months => "month",
            AgeUnit::Years if plural => "years",
            AgeUnit::Years => "year",
        }
    }
}

/// Elapsed time expressed in the largest unit that fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Age {
    pub value: u64,
    pub unit: AgeUnit,
}

impl Age {
    pub fn from_secs(secs: u64) -> Self {
        let unit = if secs < MINUTE {
            AgeUnit::Seconds
        } else if secs < HOUR {
            AgeUnit::Minutes
        } else if secs < DAY {
            AgeUnit::Hours
        } else if secs < MONTH {
            AgeUnit::Days
        } else if secs < YEAR {
            AgeUnit::Months
        } else {
            AgeUnit::Years
        };
        Age {
            value: secs / unit.seconds(),
            unit,
        }
    }
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit.label(self.value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Online,
    Offline,
}

impl Presence {
    pub fn from_secs(secs: u64) -> Self {
        if secs < ONLINE_THRESHOLD_SECS {
            Presence::Online
        } else {
            Presence::Offline
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Presence::Online => "Online",
            Presence::Offline => "Offline",
        }
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Whole seconds between `last_seen_ms` (epoch millis) and `now`.
/// Timestamps in the future clamp to zero.
pub fn elapsed_secs(last_seen_ms: i64, now: DateTime<Utc>) -> u64 {
    let delta_ms = now.timestamp_millis().saturating_sub(last_seen_ms);
    u64::try_from(delta_ms / 1000).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn picks_largest_non_zero_unit() {
        let cases = [
            (0, 0, AgeUnit::Seconds),
            (59, 59, AgeUnit::Seconds),
            (60, 1, AgeUnit::Minutes),
            (3_599, 59, AgeUnit::Minutes),
            (3_600, 1, AgeUnit::Hours),
            (86_399, 23, AgeUnit::Hours),
            (86_400, 1, AgeUnit::Days),
            (2_591_999, 29, AgeUnit::Days),
            (2_592_000, 1, AgeUnit::Months),
            (31_103_999, 11, AgeUnit::Months),
            (31_104_000, 1, AgeUnit::Years),
            (93_312_000, 3, AgeUnit::Years),
        ];
        for (secs, value, unit) in cases {
            assert_eq!(Age::from_secs(secs), Age { value, unit }, "{secs}s");
        }
    }

    #[test]
    fn formats_short_labels() {
        assert_eq!(Age::from_secs(45).to_string(), "45 sec");
        assert_eq!(Age::from_secs(125).to_string(), "2 min");
        assert_eq!(Age::from_secs(3_600).to_string(), "1 hour");
        assert_eq!(Age::from_secs(2 * 86_400).to_string(), "2 days");
        assert_eq!(Age::from_secs(31_104_000).to_string(), "1 year");
    }

    #[test]
    fn online_threshold_is_strict() {
        assert_eq!(Presence::from_secs(0), Presence::Online);
        assert_eq!(Presence::from_secs(599), Presence::Online);
        assert_eq!(Presence::from_secs(600), Presence::Offline);
    }

    #[test]
    fn elapsed_truncates_and_clamps() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 2, 30, 0).unwrap();
        let now_ms = now.timestamp_millis();

        assert_eq!(elapsed_secs(now_ms - 45_000, now), 45);
        assert_eq!(elapsed_secs(now_ms - 45_999, now), 45);
        assert_eq!(elapsed_secs(now_ms + 10_000, now), 0);
        assert_eq!(elapsed_secs(0, now), now_ms as u64 / 1000);
    }
}
