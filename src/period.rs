//! Aggregation period tokens and calendar-aware boundary alignment.
//!
//! Periods arrive as shorthand tokens ("10min", "1H", "1D", "1W", "1M",
//! "1AS"). Days and weeks are normalised to hour multiples at parse time
//! (1D → 24H, 1W → 168H); a bare month token means calendar-month-start
//! buckets. Bare year tokens are refused with guidance to use the
//! year-start form. Malformed tokens are rejected here, before any
//! aggregation work begins.

use chrono::{DateTime, Datelike, Duration, Months, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PeriodError {
    #[error("unrecognised averaging period '{0}': use e.g. '10min', '1H', '1D', '1W', '1M' or '1AS'")]
    Malformed(String),

    #[error("averaging period '{0}' has a zero count")]
    ZeroCount(String),

    #[error("'{0}' is not supported: use '1AS' for annual frequency anchored at the start of the year")]
    YearToken(String),

    #[error("unsupported aggregation method '{0}': use 'mean' or 'sum'")]
    UnsupportedMethod(String),

    #[error("resolution of {0} seconds cannot be expressed as an averaging period (whole minutes required)")]
    UnsupportedResolution(i64),
}

/// A parsed aggregation period.
///
/// Buckets are left-closed and labelled by their left edge, anchored at
/// calendar-unit starts (see [`Period::align_down`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    /// Fixed stride of whole minutes, anchored at the containing hour.
    Minutes(u32),
    /// Fixed stride of whole hours, anchored at the containing day.
    /// Day and week tokens normalise to this (24 and 168 hours per unit).
    Hours(u32),
    /// Calendar months, anchored at month starts.
    Months(u32),
    /// Calendar years, anchored at the start of the year.
    YearStart(u32),
}

impl Period {
    /// Fixed bucket width, `None` for calendar-sized periods (months/years).
    pub fn fixed_duration(&self) -> Option<Duration> {
        match *self {
            Period::Minutes(n) => Some(Duration::minutes(n as i64)),
            Period::Hours(n) => Some(Duration::hours(n as i64)),
            Period::Months(_) | Period::YearStart(_) => None,
        }
    }

    /// Round a timestamp down to the start of its anchoring calendar unit.
    ///
    /// Minute periods truncate to the hour; hour periods (including
    /// normalised days and weeks) truncate to the day; month periods to the
    /// month; year-start periods to the year.
    pub fn align_down(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let (y, m, d) = (ts.year(), ts.month(), ts.day());
        let aligned = match self {
            Period::Minutes(_) => Utc.with_ymd_and_hms(y, m, d, ts.hour(), 0, 0),
            Period::Hours(_) => Utc.with_ymd_and_hms(y, m, d, 0, 0, 0),
            Period::Months(_) => Utc.with_ymd_and_hms(y, m, 1, 0, 0, 0),
            Period::YearStart(_) => Utc.with_ymd_and_hms(y, 1, 1, 0, 0, 0),
        };
        // UTC has no DST gaps; calendar-unit starts always exist.
        aligned.single().unwrap_or(ts)
    }

    /// Left edge of the bucket following the one labelled `label`.
    pub fn advance(&self, label: DateTime<Utc>) -> DateTime<Utc> {
        match *self {
            Period::Minutes(n) => label + Duration::minutes(n as i64),
            Period::Hours(n) => label + Duration::hours(n as i64),
            Period::Months(n) => label + Months::new(n),
            Period::YearStart(n) => label + Months::new(12 * n),
        }
    }

    /// Express a detected native resolution as a period, for
    /// resolution-matching in the correlation preprocessor.
    pub fn from_resolution(resolution: Duration) -> Result<Period, PeriodError> {
        let secs = resolution.num_seconds();
        if secs <= 0 || secs % 60 != 0 || resolution.subsec_nanos() != 0 {
            return Err(PeriodError::UnsupportedResolution(secs));
        }
        let minutes = secs / 60;
        if minutes % 60 == 0 {
            Ok(Period::Hours((minutes / 60) as u32))
        } else {
            Ok(Period::Minutes(minutes as u32))
        }
    }
}

impl FromStr for Period {
    type Err = PeriodError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let trimmed = token.trim();
        let digits_end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (digits, suffix) = trimmed.split_at(digits_end);
        let count: u32 = if digits.is_empty() {
            1
        } else {
            digits
                .parse()
                .map_err(|_| PeriodError::Malformed(token.to_string()))?
        };
        if count == 0 {
            return Err(PeriodError::ZeroCount(token.to_string()));
        }

        match suffix {
            "min" => Ok(Period::Minutes(count)),
            "H" => Ok(Period::Hours(count)),
            "D" => Ok(Period::Hours(count * 24)),
            "W" => Ok(Period::Hours(count * 168)),
            "M" | "MS" => Ok(Period::Months(count)),
            "AS" => Ok(Period::YearStart(count)),
            "Y" | "A" => Err(PeriodError::YearToken(token.to_string())),
            _ => Err(PeriodError::Malformed(token.to_string())),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Period::Minutes(n) => write!(f, "{n}min"),
            Period::Hours(n) => write!(f, "{n}H"),
            Period::Months(n) => write!(f, "{n}MS"),
            Period::YearStart(n) => write!(f, "{n}AS"),
        }
    }
}
