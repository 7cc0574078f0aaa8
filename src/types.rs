//! Core value types shared across the aggregation engine.
//!
//! Everything in this crate operates on [`TimeSeries`]: a named, ordered
//! sequence of `(timestamp, value)` samples. Absent readings are carried as
//! `f64::NAN` rather than dropped, so gap accounting (coverage) can tell the
//! difference between "no row logged" and "row logged, sensor dead".
//!
//! All operations are pure transforms: they borrow the input and return a new
//! series. Nothing here mutates in place or persists across calls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One timestamped sensor reading. `value` is `NAN` for an absent reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Sample { timestamp, value }
    }

    /// True when the reading is present (not the NAN absent marker).
    pub fn is_present(&self) -> bool {
        !self.value.is_nan()
    }
}

/// A named, timestamp-ordered series of sensor readings.
///
/// Timestamps are expected to be unique; they need not be evenly spaced.
/// The native sampling interval is recovered from the data itself, see
/// [`crate::resolution::native_resolution`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Channel label, carried through transforms. Derived outputs append a
    /// suffix (e.g. `_coverage`) so multi-channel results stay tell-apart.
    pub name: String,
    pub samples: Vec<Sample>,
}

impl TimeSeries {
    pub fn new(name: impl Into<String>, samples: Vec<Sample>) -> Self {
        TimeSeries {
            name: name.into(),
            samples,
        }
    }

    /// Build a series from parallel timestamp/value slices.
    pub fn from_parts(
        name: impl Into<String>,
        timestamps: &[DateTime<Utc>],
        values: &[f64],
    ) -> Self {
        let samples = timestamps
            .iter()
            .zip(values.iter())
            .map(|(&t, &v)| Sample::new(t, v))
            .collect();
        TimeSeries::new(name, samples)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// First timestamp of the series, `None` when empty.
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.samples.iter().map(|s| s.timestamp).min()
    }

    /// Last timestamp of the series, `None` when empty.
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.samples.iter().map(|s| s.timestamp).max()
    }

    pub fn timestamps(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        self.samples.iter().map(|s| s.timestamp)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.value)
    }

    /// Copy of the series ordered by timestamp (stable for duplicates).
    pub fn sorted(&self) -> TimeSeries {
        let mut samples = self.samples.clone();
        samples.sort_by_key(|s| s.timestamp);
        TimeSeries::new(self.name.clone(), samples)
    }

    /// Copy of the series with absent (NAN) readings removed.
    pub fn dropna(&self) -> TimeSeries {
        let samples = self
            .samples
            .iter()
            .copied()
            .filter(Sample::is_present)
            .collect();
        TimeSeries::new(self.name.clone(), samples)
    }

    /// Samples at or after `start`, preserving order.
    pub fn slice_from(&self, start: DateTime<Utc>) -> TimeSeries {
        let samples = self
            .samples
            .iter()
            .copied()
            .filter(|s| s.timestamp >= start)
            .collect();
        TimeSeries::new(self.name.clone(), samples)
    }

    /// Timestamps present in both series, in this series' order.
    pub fn common_timestamps(&self, other: &TimeSeries) -> Vec<DateTime<Utc>> {
        let theirs: HashSet<DateTime<Utc>> = other.timestamps().collect();
        self.timestamps().filter(|t| theirs.contains(t)).collect()
    }

    /// Samples whose timestamps appear in `keep`, preserving order.
    pub fn restrict_to(&self, keep: &[DateTime<Utc>]) -> TimeSeries {
        let keep: HashSet<DateTime<Utc>> = keep.iter().copied().collect();
        let samples = self
            .samples
            .iter()
            .copied()
            .filter(|s| keep.contains(&s.timestamp))
            .collect();
        TimeSeries::new(self.name.clone(), samples)
    }

    /// Same samples under a different channel label.
    pub fn with_name(&self, name: impl Into<String>) -> TimeSeries {
        TimeSeries::new(name, self.samples.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 6, 1, 0, minute, 0).unwrap()
    }

    #[test]
    fn test_sorted_orders_by_timestamp() {
        let series = TimeSeries::new(
            "spd",
            vec![
                Sample::new(ts(20), 3.0),
                Sample::new(ts(0), 1.0),
                Sample::new(ts(10), 2.0),
            ],
        );
        let sorted = series.sorted();
        let values: Vec<f64> = sorted.values().collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
        assert_eq!(sorted.start(), Some(ts(0)));
        assert_eq!(sorted.end(), Some(ts(20)));
    }

    #[test]
    fn test_dropna_removes_absent_readings() {
        let series = TimeSeries::new(
            "spd",
            vec![
                Sample::new(ts(0), 1.0),
                Sample::new(ts(10), f64::NAN),
                Sample::new(ts(20), 3.0),
            ],
        );
        let clean = series.dropna();
        assert_eq!(clean.len(), 2);
        assert!(clean.values().all(|v| !v.is_nan()));
    }

    #[test]
    fn test_series_survives_json_round_trip() {
        let series = TimeSeries::new(
            "spd_80m",
            vec![Sample::new(ts(0), 1.5), Sample::new(ts(10), 2.5)],
        );
        let json = serde_json::to_string(&series).unwrap();
        let back: TimeSeries = serde_json::from_str(&json).unwrap();
        assert_eq!(back, series);
    }

    #[test]
    fn test_common_timestamps_and_restrict() {
        let a = TimeSeries::new(
            "a",
            vec![Sample::new(ts(0), 1.0), Sample::new(ts(10), 2.0)],
        );
        let b = TimeSeries::new(
            "b",
            vec![Sample::new(ts(10), 5.0), Sample::new(ts(20), 6.0)],
        );
        let common = a.common_timestamps(&b);
        assert_eq!(common, vec![ts(10)]);
        let restricted = b.restrict_to(&common);
        assert_eq!(restricted.len(), 1);
        assert_eq!(restricted.samples[0].value, 5.0);
    }
}
