//! Period averaging with data-coverage accounting.
//!
//! Resamples a series to a coarser period by partitioning it into
//! left-closed buckets labelled by their left edge, anchored at calendar-unit
//! starts (see [`Period::align_down`]). Every bucket between the first and
//! last sample is emitted, including empty ones, so gaps stay visible.
//!
//! Coverage is the ratio of present samples to expected samples per bucket,
//! where expected = bucket width ÷ native resolution. The final bucket's
//! expected count comes from its own (possibly partial) width, so a trailing
//! stub that is fully sampled to its end still scores 1.0. Coverage above 1
//! means resolution detection went wrong; it is surfaced as a warning, never
//! clamped.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

use crate::period::{Period, PeriodError};
use crate::resolution::{native_resolution, ResolutionError};
use crate::types::{Sample, TimeSeries};

#[derive(Debug, Error)]
pub enum AverageError {
    #[error("cannot average empty series '{0}'")]
    EmptySeries(String),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

/// How sample values are combined within a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregationMethod {
    /// Arithmetic average of the present samples; absent when none are.
    Mean,
    /// Total of the present samples; zero when none are.
    Sum,
}

impl FromStr for AggregationMethod {
    type Err = PeriodError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "mean" => Ok(AggregationMethod::Mean),
            "sum" => Ok(AggregationMethod::Sum),
            other => Err(PeriodError::UnsupportedMethod(other.to_string())),
        }
    }
}

impl fmt::Display for AggregationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregationMethod::Mean => write!(f, "mean"),
            AggregationMethod::Sum => write!(f, "sum"),
        }
    }
}

/// Options for [`average_by_period`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AverageOptions {
    pub method: AggregationMethod,
    /// Drop buckets whose coverage falls below `coverage_threshold` (rather
    /// than masking them with an absent marker).
    pub filter_by_coverage: bool,
    pub coverage_threshold: f64,
}

impl Default for AverageOptions {
    fn default() -> Self {
        AverageOptions {
            method: AggregationMethod::Mean,
            filter_by_coverage: false,
            coverage_threshold: 1.0,
        }
    }
}

/// Aggregate plus its per-bucket coverage channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodAverage {
    pub averaged: TimeSeries,
    /// Labelled `<name>_coverage` to stay distinct from the data channel.
    pub coverage: TimeSeries,
}

struct Bucket {
    label: DateTime<Utc>,
    next_label: DateTime<Utc>,
    present: usize,
    sum: f64,
}

impl Bucket {
    fn aggregate(&self, method: AggregationMethod) -> f64 {
        match method {
            AggregationMethod::Mean => {
                if self.present == 0 {
                    f64::NAN
                } else {
                    self.sum / self.present as f64
                }
            }
            AggregationMethod::Sum => self.sum,
        }
    }
}

/// Resample `series` to `period`, returning the aggregated series.
///
/// The input is sorted by timestamp first; it does not need to be. With
/// `filter_by_coverage` set, buckets below the coverage threshold are dropped
/// from the output entirely.
pub fn average_by_period(
    series: &TimeSeries,
    period: Period,
    options: &AverageOptions,
) -> Result<TimeSeries, AverageError> {
    Ok(average_with_coverage(series, period, options)?.averaged)
}

/// Like [`average_by_period`] but also returns the coverage channel.
pub fn average_with_coverage(
    series: &TimeSeries,
    period: Period,
    options: &AverageOptions,
) -> Result<PeriodAverage, AverageError> {
    if series.is_empty() {
        return Err(AverageError::EmptySeries(series.name.clone()));
    }
    let sorted = series.sorted();
    let resolution = native_resolution(&sorted)?;
    let res_ms = resolution.num_milliseconds() as f64;

    let buckets = partition(&sorted, period);
    let last_sample_ts = sorted.samples[sorted.len() - 1].timestamp;

    let mut averaged = Vec::with_capacity(buckets.len());
    let mut coverage = Vec::with_capacity(buckets.len());
    let last_idx = buckets.len() - 1;
    for (i, bucket) in buckets.iter().enumerate() {
        // The last bucket's expected width is its own span, not the full
        // period: the series may end partway through it.
        let width_ms = if i == last_idx {
            ((last_sample_ts - bucket.label) + resolution).num_milliseconds() as f64
        } else {
            (bucket.next_label - bucket.label).num_milliseconds() as f64
        };
        let expected = width_ms / res_ms;
        let ratio = if expected > 0.0 {
            bucket.present as f64 / expected
        } else {
            0.0
        };
        if ratio > 1.0 + 1e-9 {
            warn!(
                series = %series.name,
                bucket = %bucket.label,
                coverage = ratio,
                "coverage exceeds 1: native resolution was likely misdetected"
            );
        }
        averaged.push(Sample::new(bucket.label, bucket.aggregate(options.method)));
        coverage.push(Sample::new(bucket.label, ratio));
    }

    if options.filter_by_coverage {
        let keep: Vec<bool> = coverage
            .iter()
            .map(|c| c.value >= options.coverage_threshold)
            .collect();
        averaged = averaged
            .into_iter()
            .zip(keep.iter())
            .filter_map(|(s, &k)| k.then_some(s))
            .collect();
        coverage = coverage
            .into_iter()
            .zip(keep.iter())
            .filter_map(|(s, &k)| k.then_some(s))
            .collect();
    }

    Ok(PeriodAverage {
        averaged: TimeSeries::new(series.name.clone(), averaged),
        coverage: TimeSeries::new(format!("{}_coverage", series.name), coverage),
    })
}

/// Partition a sorted series into contiguous left-closed buckets.
///
/// Buckets run from the one containing the first sample to the one
/// containing the last; intermediate empty buckets are materialised so their
/// zero coverage shows up in the output. The calendar anchor only fixes the
/// bucket grid's phase; a series starting mid-grid must not grow leading
/// empty buckets back to the anchor.
fn partition(sorted: &TimeSeries, period: Period) -> Vec<Bucket> {
    let origin = period.align_down(sorted.samples[0].timestamp);
    let first_idx = bucket_index(origin, sorted.samples[0].timestamp, period);
    let last_ts = sorted.samples[sorted.len() - 1].timestamp;
    let last_idx = bucket_index(origin, last_ts, period);

    let mut label = origin;
    for _ in 0..first_idx {
        label = period.advance(label);
    }

    let mut buckets: Vec<Bucket> = Vec::with_capacity(last_idx - first_idx + 1);
    for _ in first_idx..=last_idx {
        let next_label = period.advance(label);
        buckets.push(Bucket {
            label,
            next_label,
            present: 0,
            sum: 0.0,
        });
        label = next_label;
    }

    for sample in &sorted.samples {
        let idx = bucket_index(origin, sample.timestamp, period) - first_idx;
        let bucket = &mut buckets[idx];
        if sample.is_present() {
            bucket.present += 1;
            bucket.sum += sample.value;
        }
    }
    buckets
}

/// Index of the bucket containing `ts`, for buckets striding from `origin`.
fn bucket_index(origin: DateTime<Utc>, ts: DateTime<Utc>, period: Period) -> usize {
    match period {
        Period::Minutes(_) | Period::Hours(_) => {
            let stride_ms = period
                .fixed_duration()
                .map(|d| d.num_milliseconds())
                .unwrap_or(1);
            ((ts - origin).num_milliseconds() / stride_ms) as usize
        }
        Period::Months(n) => {
            let months = months_between(origin, ts);
            (months / n as i64) as usize
        }
        Period::YearStart(n) => {
            let months = months_between(origin, ts);
            (months / (12 * n as i64)) as usize
        }
    }
}

/// Whole calendar months from `origin`'s month to `ts`'s month.
fn months_between(origin: DateTime<Utc>, ts: DateTime<Utc>) -> i64 {
    (ts.year() as i64 - origin.year() as i64) * 12 + (ts.month() as i64 - origin.month() as i64)
}
