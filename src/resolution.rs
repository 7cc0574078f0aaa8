//! Native resolution detection and temporal overlap resolution.
//!
//! Logged sensor streams carry no declared sample rate; it has to be
//! recovered from the timestamps. The native resolution is the *mode* of the
//! consecutive-timestamp gaps, never the minimum: an isolated short gap (a
//! duplicated or late-arriving row) must not be mistaken for the base rate.
//! When the mode and the minimum disagree the detection is ambiguous and a
//! warning diagnostic is emitted, but the computation continues.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

use crate::types::TimeSeries;

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("cannot detect resolution of '{name}': need at least 2 samples, have {len}")]
    InsufficientSamples { name: String, len: usize },
}

#[derive(Debug, Error)]
pub enum OverlapError {
    #[error("series '{0}' is empty, no overlap window exists")]
    EmptySeries(String),

    #[error(
        "no overlapping data between '{name1}' ({start1} to {end1}) and '{name2}' ({start2} to {end2})"
    )]
    NoOverlap {
        name1: String,
        start1: DateTime<Utc>,
        end1: DateTime<Utc>,
        name2: String,
        start2: DateTime<Utc>,
        end2: DateTime<Utc>,
    },
}

/// Most frequent gap between consecutive timestamps of a sorted series.
///
/// Ties on frequency resolve to the shortest gap. Emits a warning diagnostic
/// when the modal gap differs from the minimum gap (resolution detection may
/// be off; coverage ratios computed from it can exceed 1).
pub fn native_resolution(series: &TimeSeries) -> Result<Duration, ResolutionError> {
    if series.len() < 2 {
        return Err(ResolutionError::InsufficientSamples {
            name: series.name.clone(),
            len: series.len(),
        });
    }

    let timestamps: Vec<DateTime<Utc>> = series.timestamps().collect();
    let mut gap_counts: BTreeMap<i64, usize> = BTreeMap::new();
    for pair in timestamps.windows(2) {
        let gap_ms = (pair[1] - pair[0]).num_milliseconds();
        *gap_counts.entry(gap_ms).or_insert(0) += 1;
    }

    // Highest count wins; a frequency tie resolves to the shorter gap.
    let (&mode_ms, _) = gap_counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
        .unwrap_or((&0, &0));
    let &min_ms = gap_counts.keys().next().unwrap_or(&0);

    if min_ms != mode_ms {
        warn!(
            series = %series.name,
            mode_gap_s = mode_ms as f64 / 1000.0,
            min_gap_s = min_ms as f64 / 1000.0,
            "resolution detection ambiguous: most frequent gap differs from minimum gap, \
             using most frequent gap as resolution"
        );
    }

    Ok(Duration::milliseconds(mode_ms))
}

/// Start of the temporal overlap window between two series.
///
/// Returns `max(start1, start2)`; fails when the two timestamp ranges do not
/// intersect at all, reporting both ranges for diagnosis.
pub fn overlap_start(
    series1: &TimeSeries,
    series2: &TimeSeries,
) -> Result<DateTime<Utc>, OverlapError> {
    let (start1, end1) = match (series1.start(), series1.end()) {
        (Some(s), Some(e)) => (s, e),
        _ => return Err(OverlapError::EmptySeries(series1.name.clone())),
    };
    let (start2, end2) = match (series2.start(), series2.end()) {
        (Some(s), Some(e)) => (s, e),
        _ => return Err(OverlapError::EmptySeries(series2.name.clone())),
    };

    if end1 < start2 || start1 > end2 {
        return Err(OverlapError::NoOverlap {
            name1: series1.name.clone(),
            start1,
            end1,
            name2: series2.name.clone(),
            start2,
            end2,
        });
    }
    Ok(start1.max(start2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sample;
    use chrono::TimeZone;

    fn series_at_minutes(name: &str, minutes: &[i64]) -> TimeSeries {
        let base = Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();
        let samples = minutes
            .iter()
            .map(|&m| Sample::new(base + Duration::minutes(m), 1.0))
            .collect();
        TimeSeries::new(name, samples)
    }

    #[test]
    fn test_resolution_is_modal_gap() {
        // Gaps: 10, 10, 10, 30 minutes — mode 10.
        let series = series_at_minutes("spd", &[0, 10, 20, 30, 60]);
        assert_eq!(
            native_resolution(&series).unwrap(),
            Duration::minutes(10)
        );
    }

    #[test]
    fn test_resolution_not_fooled_by_short_gap() {
        // One spurious 1-minute gap among 10-minute sampling: the minimum
        // must not win.
        let series = series_at_minutes("spd", &[0, 10, 11, 21, 31, 41]);
        assert_eq!(
            native_resolution(&series).unwrap(),
            Duration::minutes(10)
        );
    }

    #[test]
    fn test_resolution_tie_prefers_shortest() {
        // Gaps 10 and 20 each appear twice.
        let series = series_at_minutes("spd", &[0, 10, 30, 40, 60]);
        assert_eq!(
            native_resolution(&series).unwrap(),
            Duration::minutes(10)
        );
    }

    #[test]
    fn test_resolution_needs_two_samples() {
        let series = series_at_minutes("spd", &[0]);
        assert!(matches!(
            native_resolution(&series),
            Err(ResolutionError::InsufficientSamples { .. })
        ));
    }

    #[test]
    fn test_overlap_start_is_latest_start() {
        let a = series_at_minutes("a", &[0, 10, 20, 30]);
        let b = series_at_minutes("b", &[20, 30, 40]);
        let start = overlap_start(&a, &b).unwrap();
        assert_eq!(
            start,
            Utc.with_ymd_and_hms(2023, 6, 1, 0, 20, 0).unwrap()
        );
    }

    #[test]
    fn test_disjoint_ranges_rejected() {
        let a = series_at_minutes("a", &[0, 10]);
        let b = series_at_minutes("b", &[60, 70]);
        let err = overlap_start(&a, &b).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("no overlapping data"), "{msg}");
        assert!(msg.contains("'a'") && msg.contains("'b'"), "{msg}");
    }
}
