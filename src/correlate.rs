//! Preprocessing of reference/target series pairs for correlation.
//!
//! Correlating a site mast against a long-term reference needs both series
//! concurrent, at the same resolution, and free of low-coverage buckets.
//! The pipeline here: drop absent samples, clip both series to their overlap
//! window, bring the finer-resolution series up to the coarser one's
//! resolution (no partial buckets tolerated at that intermediate step), then
//! average both at the requested period with the caller's coverage threshold
//! and keep only concurrent buckets.
//!
//! Wind direction cannot be averaged arithmetically across the north seam,
//! so the directional path decomposes speed/direction into orthogonal vector
//! components, runs each component through the scalar pipeline, and
//! recombines with `atan2`.

use thiserror::Error;
use tracing::debug;

use crate::angles::normalize_angle;
use crate::average::{average_by_period, average_with_coverage, AverageError, AverageOptions};
use crate::average::AggregationMethod;
use crate::period::{Period, PeriodError};
use crate::resolution::{native_resolution, overlap_start, OverlapError, ResolutionError};
use crate::types::{Sample, TimeSeries};

#[derive(Debug, Error)]
pub enum CorrelateError {
    #[error(transparent)]
    Overlap(#[from] OverlapError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Average(#[from] AverageError),

    #[error(transparent)]
    Period(#[from] PeriodError),
}

/// Produce concurrent, coverage-filtered reference/target aggregates.
///
/// Buckets below `coverage_threshold` are dropped from each side before the
/// concurrency restriction, so the output pair contains only buckets both
/// series cover well enough.
pub fn preprocess_for_correlation(
    reference: &TimeSeries,
    target: &TimeSeries,
    period: Period,
    coverage_threshold: f64,
    method_ref: AggregationMethod,
    method_target: AggregationMethod,
) -> Result<(TimeSeries, TimeSeries), CorrelateError> {
    let (ref_overlap, target_overlap) =
        resolution_matched(reference, target, period, method_ref, method_target)?;

    let filter = |method| AverageOptions {
        method,
        filter_by_coverage: true,
        coverage_threshold,
    };
    let ref_avg = average_by_period(&ref_overlap, period, &filter(method_ref))?;
    let target_avg = average_by_period(&target_overlap, period, &filter(method_target))?;

    let concurrent = ref_avg.common_timestamps(&target_avg);
    debug!(
        period = %period,
        concurrent_buckets = concurrent.len(),
        "correlation preprocessing complete"
    );
    Ok((
        ref_avg.restrict_to(&concurrent),
        target_avg.restrict_to(&concurrent),
    ))
}

/// Unfiltered aggregates plus the target's coverage channel.
///
/// Used when the caller wants to inspect coverage rather than filter on it:
/// nothing is dropped, and the target's coverage series rides along labelled
/// `<name>_coverage`.
pub fn preprocess_with_coverage(
    reference: &TimeSeries,
    target: &TimeSeries,
    period: Period,
    method_ref: AggregationMethod,
    method_target: AggregationMethod,
) -> Result<(TimeSeries, TimeSeries, TimeSeries), CorrelateError> {
    let (ref_overlap, target_overlap) =
        resolution_matched(reference, target, period, method_ref, method_target)?;

    let no_filter = |method| AverageOptions {
        method,
        filter_by_coverage: false,
        coverage_threshold: 0.0,
    };
    let ref_avg = average_by_period(&ref_overlap, period, &no_filter(method_ref))?;
    let target_out = average_with_coverage(&target_overlap, period, &no_filter(method_target))?;
    Ok((ref_avg, target_out.averaged, target_out.coverage))
}

/// Directional pipeline: coverage-filtered, period-averaged wind directions
/// for a reference/target pair, via vector decomposition.
///
/// Returns the averaged directions in `[0, 360)`, rounded to the nearest
/// degree as direction channels conventionally are.
pub fn preprocess_dir_for_correlation(
    ref_spd: &TimeSeries,
    ref_dir: &TimeSeries,
    target_spd: &TimeSeries,
    target_dir: &TimeSeries,
    period: Period,
    coverage_threshold: f64,
) -> Result<(TimeSeries, TimeSeries), CorrelateError> {
    let (ref_north, ref_east) = wind_vector(ref_spd, ref_dir);
    let (target_north, target_east) = wind_vector(target_spd, target_dir);

    let (ref_north_avg, target_north_avg) = preprocess_for_correlation(
        &ref_north,
        &target_north,
        period,
        coverage_threshold,
        AggregationMethod::Mean,
        AggregationMethod::Mean,
    )?;
    let (ref_east_avg, target_east_avg) = preprocess_for_correlation(
        &ref_east,
        &target_east,
        period,
        coverage_threshold,
        AggregationMethod::Mean,
        AggregationMethod::Mean,
    )?;

    let ref_out = recombine_direction(&ref_north_avg, &ref_east_avg, &ref_dir.name);
    let target_out = recombine_direction(&target_north_avg, &target_east_avg, &target_dir.name);
    Ok((ref_out, target_out))
}

/// North/east components of the wind vector over the timestamps where both
/// speed and direction are present. Directions are degrees.
pub fn wind_vector(spd: &TimeSeries, dir: &TimeSeries) -> (TimeSeries, TimeSeries) {
    let spd_clean = spd.sorted().dropna();
    let dir_clean = dir.sorted().dropna();
    let common = spd_clean.common_timestamps(&dir_clean);
    let spd_common = spd_clean.restrict_to(&common);
    let dir_common = dir_clean.restrict_to(&common);

    let mut north = Vec::with_capacity(common.len());
    let mut east = Vec::with_capacity(common.len());
    for (s, d) in spd_common.samples.iter().zip(dir_common.samples.iter()) {
        let rad = d.value.to_radians();
        north.push(Sample::new(s.timestamp, s.value * rad.cos()));
        east.push(Sample::new(s.timestamp, s.value * rad.sin()));
    }
    (
        TimeSeries::new(format!("{}_N", spd.name), north),
        TimeSeries::new(format!("{}_E", spd.name), east),
    )
}

/// `atan2` the averaged components back into a direction series.
fn recombine_direction(north: &TimeSeries, east: &TimeSeries, name: &str) -> TimeSeries {
    // Component pipelines filter independently; only buckets surviving both
    // can be recombined.
    let common = north.common_timestamps(east);
    let north = north.restrict_to(&common);
    let east = east.restrict_to(&common);

    let samples = north
        .samples
        .iter()
        .zip(east.samples.iter())
        .map(|(n, e)| {
            let deg = normalize_angle(e.value.atan2(n.value).to_degrees());
            // Half-degree ties round to even, matching numpy's rounding.
            Sample::new(n.timestamp, deg.round_ties_even())
        })
        .collect();
    TimeSeries::new(name.to_string(), samples)
}

/// Clip to the overlap window and equalise resolutions ahead of averaging.
///
/// When neither series' native resolution already matches the requested
/// period, the finer series is averaged up to the coarser one's resolution
/// (coverage-filtered at 1.0) and both are restricted to their common
/// timestamps.
fn resolution_matched(
    reference: &TimeSeries,
    target: &TimeSeries,
    period: Period,
    method_ref: AggregationMethod,
    method_target: AggregationMethod,
) -> Result<(TimeSeries, TimeSeries), CorrelateError> {
    let ref_clean = reference.sorted().dropna();
    let target_clean = target.sorted().dropna();

    let start = period.align_down(overlap_start(&ref_clean, &target_clean)?);
    let mut ref_overlap = ref_clean.slice_from(start);
    let mut target_overlap = target_clean.slice_from(start);

    let ref_res = native_resolution(&ref_overlap)?;
    let target_res = native_resolution(&target_overlap)?;
    let matches_period = |res| period.fixed_duration() == Some(res);

    if !matches_period(ref_res) && !matches_period(target_res) {
        let strict = |method| AverageOptions {
            method,
            filter_by_coverage: true,
            coverage_threshold: 1.0,
        };
        if ref_res > target_res {
            debug!(
                reference = %reference.name, target = %target.name,
                "target is finer than reference: averaging target up to reference resolution"
            );
            target_overlap = average_by_period(
                &target_overlap,
                Period::from_resolution(ref_res)?,
                &strict(method_target),
            )?;
        } else if ref_res < target_res {
            debug!(
                reference = %reference.name, target = %target.name,
                "reference is finer than target: averaging reference up to target resolution"
            );
            ref_overlap = average_by_period(
                &ref_overlap,
                Period::from_resolution(target_res)?,
                &strict(method_ref),
            )?;
        }
        let common = ref_overlap.common_timestamps(&target_overlap);
        ref_overlap = ref_overlap.restrict_to(&common);
        target_overlap = target_overlap.restrict_to(&common);
    }
    Ok((ref_overlap, target_overlap))
}
