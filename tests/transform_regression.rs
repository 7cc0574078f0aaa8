//! Transform Regression Tests
//!
//! End-to-end checks of the calibration transforms, period-averaging engine
//! and correlation preprocessor working together on realistic gapped series.
//! Expected calibration values are pinned to full double precision.

use chrono::{DateTime, Duration, TimeZone, Utc};
use mastwind::{
    adjust_slope_offset, adjust_slope_offset_value, average_by_period, average_with_coverage,
    offset_wind_direction_value, preprocess_for_correlation, scale_wind_speed, AggregationMethod,
    AverageOptions, CalibrationError, Period, Sample, TimeSeries,
};

const CURRENT_SLOPE: f64 = 0.045;
const CURRENT_OFFSET: f64 = 0.235;
const NEW_SLOPE: f64 = 0.046;
const NEW_OFFSET: f64 = 0.236;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap()
}

/// Surface the engine's warning diagnostics (resolution ambiguity, coverage
/// over 1) in test output. Safe to call from every test.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("mastwind=debug")
        .with_test_writer()
        .try_init();
}

/// Ten-minute series with the listed sample indexes missing entirely.
fn gapped_series(name: &str, count: usize, gaps: &[usize], value: f64) -> TimeSeries {
    let samples = (0..count)
        .filter(|i| !gaps.contains(i))
        .map(|i| Sample::new(base() + Duration::minutes(10 * i as i64), value))
        .collect();
    TimeSeries::new(name, samples)
}

#[test]
fn adjust_slope_offset_known_value() {
    let adjusted =
        adjust_slope_offset_value(8.0, CURRENT_SLOPE, CURRENT_OFFSET, NEW_SLOPE, NEW_OFFSET)
            .unwrap();
    assert_eq!(adjusted, 8.173555555555556);
}

#[test]
fn adjust_slope_offset_series_known_values() {
    let adjusted = adjust_slope_offset(
        &[2.0, 13.0, f64::NAN, 5.0, 8.0],
        CURRENT_SLOPE,
        CURRENT_OFFSET,
        NEW_SLOPE,
        NEW_OFFSET,
    )
    .unwrap();
    let expected = [
        2.0402222222222224,
        13.284666666666668,
        f64::NAN,
        5.106888888888888,
        8.173555555555556,
    ];
    for (i, (a, e)) in adjusted.iter().zip(expected.iter()).enumerate() {
        if e.is_nan() {
            assert!(a.is_nan(), "element {i}");
        } else {
            assert_eq!(a, e, "element {i}");
        }
    }
}

#[test]
fn adjust_slope_offset_names_bad_argument() {
    let err = adjust_slope_offset_value(8.0, CURRENT_SLOPE, CURRENT_OFFSET, f64::NAN, NEW_OFFSET)
        .unwrap_err();
    assert!(matches!(
        err,
        CalibrationError::NonFiniteParameter {
            name: "new_slope",
            ..
        }
    ));
    assert!(err.to_string().contains("new_slope"), "{err}");
}

#[test]
fn calibration_pipeline_scale_then_average() {
    // Scale a gapped ten-minute channel by 10%, then average hourly with a
    // full-coverage filter: only the complete hour survives.
    let raw = gapped_series("spd_80m", 12, &[8], 10.0);
    let values: Vec<f64> = raw.values().collect();
    let scaled_values = scale_wind_speed(&values, 1.1);
    let timestamps: Vec<_> = raw.timestamps().collect();
    let scaled = TimeSeries::from_parts("spd_80m_adj", &timestamps, &scaled_values);

    let options = AverageOptions {
        filter_by_coverage: true,
        coverage_threshold: 1.0,
        ..Default::default()
    };
    let hourly = average_by_period(&scaled, "1H".parse().unwrap(), &options).unwrap();
    assert_eq!(hourly.len(), 1);
    assert_eq!(hourly.samples[0].timestamp, base());
    assert!((hourly.samples[0].value - 11.0).abs() < 1e-12);
}

#[test]
fn coverage_accounting_over_a_gappy_day() {
    init_tracing();
    // 24 hours of ten-minute data with one missing hour and one half hour.
    let mut gaps: Vec<usize> = (36..42).collect(); // hour 6 entirely absent
    gaps.extend(60..63); // first half of hour 10
    let series = gapped_series("spd", 144, &gaps, 7.0);
    let out = average_with_coverage(
        &series,
        "1H".parse::<Period>().unwrap(),
        &AverageOptions::default(),
    )
    .unwrap();
    assert_eq!(out.averaged.len(), 24);
    assert_eq!(out.coverage.samples[6].value, 0.0);
    assert!(out.averaged.samples[6].value.is_nan());
    assert!((out.coverage.samples[10].value - 0.5).abs() < 1e-12);
    assert!((out.coverage.samples[0].value - 1.0).abs() < 1e-12);
}

#[test]
fn period_token_rejection_before_any_work() {
    assert!("1Y".parse::<Period>().is_err());
    assert!("biweekly".parse::<Period>().is_err());
    assert!("median".parse::<AggregationMethod>().is_err());
}

#[test]
fn preprocessor_produces_concurrent_hourly_pairs() {
    init_tracing();
    // Reference ten-minute, target hourly, requested daily averaging:
    // the reference gets averaged up to hourly before the final pass.
    let reference = gapped_series("ref", 288, &[], 5.0);
    let target = TimeSeries::new(
        "tgt",
        (0..48)
            .map(|i| Sample::new(base() + Duration::hours(i), 3.0))
            .collect(),
    );
    let (ref_out, tgt_out) = preprocess_for_correlation(
        &reference,
        &target,
        "1D".parse().unwrap(),
        1.0,
        AggregationMethod::Mean,
        AggregationMethod::Mean,
    )
    .unwrap();
    assert_eq!(ref_out.len(), 2);
    assert_eq!(tgt_out.len(), 2);
    let ref_labels: Vec<_> = ref_out.timestamps().collect();
    let tgt_labels: Vec<_> = tgt_out.timestamps().collect();
    assert_eq!(ref_labels, tgt_labels);
    assert!(ref_out.values().all(|v| (v - 5.0).abs() < 1e-12));
}

#[test]
fn direction_offset_round_trip_full_circle() {
    for d in 0..360 {
        let shifted = offset_wind_direction_value(d as f64, 123.0);
        let back = offset_wind_direction_value(shifted, -123.0);
        assert!((back - d as f64).abs() < 1e-9, "d={d} back={back}");
    }
}
