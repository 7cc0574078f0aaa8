//! Selective averaging of two redundant boom-mounted anemometers.
//!
//! Two anemometers at the same height read the same wind except when one of
//! them sits in the mast's shadow for the current wind direction. Selective
//! averaging merges the pair per sample: use the undisturbed sensor while the
//! other is shadowed, average both when neither is, and fall back to
//! whichever reading is present when one is absent.
//!
//! The decision procedure is a five-rule ordered guard chain, evaluated
//! independently per sample:
//!
//! 1. speed 1 absent → speed 2 (absent stays absent when both are),
//! 2. speed 2 absent → speed 1,
//! 3. direction in the other boom's shadow → surviving boom's speed,
//! 4. direction in this boom's shadow → other boom's speed,
//! 5. otherwise → arithmetic mean.
//!
//! Rules 3 and 4 are ordered by the seam dispatch from [`crate::sector`]: the
//! wrapping sector is always tested with the two-interval form, and the test
//! order within each branch reproduces the reference decision table.

use thiserror::Error;

use crate::sector::{classify_pair, Sector, SectorError, WrapCase};
use crate::types::TimeSeries;

/// Default angular width of the mast-shadow sector, degrees.
pub const DEFAULT_INFLOW_SPAN: f64 = 60.0;

#[derive(Debug, Error)]
pub enum SelectiveAvgError {
    #[error(
        "input lengths differ: speed1 has {speed1}, speed2 has {speed2}, direction has {direction}"
    )]
    LengthMismatch {
        speed1: usize,
        speed2: usize,
        direction: usize,
    },

    #[error("input series are not timestamp-aligned at position {position}")]
    TimestampMismatch { position: usize },

    #[error(transparent)]
    Sector(#[from] SectorError),
}

/// Merge two aligned speed sequences using a shared direction sequence.
///
/// All three slices must be equal-length and sample-aligned. Directions are
/// degrees in `[0, 360]` (360 is accepted and treated like 0 by the wrapped
/// sector test, never remapped). Absent speeds are `f64::NAN`.
pub fn selective_avg(
    speed1: &[f64],
    speed2: &[f64],
    direction: &[f64],
    boom_dir1: f64,
    boom_dir2: f64,
    inflow_span: f64,
) -> Result<Vec<f64>, SelectiveAvgError> {
    if speed1.len() != speed2.len() || speed1.len() != direction.len() {
        return Err(SelectiveAvgError::LengthMismatch {
            speed1: speed1.len(),
            speed2: speed2.len(),
            direction: direction.len(),
        });
    }

    let sector1 = Sector::for_boom(boom_dir1, inflow_span)?;
    let sector2 = Sector::for_boom(boom_dir2, inflow_span)?;
    let case = classify_pair(&sector1, &sector2).ok_or(SectorError::BothSectorsWrap {
        boom_dir1,
        boom_dir2,
        span: inflow_span,
    })?;

    let merged = speed1
        .iter()
        .zip(speed2.iter())
        .zip(direction.iter())
        .map(|((&spd1, &spd2), &dir)| merge_sample(spd1, spd2, dir, &sector1, &sector2, case))
        .collect();
    Ok(merged)
}

/// [`selective_avg`] over [`TimeSeries`] inputs, checking timestamp alignment.
pub fn selective_avg_series(
    speed1: &TimeSeries,
    speed2: &TimeSeries,
    direction: &TimeSeries,
    boom_dir1: f64,
    boom_dir2: f64,
    inflow_span: f64,
) -> Result<TimeSeries, SelectiveAvgError> {
    if speed1.len() != speed2.len() || speed1.len() != direction.len() {
        return Err(SelectiveAvgError::LengthMismatch {
            speed1: speed1.len(),
            speed2: speed2.len(),
            direction: direction.len(),
        });
    }
    for (i, s1) in speed1.samples.iter().enumerate() {
        if s1.timestamp != speed2.samples[i].timestamp
            || s1.timestamp != direction.samples[i].timestamp
        {
            return Err(SelectiveAvgError::TimestampMismatch { position: i });
        }
    }

    let spd1: Vec<f64> = speed1.values().collect();
    let spd2: Vec<f64> = speed2.values().collect();
    let dirs: Vec<f64> = direction.values().collect();
    let merged = selective_avg(&spd1, &spd2, &dirs, boom_dir1, boom_dir2, inflow_span)?;

    let timestamps: Vec<_> = speed1.timestamps().collect();
    Ok(TimeSeries::from_parts(
        format!("{}_{}_selavg", speed1.name, speed2.name),
        &timestamps,
        &merged,
    ))
}

/// One sample of the five-rule decision table.
///
/// Absent-value fallbacks always run first; the shadow tests run in the order
/// fixed by the seam dispatch, wrapped sector last in its branch.
fn merge_sample(
    spd1: f64,
    spd2: f64,
    dir: f64,
    sector1: &Sector,
    sector2: &Sector,
    case: WrapCase,
) -> f64 {
    if spd1.is_nan() {
        return spd2;
    }
    if spd2.is_nan() {
        return spd1;
    }
    match case {
        // Boom 1's sector needs the two-interval test: check boom 2's plain
        // sector first, then the wrapped one.
        WrapCase::Boom1Wraps => {
            if sector2.contains(dir) {
                spd1
            } else if sector1.contains(dir) {
                spd2
            } else {
                (spd1 + spd2) / 2.0
            }
        }
        WrapCase::Boom2Wraps => {
            if sector1.contains(dir) {
                spd2
            } else if sector2.contains(dir) {
                spd1
            } else {
                (spd1 + spd2) / 2.0
            }
        }
        WrapCase::Neither => {
            if sector1.contains(dir) {
                spd2
            } else if sector2.contains(dir) {
                spd1
            } else {
                (spd1 + spd2) / 2.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_value_fallback() {
        // Direction 135° is inside boom 1's shadow (boom at 315°), but the
        // absent check takes precedence.
        let out = selective_avg(
            &[f64::NAN, 1.0, f64::NAN],
            &[2.0, f64::NAN, f64::NAN],
            &[135.0, 135.0, 135.0],
            315.0,
            135.0,
            DEFAULT_INFLOW_SPAN,
        )
        .unwrap();
        assert_eq!(out[0], 2.0);
        assert_eq!(out[1], 1.0);
        assert!(out[2].is_nan());
    }

    #[test]
    fn test_shadowed_boom_excluded() {
        // Booms at 315°/135°: shadows [105,165] and [285,345].
        let out = selective_avg(
            &[1.0, 1.0, 1.0],
            &[2.0, 2.0, 2.0],
            &[135.0, 315.0, 0.0],
            315.0,
            135.0,
            DEFAULT_INFLOW_SPAN,
        )
        .unwrap();
        assert_eq!(out[0], 2.0); // boom 1 shadowed
        assert_eq!(out[1], 1.0); // boom 2 shadowed
        assert_eq!(out[2], 1.5); // neither
    }

    #[test]
    fn test_plain_average_commutes() {
        // Outside both shadows the merge is symmetric in the boom roles.
        let a = selective_avg(&[3.0], &[5.0], &[90.0], 315.0, 135.0, 60.0).unwrap();
        let b = selective_avg(&[5.0], &[3.0], &[90.0], 135.0, 315.0, 60.0).unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0], 4.0);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let err = selective_avg(&[1.0, 1.0], &[2.0], &[0.0], 315.0, 135.0, 60.0).unwrap_err();
        assert!(matches!(err, SelectiveAvgError::LengthMismatch { .. }));
    }

    #[test]
    fn test_both_wrapping_sectors_rejected() {
        // Span 200°: both shadows cover the seam regardless of bearing.
        let err = selective_avg(&[1.0], &[2.0], &[0.0], 90.0, 270.0, 200.0).unwrap_err();
        assert!(matches!(
            err,
            SelectiveAvgError::Sector(SectorError::BothSectorsWrap { .. })
        ));
    }
}
