//! Linear calibration transforms for speed and direction channels.
//!
//! Loggers apply a slope/offset pair to the raw anemometer counts before
//! writing the record. When the calibration sheet is revised after the fact,
//! [`adjust_slope_offset`] recomputes the logged speed under the new pair by
//! equating the old and new `y = m·x + c` around the raw count:
//!
//! ```text
//!     y2 = m2 · (y1 - c1) / m1 + c2
//! ```
//!
//! Every calibration parameter is validated individually so a failure names
//! exactly the argument at fault, not a generic error. Absent readings (NAN
//! elements of a series) pass through untouched; they are data gaps, not
//! invalid parameters.

use thiserror::Error;

use crate::angles::normalize_angle;

#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("argument '{name}' is not a finite number: {value}")]
    NonFiniteParameter { name: &'static str, value: f64 },

    #[error("argument 'current_slope' is zero: cannot invert the original calibration")]
    ZeroSlope,

    #[error("wspd argument is not a finite number: {0}")]
    NonFiniteValue(f64),
}

fn check_parameter(name: &'static str, value: f64) -> Result<(), CalibrationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CalibrationError::NonFiniteParameter { name, value })
    }
}

fn check_calibration_pairs(
    current_slope: f64,
    current_offset: f64,
    new_slope: f64,
    new_offset: f64,
) -> Result<(), CalibrationError> {
    check_parameter("current_slope", current_slope)?;
    check_parameter("current_offset", current_offset)?;
    check_parameter("new_slope", new_slope)?;
    check_parameter("new_offset", new_offset)?;
    if current_slope == 0.0 {
        return Err(CalibrationError::ZeroSlope);
    }
    Ok(())
}

/// Recompute calibrated wind speeds under a revised slope/offset pair.
///
/// Absent readings (NAN) propagate unchanged; infinite elements cannot occur
/// in logged data and are left to propagate arithmetically.
pub fn adjust_slope_offset(
    wspd: &[f64],
    current_slope: f64,
    current_offset: f64,
    new_slope: f64,
    new_offset: f64,
) -> Result<Vec<f64>, CalibrationError> {
    check_calibration_pairs(current_slope, current_offset, new_slope, new_offset)?;
    Ok(wspd
        .iter()
        .map(|&v| new_slope * ((v - current_offset) / current_slope) + new_offset)
        .collect())
}

/// Single-value boundary case of [`adjust_slope_offset`].
///
/// Unlike the series form, a non-finite scalar here is a caller error, not a
/// data gap, and is rejected.
pub fn adjust_slope_offset_value(
    wspd: f64,
    current_slope: f64,
    current_offset: f64,
    new_slope: f64,
    new_offset: f64,
) -> Result<f64, CalibrationError> {
    check_calibration_pairs(current_slope, current_offset, new_slope, new_offset)?;
    if !wspd.is_finite() {
        return Err(CalibrationError::NonFiniteValue(wspd));
    }
    Ok(new_slope * ((wspd - current_offset) / current_slope) + new_offset)
}

/// Scale wind speeds by a pure multiplicative factor.
///
/// `scale_factor` multiplies directly: 1.1 raises speeds by 10%, 0.8 lowers
/// them by 20%. (It is not a percentage offset.)
pub fn scale_wind_speed(wspd: &[f64], scale_factor: f64) -> Vec<f64> {
    wspd.iter().map(|&v| v * scale_factor).collect()
}

/// Single-value form of [`scale_wind_speed`].
pub fn scale_wind_speed_value(wspd: f64, scale_factor: f64) -> f64 {
    wspd * scale_factor
}

/// Add an offset to wind directions, renormalising into `[0, 360)`.
///
/// Absent readings (NAN) propagate unchanged.
pub fn offset_wind_direction(wdir: &[f64], offset: f64) -> Vec<f64> {
    wdir.iter()
        .map(|&d| {
            if d.is_nan() {
                d
            } else {
                normalize_angle(d + offset)
            }
        })
        .collect()
}

/// Single-value form of [`offset_wind_direction`].
pub fn offset_wind_direction_value(wdir: f64, offset: f64) -> f64 {
    normalize_angle(wdir + offset)
}
