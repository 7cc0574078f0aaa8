//! Mast-shadow sector geometry.
//!
//! A boom holds its anemometer at a fixed compass bearing on the mast. Wind
//! arriving from the *opposite* side of the mast passes through the structure
//! before reaching the sensor, so each boom has an angular "shadow" sector of
//! inflow directions whose readings are disturbed:
//!
//! ```text
//!     lower = (bearing - span/2 + 180) mod 360
//!     upper = (bearing + span/2 + 180) mod 360
//! ```
//!
//! Sectors near north straddle the 0°/360° seam; the membership test then
//! splits into two closed sub-intervals `[lower, 360]` and `[0, upper]`.
//! Getting the wraparound classification wrong silently corrupts every sample
//! near the seam, so the classification is computed once per boom at
//! construction and the pair dispatch is an explicit tagged variant.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::angles::normalize_angle;

#[derive(Debug, Error)]
pub enum SectorError {
    #[error("inflow span {0}° is out of range: must be greater than 0° and less than 360°")]
    InvalidSpan(f64),

    #[error(
        "both mast-shadow sectors straddle the 0°/360° seam (booms {boom_dir1}°/{boom_dir2}°, \
         span {span}°): selective averaging is undefined for this geometry"
    )]
    BothSectorsWrap {
        boom_dir1: f64,
        boom_dir2: f64,
        span: f64,
    },
}

/// Angular inflow range disturbed by the mast for one boom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sector {
    /// Lower bound in degrees, in `[0, 360)`.
    pub lower: f64,
    /// Upper bound in degrees, in `[0, 360)`.
    pub upper: f64,
    wraps: bool,
}

impl Sector {
    /// Shadow sector for a boom mounted at `boom_dir` with the given angular
    /// span. The sector sits on the far side of the mast from the boom.
    pub fn for_boom(boom_dir: f64, span: f64) -> Result<Sector, SectorError> {
        if !(span > 0.0 && span < 360.0) {
            return Err(SectorError::InvalidSpan(span));
        }
        let lower = normalize_angle(boom_dir - span / 2.0 + 180.0);
        let upper = normalize_angle(boom_dir + span / 2.0 + 180.0);
        let centre = normalize_angle(boom_dir + 180.0);
        let wraps = centre >= 360.0 - span / 2.0 || centre <= span / 2.0;
        Ok(Sector { lower, upper, wraps })
    }

    /// True when the sector straddles the 0°/360° seam.
    pub fn wraps_zero(&self) -> bool {
        self.wraps
    }

    /// Closed-interval membership test, seam-aware.
    ///
    /// Directions are accepted in `[0, 360]`; 360° is deliberately not
    /// remapped and lands in the `[lower, 360]` arm of a wrapping sector.
    pub fn contains(&self, direction: f64) -> bool {
        if self.wraps {
            (direction >= self.lower && direction <= 360.0)
                || (direction >= 0.0 && direction <= self.upper)
        } else {
            direction >= self.lower && direction <= self.upper
        }
    }
}

/// Which of a boom pair's shadow sectors straddles the 0°/360° seam.
///
/// Drives the rule ordering in the selective-averaging engine: the wrapping
/// sector must be tested with the two-interval form, the other with the plain
/// closed-interval form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WrapCase {
    Neither,
    Boom1Wraps,
    Boom2Wraps,
}

/// Classify a boom pair's sectors, rejecting the geometry where both wrap.
///
/// Both sectors can only wrap simultaneously for spans of 180° or more; that
/// configuration has no well-defined rule ordering and is refused outright.
pub fn classify_pair(sector1: &Sector, sector2: &Sector) -> Option<WrapCase> {
    match (sector1.wraps_zero(), sector2.wraps_zero()) {
        (true, true) => None,
        (true, false) => Some(WrapCase::Boom1Wraps),
        (false, true) => Some(WrapCase::Boom2Wraps),
        (false, false) => Some(WrapCase::Neither),
    }
}
