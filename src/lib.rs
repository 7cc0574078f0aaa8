//! Mastwind: met-mast wind data aggregation engine.
//!
//! Turns irregular or gapped anemometer/wind-vane streams into
//! analysis-ready aggregates:
//!
//! - **Period averaging with coverage accounting**: resample a series to a
//!   coarser period, track what fraction of expected samples each bucket
//!   actually holds, and optionally drop poorly covered buckets.
//! - **Selective averaging**: merge two redundant boom-mounted anemometers
//!   per sample, excluding whichever sensor the mast currently shadows.
//! - **Calibration transforms**: recompute speeds under a revised linear
//!   slope/offset, scale speeds, offset directions.
//! - **Correlation preprocessing**: produce concurrent, coverage-filtered
//!   reference/target pairs, with a vector-decomposition path for
//!   directional channels.
//!
//! All inputs and outputs are in-memory [`TimeSeries`] values; the crate
//! does no I/O and keeps no state between calls.

pub mod angles;
pub mod average;
pub mod calibrate;
pub mod correlate;
pub mod period;
pub mod resolution;
pub mod sector;
pub mod selective;
pub mod types;

// Re-export the core value types
pub use types::{Sample, TimeSeries};

// Re-export the aggregation engine
pub use average::{
    average_by_period, average_with_coverage, AggregationMethod, AverageError, AverageOptions,
    PeriodAverage,
};
pub use period::{Period, PeriodError};
pub use resolution::{native_resolution, overlap_start, OverlapError, ResolutionError};

// Re-export the selective-averaging engine
pub use sector::{Sector, SectorError, WrapCase};
pub use selective::{selective_avg, selective_avg_series, SelectiveAvgError, DEFAULT_INFLOW_SPAN};

// Re-export calibration transforms
pub use calibrate::{
    adjust_slope_offset, adjust_slope_offset_value, offset_wind_direction,
    offset_wind_direction_value, scale_wind_speed, scale_wind_speed_value, CalibrationError,
};

// Re-export correlation preprocessing
pub use correlate::{
    preprocess_dir_for_correlation, preprocess_for_correlation, preprocess_with_coverage,
    CorrelateError,
};
