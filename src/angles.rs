//! Circular arithmetic helpers for compass bearings.

/// Fold an angle into `[0, 360)` degrees.
///
/// Handles negative inputs (`-10` → `350`) and inputs past a full turn
/// (`370` → `10`).
pub fn normalize_angle(angle: f64) -> f64 {
    let folded = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if folded >= 360.0 {
        0.0
    } else {
        folded
    }
}
