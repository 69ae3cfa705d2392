//! Common Utilities
//!
//! Decibel conversions and sweep-range helpers used across the simulator.

/// Convert a dB value to linear scale
pub fn db_to_linear(db: f64) -> f64 {
    10.0_f64.powf(db / 10.0)
}

/// Convert a linear value to dB
pub fn linear_to_db(linear: f64) -> f64 {
    10.0 * linear.log10()
}

/// Build an inclusive sweep range `start..=stop` with the given step
///
/// Returns an empty vector when the step is non-positive or the range is
/// inverted. The stop value is included when it lands on the grid (with a
/// small slack against floating-point drift); values beyond it are not.
pub fn sweep_range(start: f64, stop: f64, step: f64) -> Vec<f64> {
    if step <= 0.0 || stop < start {
        return Vec::new();
    }
    let count = ((stop - start) / step + 1e-9).floor() as usize + 1;
    (0..count).map(|i| start + i as f64 * step).collect()
}
