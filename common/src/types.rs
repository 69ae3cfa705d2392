//! Common Types for the Link Simulator
//!
//! Defines the result types shared between the simulation library and the
//! binary that serializes them.

use serde::{Deserialize, Serialize};

/// BER measurement at a single Eb/N0 sweep point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BerPoint {
    /// Eb/N0 value in dB
    pub ebno_db: f64,
    /// Measured bit error rate
    pub ber: f64,
    /// Cumulative bit errors at this point
    pub errors: u64,
    /// Cumulative bits compared at this point
    pub total_bits: u64,
}

impl BerPoint {
    /// Create a new sweep-point result
    pub fn new(ebno_db: f64, errors: u64, total_bits: u64) -> Self {
        let ber = if total_bits == 0 {
            0.0
        } else {
            errors as f64 / total_bits as f64
        };
        Self {
            ebno_db,
            ber,
            errors,
            total_bits,
        }
    }
}

/// Complete Eb/N0 sweep result as two named, equal-length sequences
///
/// The wire field names are "ebno_dB" and "ber", the names downstream
/// plotting tools look up.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SweepResults {
    /// Swept Eb/N0 values in dB
    #[serde(rename = "ebno_dB")]
    pub ebno_db: Vec<f64>,
    /// BER estimate per Eb/N0 value
    pub ber: Vec<f64>,
}

impl SweepResults {
    /// Collect per-point results into the named-sequence form
    pub fn from_points(points: &[BerPoint]) -> Self {
        Self {
            ebno_db: points.iter().map(|p| p.ebno_db).collect(),
            ber: points.iter().map(|p| p.ber).collect(),
        }
    }

    /// Number of sweep points
    pub fn len(&self) -> usize {
        self.ebno_db.len()
    }

    /// True when no sweep points are present
    pub fn is_empty(&self) -> bool {
        self.ebno_db.is_empty()
    }
}
