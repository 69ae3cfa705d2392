//! YAML Configuration for the Link Simulator
//!
//! Every simulation parameter is a named, defaulted field, so a config file
//! only needs to state what differs from the reference scenario (128
//! subcarriers, 16-sample CP, 2x2 antennas, 100000 frames in batches of
//! 1000, Eb/N0 0..=15 dB, 4-tap exponential profile).

use link::{LinkConfig, PowerDelayProfile};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Simulator configuration as read from the YAML file
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimConfig {
    /// Subcarriers per OFDM frame
    pub num_subcarriers: usize,
    /// Cyclic prefix length in samples
    pub cyclic_prefix_len: usize,
    /// Total OFDM frames per sweep point
    pub num_ofdm_frames: usize,
    /// Frames per processing batch
    pub batch_size: usize,
    /// Transmit antennas
    pub num_tx_antennas: usize,
    /// Receive antennas
    pub num_rx_antennas: usize,
    /// Eb/N0 sweep in dB
    pub ebno_db: EbnoRange,
    /// Multipath tap delays in samples
    pub tap_delays: Vec<usize>,
    /// Multipath tap powers in dB
    pub tap_powers_db: Vec<f64>,
    /// Normalized Doppler rate of the fading
    pub normalized_doppler: f64,
    /// RNG seed; omit for a randomized run
    pub seed: Option<u64>,
    /// Result file path
    pub output_path: String,
}

/// Inclusive Eb/N0 sweep range in dB
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EbnoRange {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            num_subcarriers: 128,
            cyclic_prefix_len: 16,
            num_ofdm_frames: 100_000,
            batch_size: 1000,
            num_tx_antennas: 2,
            num_rx_antennas: 2,
            ebno_db: EbnoRange {
                start: 0.0,
                stop: 15.0,
                step: 1.0,
            },
            tap_delays: vec![0, 1, 2, 3],
            tap_powers_db: vec![0.0, -3.0, -6.0, -9.0],
            normalized_doppler: 1e-6,
            seed: None,
            output_path: "mimo_ofdm_tdl.json".to_string(),
        }
    }
}

impl SimConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: SimConfig = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Convert into the validated link-layer configuration
    pub fn to_link_config(&self) -> anyhow::Result<LinkConfig> {
        let profile = PowerDelayProfile::new(&self.tap_delays, &self.tap_powers_db)?;
        let ebno_db = common::sweep_range(self.ebno_db.start, self.ebno_db.stop, self.ebno_db.step);

        Ok(LinkConfig {
            num_subcarriers: self.num_subcarriers,
            cp_len: self.cyclic_prefix_len,
            num_ofdm_frames: self.num_ofdm_frames,
            batch_size: self.batch_size,
            num_tx_antennas: self.num_tx_antennas,
            num_rx_antennas: self.num_rx_antennas,
            ebno_db,
            profile,
            norm_doppler: self.normalized_doppler,
        })
    }
}
