//! MIMO-OFDM Link Simulation Library
//!
//! This crate implements the baseband link chain used for BER estimation:
//! BPSK modulation, OFDM with cyclic prefix, a tapped-delay-line fading
//! channel with AWGN, per-subcarrier channel estimation and zero-forcing
//! MIMO equalization, driven by an Eb/N0 sweep.

pub mod ber;
pub mod channel;
pub mod driver;
pub mod equalizer;
pub mod estimator;
pub mod modulation;
pub mod ofdm;

// Re-export commonly used types
pub use ber::BerAccumulator;
pub use channel::{AwgnChannel, PowerDelayProfile, TdlChannel};
pub use driver::{LinkConfig, SimulationDriver};
pub use equalizer::{build_channel_matrix, ZfEqualizer};
pub use estimator::ChannelEstimator;
pub use modulation::BpskModulator;
pub use ofdm::OfdmEngine;

use thiserror::Error;

/// Common errors for the link simulation chain
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Processing error: {0}")]
    ProcessingError(String),
}
