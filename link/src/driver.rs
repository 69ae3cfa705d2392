//! Simulation Driver
//!
//! Owns the Eb/N0 sweep: per sweep point it builds fresh fading channels,
//! runs the batched transmit/channel/receive loop and accumulates bit
//! errors. Channel instances live in a runtime-dimensioned Vec indexed by
//! (rx, tx) pair and are dropped when the point completes, so no fading
//! state leaks across sweep points.

use crate::channel::{AwgnChannel, PowerDelayProfile, TdlChannel};
use crate::equalizer::{build_channel_matrix, ZfEqualizer};
use crate::estimator::ChannelEstimator;
use crate::modulation::BpskModulator;
use crate::ofdm::OfdmEngine;
use crate::{BerAccumulator, LinkError};
use common::{db_to_linear, sweep_range, BerPoint};
use ndarray::{Array2, ArrayView1};
use num_complex::Complex64;
use rand::Rng;
use tracing::{debug, info};

/// Link-level simulation parameters
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Subcarriers per OFDM frame
    pub num_subcarriers: usize,
    /// Cyclic prefix length in samples
    pub cp_len: usize,
    /// Total OFDM frames simulated per sweep point
    pub num_ofdm_frames: usize,
    /// Frames processed per batch
    pub batch_size: usize,
    /// Transmit antennas
    pub num_tx_antennas: usize,
    /// Receive antennas
    pub num_rx_antennas: usize,
    /// Swept Eb/N0 values in dB
    pub ebno_db: Vec<f64>,
    /// Multipath power-delay profile, shared by all antenna pairs
    pub profile: PowerDelayProfile,
    /// Normalized Doppler rate of the fading processes
    pub norm_doppler: f64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            num_subcarriers: 128,
            cp_len: 16,
            num_ofdm_frames: 100_000,
            batch_size: 1000,
            num_tx_antennas: 2,
            num_rx_antennas: 2,
            ebno_db: sweep_range(0.0, 15.0, 1.0),
            profile: PowerDelayProfile::four_tap_exponential(),
            norm_doppler: 1e-6,
        }
    }
}

impl LinkConfig {
    /// Check the startup preconditions; fatal when violated
    pub fn validate(&self) -> Result<(), LinkError> {
        if self.batch_size == 0 || self.num_ofdm_frames % self.batch_size != 0 {
            return Err(LinkError::InvalidConfiguration(format!(
                "frame count {} must be a positive multiple of batch size {}",
                self.num_ofdm_frames, self.batch_size
            )));
        }
        if self.num_rx_antennas < self.num_tx_antennas {
            return Err(LinkError::InvalidConfiguration(format!(
                "unsupported antenna geometry: {} rx < {} tx",
                self.num_rx_antennas, self.num_tx_antennas
            )));
        }
        if self.ebno_db.is_empty() {
            return Err(LinkError::InvalidConfiguration(
                "Eb/N0 sweep range is empty".into(),
            ));
        }
        if self.profile.max_delay() >= self.num_subcarriers {
            return Err(LinkError::InvalidConfiguration(format!(
                "tap delay {} does not fit {} subcarriers",
                self.profile.max_delay(),
                self.num_subcarriers
            )));
        }
        Ok(())
    }
}

/// Runs the Eb/N0 sweep over the full link chain
pub struct SimulationDriver {
    config: LinkConfig,
    modulator: BpskModulator,
    ofdm: OfdmEngine,
    estimator: ChannelEstimator,
    equalizer: ZfEqualizer,
}

impl SimulationDriver {
    /// Validate the configuration and build the fixed processing blocks
    pub fn new(config: LinkConfig) -> Result<Self, LinkError> {
        config.validate()?;

        let ofdm = OfdmEngine::new(config.num_subcarriers, config.cp_len)?;
        let estimator = ChannelEstimator::new(config.num_subcarriers, config.cp_len)?;
        let equalizer = ZfEqualizer::new(config.num_rx_antennas, config.num_tx_antennas)?;

        Ok(Self {
            config,
            modulator: BpskModulator::new(),
            ofdm,
            estimator,
            equalizer,
        })
    }

    /// The validated configuration
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Run the whole sweep, one BER point per configured Eb/N0 value
    pub fn run<R: Rng>(&self, rng: &mut R) -> Result<Vec<BerPoint>, LinkError> {
        let mut points = Vec::with_capacity(self.config.ebno_db.len());
        for &ebno_db in &self.config.ebno_db {
            let point = self.run_point(ebno_db, rng)?;
            info!(
                "Eb/N0 {:>5.1} dB: BER {:.3e} ({} / {} bits)",
                ebno_db, point.ber, point.errors, point.total_bits
            );
            points.push(point);
        }
        Ok(points)
    }

    /// Simulate one Eb/N0 point over all frame batches
    pub fn run_point<R: Rng>(&self, ebno_db: f64, rng: &mut R) -> Result<BerPoint, LinkError> {
        let cfg = &self.config;
        let num_tx = cfg.num_tx_antennas;
        let num_rx = cfg.num_rx_antennas;

        // Unit symbol energy across all tx antennas
        let es = 1.0;
        let eb = es / self.modulator.bits_per_symbol() as f64;
        let n0 = eb / db_to_linear(ebno_db);
        let awgn = AwgnChannel::new(n0)?;

        // Fresh fading state per sweep point, one channel per (rx, tx) pair
        let mut channels = Vec::with_capacity(num_rx * num_tx);
        for _ in 0..num_rx * num_tx {
            channels.push(TdlChannel::new(
                cfg.profile.clone(),
                cfg.norm_doppler,
                rng,
            )?);
        }

        let mut accumulator = BerAccumulator::new();
        let num_batches = cfg.num_ofdm_frames / cfg.batch_size;
        for batch in 0..num_batches {
            let (errors, total, regularized) =
                self.run_batch(&mut channels, &awgn, &mut accumulator, rng)?;
            debug!(
                "batch {}/{}: {} errors / {} bits ({} regularized solves)",
                batch + 1,
                num_batches,
                errors,
                total,
                regularized
            );
        }

        Ok(BerPoint::new(
            ebno_db,
            accumulator.errors(),
            accumulator.total_bits(),
        ))
    }

    /// One batch: transmit, fade, add noise, receive, equalize, count
    fn run_batch<R: Rng>(
        &self,
        channels: &mut [TdlChannel],
        awgn: &AwgnChannel,
        accumulator: &mut BerAccumulator,
        rng: &mut R,
    ) -> Result<(u64, u64, u64), LinkError> {
        let cfg = &self.config;
        let num_tx = cfg.num_tx_antennas;
        let num_rx = cfg.num_rx_antennas;
        let nsub = cfg.num_subcarriers;
        let bits_per_symbol = self.modulator.bits_per_symbol();
        let num_tx_bits = cfg.batch_size * nsub * bits_per_symbol;
        let num_samples = cfg.batch_size * self.ofdm.frame_len();

        // Transmitter: random bits, BPSK, power normalization, OFDM
        let mut tx_bits = Array2::<u8>::zeros((num_tx, num_tx_bits));
        for bit in tx_bits.iter_mut() {
            *bit = rng.gen::<bool>() as u8;
        }

        let power_scale = 1.0 / (num_tx as f64).sqrt();
        let mut tx_samples = Array2::<Complex64>::zeros((num_tx, num_samples));
        for t in 0..num_tx {
            let row_bits = tx_bits.row(t).to_vec();
            let mut symbols = self.modulator.modulate(&row_bits)?;
            for s in symbols.iter_mut() {
                *s *= power_scale;
            }
            let samples = self.ofdm.modulate(&symbols)?;
            tx_samples.row_mut(t).assign(&ArrayView1::from(samples.as_slice()));
        }

        // Channel: per-pair fading, superposition per rx antenna, then AWGN
        let coeffs: Vec<Array2<Complex64>> = channels
            .iter_mut()
            .map(|ch| ch.generate(num_samples))
            .collect();

        let mut rx_symbols = Array2::<Complex64>::zeros((num_rx, cfg.batch_size * nsub));
        for i in 0..num_rx {
            let mut received = vec![Complex64::new(0.0, 0.0); num_samples];
            for j in 0..num_tx {
                let pair = i * num_tx + j;
                let tx_row = tx_samples.row(j).to_vec();
                let faded = channels[pair].filter(&tx_row, &coeffs[pair])?;
                for (acc, sample) in received.iter_mut().zip(faded) {
                    *acc += sample;
                }
            }
            awgn.add_noise(&mut received, rng);

            let symbols = self.ofdm.demodulate(&received)?;
            rx_symbols.row_mut(i).assign(&ArrayView1::from(symbols.as_slice()));
        }

        // Perfect channel knowledge: per-frame frequency response per pair
        let responses: Vec<Array2<Complex64>> = coeffs
            .iter()
            .map(|c| self.estimator.frequency_response(c, cfg.profile.delays()))
            .collect::<Result<_, _>>()?;

        // Zero-forcing equalization and hard decisions, one sample at a time
        let mut rx_bits = Array2::<u8>::zeros((num_tx, num_tx_bits));
        let mut regularized: u64 = 0;
        let mut y = vec![Complex64::new(0.0, 0.0); num_rx];
        for k in 0..cfg.batch_size * nsub {
            let h = build_channel_matrix(&responses, num_rx, num_tx, k / nsub, k % nsub);
            for (i, value) in y.iter_mut().enumerate() {
                *value = rx_symbols[[i, k]];
            }

            let equalized = self.equalizer.equalize(&h, &y)?;
            if equalized.regularized {
                regularized += 1;
            }

            for (t, &symbol) in equalized.symbols.iter().enumerate() {
                let bits = self.modulator.demodulate(&[symbol]);
                for (b, &bit) in bits.iter().enumerate() {
                    rx_bits[[t, k * bits_per_symbol + b]] = bit;
                }
            }
        }

        let (errors, total) = accumulator.count(&tx_bits, &rx_bits);
        Ok((errors, total, regularized))
    }
}
