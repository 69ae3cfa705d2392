//! OFDM Modulation and Demodulation
//!
//! Unitary IDFT/DFT pair with cyclic-prefix insertion and removal, applied
//! block-wise over a batch of concatenated frames. With the unitary
//! transform on both sides, the frequency response seen per subcarrier is
//! the unscaled DFT of the channel impulse response, which is what the
//! channel estimator produces.

use crate::LinkError;
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// OFDM modulator/demodulator with fixed subcarrier count and CP length
pub struct OfdmEngine {
    /// Number of subcarriers (DFT size)
    num_subcarriers: usize,
    /// Cyclic prefix length in samples
    cp_len: usize,
    /// Inverse DFT (transmit side)
    ifft: Arc<dyn Fft<f64>>,
    /// Forward DFT (receive side)
    fft: Arc<dyn Fft<f64>>,
}

impl OfdmEngine {
    /// Create a new engine; requires `cp_len < num_subcarriers`
    pub fn new(num_subcarriers: usize, cp_len: usize) -> Result<Self, LinkError> {
        if num_subcarriers == 0 {
            return Err(LinkError::InvalidConfiguration(
                "number of subcarriers must be positive".into(),
            ));
        }
        if cp_len >= num_subcarriers {
            return Err(LinkError::InvalidConfiguration(format!(
                "cyclic prefix length {} must be shorter than the {}-point frame",
                cp_len, num_subcarriers
            )));
        }

        let mut planner = FftPlanner::new();
        let ifft = planner.plan_fft_inverse(num_subcarriers);
        let fft = planner.plan_fft_forward(num_subcarriers);

        Ok(Self {
            num_subcarriers,
            cp_len,
            ifft,
            fft,
        })
    }

    /// Subcarrier count
    pub fn num_subcarriers(&self) -> usize {
        self.num_subcarriers
    }

    /// Cyclic prefix length
    pub fn cp_len(&self) -> usize {
        self.cp_len
    }

    /// Samples per transmitted frame including the cyclic prefix
    pub fn frame_len(&self) -> usize {
        self.num_subcarriers + self.cp_len
    }

    /// OFDM-modulate a concatenation of Nsub-symbol frames
    ///
    /// Each frame is transformed with the unitary inverse DFT and the last
    /// `cp_len` time samples are prepended as cyclic prefix, so each block
    /// of Nsub symbols becomes Nsub+Ncp samples.
    pub fn modulate(&self, symbols: &[Complex64]) -> Result<Vec<Complex64>, LinkError> {
        if symbols.is_empty() || symbols.len() % self.num_subcarriers != 0 {
            return Err(LinkError::InvalidInput(format!(
                "input length {} is not a positive multiple of {} subcarriers",
                symbols.len(),
                self.num_subcarriers
            )));
        }

        let num_frames = symbols.len() / self.num_subcarriers;
        let scale = 1.0 / (self.num_subcarriers as f64).sqrt();
        let mut output = Vec::with_capacity(num_frames * self.frame_len());
        let mut buffer = vec![Complex64::new(0.0, 0.0); self.num_subcarriers];

        for frame in symbols.chunks(self.num_subcarriers) {
            buffer.copy_from_slice(frame);
            self.ifft.process(&mut buffer);
            for sample in buffer.iter_mut() {
                *sample *= scale;
            }

            output.extend_from_slice(&buffer[self.num_subcarriers - self.cp_len..]);
            output.extend_from_slice(&buffer);
        }

        Ok(output)
    }

    /// OFDM-demodulate a concatenation of (Nsub+Ncp)-sample frames
    ///
    /// Drops the first `cp_len` samples of each block and applies the
    /// unitary forward DFT.
    pub fn demodulate(&self, samples: &[Complex64]) -> Result<Vec<Complex64>, LinkError> {
        if samples.is_empty() || samples.len() % self.frame_len() != 0 {
            return Err(LinkError::InvalidInput(format!(
                "input length {} is not a positive multiple of the {}-sample frame",
                samples.len(),
                self.frame_len()
            )));
        }

        let num_frames = samples.len() / self.frame_len();
        let scale = 1.0 / (self.num_subcarriers as f64).sqrt();
        let mut output = Vec::with_capacity(num_frames * self.num_subcarriers);
        let mut buffer = vec![Complex64::new(0.0, 0.0); self.num_subcarriers];

        for frame in samples.chunks(self.frame_len()) {
            buffer.copy_from_slice(&frame[self.cp_len..]);
            self.fft.process(&mut buffer);
            output.extend(buffer.iter().map(|&s| s * scale));
        }

        Ok(output)
    }
}
