//! Per-Subcarrier Channel Estimation
//!
//! Turns the fading-tap snapshot at each OFDM frame boundary into a
//! frequency response over the subcarriers. The channel is assumed static
//! over one frame (block fading), so the snapshot at the frame's first
//! sample stands for the whole frame. The transform is the unscaled forward
//! DFT; combined with the unitary OFDM pair this makes Y = H * X hold
//! exactly per subcarrier.

use crate::LinkError;
use ndarray::Array2;
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Extracts per-frame frequency responses from fading coefficients
pub struct ChannelEstimator {
    num_subcarriers: usize,
    frame_len: usize,
    fft: Arc<dyn Fft<f64>>,
}

impl ChannelEstimator {
    /// Create an estimator for the given OFDM geometry
    pub fn new(num_subcarriers: usize, cp_len: usize) -> Result<Self, LinkError> {
        if num_subcarriers == 0 || cp_len >= num_subcarriers {
            return Err(LinkError::InvalidConfiguration(format!(
                "invalid OFDM geometry: {} subcarriers, {} CP samples",
                num_subcarriers, cp_len
            )));
        }

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(num_subcarriers);

        Ok(Self {
            num_subcarriers,
            frame_len: num_subcarriers + cp_len,
            fft,
        })
    }

    /// Compute H(frame, subcarrier) for one (rx, tx) coefficient matrix
    ///
    /// `coeffs` is the [num_samples x num_taps] matrix produced by
    /// `TdlChannel::generate` for a whole batch; `delays` places each tap
    /// into the impulse response. Returns a [num_frames x Nsub] matrix.
    pub fn frequency_response(
        &self,
        coeffs: &Array2<Complex64>,
        delays: &[usize],
    ) -> Result<Array2<Complex64>, LinkError> {
        if coeffs.ncols() != delays.len() {
            return Err(LinkError::InvalidInput(format!(
                "{} coefficient columns for {} tap delays",
                coeffs.ncols(),
                delays.len()
            )));
        }
        if coeffs.nrows() == 0 || coeffs.nrows() % self.frame_len != 0 {
            return Err(LinkError::InvalidInput(format!(
                "coefficient rows {} not a positive multiple of the {}-sample frame",
                coeffs.nrows(),
                self.frame_len
            )));
        }
        if delays.iter().any(|&d| d >= self.num_subcarriers) {
            return Err(LinkError::InvalidInput(
                "tap delay exceeds the subcarrier count".into(),
            ));
        }

        let num_frames = coeffs.nrows() / self.frame_len;
        let mut response = Array2::zeros((num_frames, self.num_subcarriers));
        let mut impulse = vec![Complex64::new(0.0, 0.0); self.num_subcarriers];

        for frame in 0..num_frames {
            let row = frame * self.frame_len;
            impulse.fill(Complex64::new(0.0, 0.0));
            for (t, &delay) in delays.iter().enumerate() {
                impulse[delay] = coeffs[[row, t]];
            }

            self.fft.process(&mut impulse);
            for (s, &h) in impulse.iter().enumerate() {
                response[[frame, s]] = h;
            }
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{PowerDelayProfile, TdlChannel};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_single_tap_gives_flat_response() {
        let estimator = ChannelEstimator::new(16, 4).unwrap();
        let mut rng = StdRng::seed_from_u64(21);
        let mut channel =
            TdlChannel::new(PowerDelayProfile::single_tap(), 0.0, &mut rng).unwrap();
        let coeffs = channel.generate(2 * 20);

        let response = estimator
            .frequency_response(&coeffs, channel.profile().delays())
            .unwrap();
        assert_eq!(response.dim(), (2, 16));

        // A zero-delay single tap is flat across subcarriers, equal to the tap
        let tap = coeffs[[0, 0]];
        for s in 0..16 {
            assert!((response[[0, s]] - tap).norm() < 1e-12);
        }
    }

    #[test]
    fn test_snapshot_taken_at_frame_boundary() {
        let estimator = ChannelEstimator::new(8, 2).unwrap();
        // Hand-built coefficients: tap value encodes the row index
        let mut coeffs = Array2::zeros((20, 1));
        for k in 0..20 {
            coeffs[[k, 0]] = Complex64::new(k as f64, 0.0);
        }

        let response = estimator.frequency_response(&coeffs, &[0]).unwrap();
        assert_eq!(response.dim(), (2, 8));
        assert!((response[[0, 0]].re - 0.0).abs() < 1e-12);
        assert!((response[[1, 0]].re - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_delayed_tap_phase_ramp() {
        let estimator = ChannelEstimator::new(8, 0).unwrap();
        let mut coeffs = Array2::zeros((8, 1));
        coeffs[[0, 0]] = Complex64::new(1.0, 0.0);

        // A unit tap at delay 1 becomes exp(-j 2 pi s / N) per subcarrier
        let response = estimator.frequency_response(&coeffs, &[1]).unwrap();
        for s in 0..8 {
            let expected =
                Complex64::from_polar(1.0, -2.0 * std::f64::consts::PI * s as f64 / 8.0);
            assert!((response[[0, s]] - expected).norm() < 1e-12);
        }
    }

    #[test]
    fn test_input_validation() {
        let estimator = ChannelEstimator::new(16, 4).unwrap();
        let coeffs = Array2::<Complex64>::zeros((20, 2));
        // delay list length mismatch
        assert!(estimator.frequency_response(&coeffs, &[0]).is_err());
        // rows not a frame multiple
        let bad_rows = Array2::<Complex64>::zeros((21, 2));
        assert!(estimator.frequency_response(&bad_rows, &[0, 1]).is_err());
        // delay beyond the subcarrier count
        assert!(estimator.frequency_response(&coeffs, &[0, 16]).is_err());
    }
}
