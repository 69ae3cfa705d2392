//! Tapped-Delay-Line Fading Channel and AWGN
//!
//! Each `TdlChannel` instance models one (rx, tx) antenna pair as a small
//! set of delayed, power-weighted taps. Tap fading is a Jakes
//! sum-of-sinusoids process: every tap carries its own set of random
//! arrival angles and phases, so taps fade independently while sharing the
//! normalized Doppler rate. Noise is added separately per rx antenna after
//! the per-antenna outputs are superposed.

use crate::LinkError;
use common::db_to_linear;
use ndarray::Array2;
use num_complex::Complex64;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;

/// Number of sinusoids summed per fading tap
const NUM_OSCILLATORS: usize = 32;

/// Power-delay profile: tap delays in samples with relative powers in dB
///
/// Linear tap powers are normalized to unit total average power, so the
/// channel neither amplifies nor attenuates on average.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerDelayProfile {
    delays: Vec<usize>,
    /// Normalized linear power per tap
    powers: Vec<f64>,
}

impl PowerDelayProfile {
    /// Create a profile from delays (samples) and relative powers (dB)
    pub fn new(delays: &[usize], powers_db: &[f64]) -> Result<Self, LinkError> {
        if delays.is_empty() || delays.len() != powers_db.len() {
            return Err(LinkError::InvalidConfiguration(format!(
                "power-delay profile needs matching non-empty delay/power lists, got {}/{}",
                delays.len(),
                powers_db.len()
            )));
        }
        if !delays.windows(2).all(|w| w[0] < w[1]) {
            return Err(LinkError::InvalidConfiguration(
                "tap delays must be strictly increasing".into(),
            ));
        }

        let linear: Vec<f64> = powers_db.iter().map(|&p| db_to_linear(p)).collect();
        let total: f64 = linear.iter().sum();
        let powers = linear.iter().map(|p| p / total).collect();

        Ok(Self {
            delays: delays.to_vec(),
            powers,
        })
    }

    /// The default 4-tap exponential-decay profile (0,-3,-6,-9 dB)
    pub fn four_tap_exponential() -> Self {
        Self::new(&[0, 1, 2, 3], &[0.0, -3.0, -6.0, -9.0])
            .expect("static profile is well formed")
    }

    /// Single static-delay tap at full power, useful for calibration
    pub fn single_tap() -> Self {
        Self::new(&[0], &[0.0]).expect("static profile is well formed")
    }

    /// Number of taps
    pub fn num_taps(&self) -> usize {
        self.delays.len()
    }

    /// Tap delays in samples
    pub fn delays(&self) -> &[usize] {
        &self.delays
    }

    /// Normalized linear tap powers (summing to one)
    pub fn powers(&self) -> &[f64] {
        &self.powers
    }

    /// Largest tap delay in samples
    pub fn max_delay(&self) -> usize {
        *self.delays.last().expect("profile is never empty")
    }
}

/// One Jakes oscillator bank: fixed angles and phases for one tap
#[derive(Debug, Clone)]
struct TapProcess {
    /// Doppler frequency of each sinusoid, in cycles per sample
    frequencies: [f64; NUM_OSCILLATORS],
    phases: [f64; NUM_OSCILLATORS],
    amplitude: f64,
}

impl TapProcess {
    fn new<R: Rng>(power: f64, norm_doppler: f64, rng: &mut R) -> Self {
        let mut frequencies = [0.0; NUM_OSCILLATORS];
        let mut phases = [0.0; NUM_OSCILLATORS];
        for i in 0..NUM_OSCILLATORS {
            // Uniform arrival angle gives the classic Jakes Doppler spectrum
            let angle: f64 = rng.gen_range(0.0..2.0 * PI);
            frequencies[i] = norm_doppler * angle.cos();
            phases[i] = rng.gen_range(0.0..2.0 * PI);
        }
        Self {
            frequencies,
            phases,
            amplitude: (power / NUM_OSCILLATORS as f64).sqrt(),
        }
    }

    fn coefficient(&self, sample_index: u64) -> Complex64 {
        let n = sample_index as f64;
        let mut sum = Complex64::new(0.0, 0.0);
        for i in 0..NUM_OSCILLATORS {
            let phase = 2.0 * PI * self.frequencies[i] * n + self.phases[i];
            sum += Complex64::from_polar(1.0, phase);
        }
        sum * self.amplitude
    }
}

/// Tapped-delay-line fading channel for one (rx, tx) antenna pair
#[derive(Debug, Clone)]
pub struct TdlChannel {
    profile: PowerDelayProfile,
    taps: Vec<TapProcess>,
    /// Samples generated so far; keeps fading correlated across batches
    sample_offset: u64,
}

impl TdlChannel {
    /// Create a channel with fresh fading state
    pub fn new<R: Rng>(
        profile: PowerDelayProfile,
        norm_doppler: f64,
        rng: &mut R,
    ) -> Result<Self, LinkError> {
        if !(0.0..0.5).contains(&norm_doppler) {
            return Err(LinkError::InvalidConfiguration(format!(
                "normalized Doppler {} outside [0, 0.5)",
                norm_doppler
            )));
        }

        let taps = profile
            .powers()
            .iter()
            .map(|&p| TapProcess::new(p, norm_doppler, rng))
            .collect();

        Ok(Self {
            profile,
            taps,
            sample_offset: 0,
        })
    }

    /// The channel's power-delay profile
    pub fn profile(&self) -> &PowerDelayProfile {
        &self.profile
    }

    /// Generate `num_samples` rows of per-tap fading coefficients
    ///
    /// Row k holds the instantaneous coefficient of every tap at time
    /// sample k. Consecutive calls continue the same fading process.
    pub fn generate(&mut self, num_samples: usize) -> Array2<Complex64> {
        let num_taps = self.profile.num_taps();
        let mut coeffs = Array2::zeros((num_samples, num_taps));

        for k in 0..num_samples {
            let n = self.sample_offset + k as u64;
            for (t, tap) in self.taps.iter().enumerate() {
                coeffs[[k, t]] = tap.coefficient(n);
            }
        }
        self.sample_offset += num_samples as u64;

        coeffs
    }

    /// Filter a transmitted stream through known time-varying coefficients
    ///
    /// `out[k] = sum_tap coeffs[k, tap] * input[k - delay[tap]]`, with the
    /// input zero-padded before index 0. Output length equals input length.
    pub fn filter(
        &self,
        input: &[Complex64],
        coeffs: &Array2<Complex64>,
    ) -> Result<Vec<Complex64>, LinkError> {
        if coeffs.nrows() != input.len() || coeffs.ncols() != self.profile.num_taps() {
            return Err(LinkError::InvalidInput(format!(
                "coefficient matrix {}x{} does not match {} samples with {} taps",
                coeffs.nrows(),
                coeffs.ncols(),
                input.len(),
                self.profile.num_taps()
            )));
        }

        let delays = self.profile.delays();
        let mut output = vec![Complex64::new(0.0, 0.0); input.len()];
        for k in 0..input.len() {
            let mut acc = Complex64::new(0.0, 0.0);
            for (t, &delay) in delays.iter().enumerate() {
                if k >= delay {
                    acc += coeffs[[k, t]] * input[k - delay];
                }
            }
            output[k] = acc;
        }

        Ok(output)
    }
}

/// Complex AWGN source with total per-sample variance N0
#[derive(Debug, Clone)]
pub struct AwgnChannel {
    n0: f64,
    /// Per-component distribution, variance N0/2
    distr: Option<Normal<f64>>,
}

impl AwgnChannel {
    /// Create a noise source; `n0` is the complex noise variance
    pub fn new(n0: f64) -> Result<Self, LinkError> {
        if !n0.is_finite() || n0 < 0.0 {
            return Err(LinkError::InvalidConfiguration(format!(
                "noise variance {} must be finite and non-negative",
                n0
            )));
        }

        let distr = if n0 > 0.0 {
            Some(
                Normal::new(0.0, (n0 / 2.0).sqrt())
                    .map_err(|e| LinkError::InvalidConfiguration(e.to_string()))?,
            )
        } else {
            None
        };

        Ok(Self { n0, distr })
    }

    /// Complex noise variance
    pub fn n0(&self) -> f64 {
        self.n0
    }

    /// Add noise in place to a received stream
    pub fn add_noise<R: Rng>(&self, samples: &mut [Complex64], rng: &mut R) {
        let Some(distr) = &self.distr else {
            return;
        };
        for s in samples.iter_mut() {
            *s += Complex64::new(distr.sample(rng), distr.sample(rng));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_profile_normalization() {
        let pdp = PowerDelayProfile::new(&[0, 1, 2, 3], &[0.0, -3.0, -6.0, -9.0]).unwrap();
        let total: f64 = pdp.powers().iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        // Relative power ratios survive normalization
        assert!((pdp.powers()[0] / pdp.powers()[1] - db_to_linear(3.0)).abs() < 1e-12);
        assert_eq!(pdp.max_delay(), 3);
    }

    #[test]
    fn test_profile_validation() {
        assert!(PowerDelayProfile::new(&[], &[]).is_err());
        assert!(PowerDelayProfile::new(&[0, 1], &[0.0]).is_err());
        assert!(PowerDelayProfile::new(&[0, 2, 1], &[0.0, -1.0, -2.0]).is_err());
    }

    #[test]
    fn test_static_channel_is_constant() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut channel =
            TdlChannel::new(PowerDelayProfile::single_tap(), 0.0, &mut rng).unwrap();
        let coeffs = channel.generate(64);
        let first = coeffs[[0, 0]];
        for k in 0..64 {
            assert!((coeffs[[k, 0]] - first).norm() < 1e-12);
        }
    }

    #[test]
    fn test_generation_continues_across_calls() {
        let pdp = PowerDelayProfile::four_tap_exponential();
        let mut rng = StdRng::seed_from_u64(11);
        let mut channel = TdlChannel::new(pdp.clone(), 0.01, &mut rng).unwrap();
        let joint = channel.generate(20);

        let mut rng = StdRng::seed_from_u64(11);
        let mut split = TdlChannel::new(pdp, 0.01, &mut rng).unwrap();
        let first = split.generate(10);
        let second = split.generate(10);

        for t in 0..4 {
            assert!((joint[[9, t]] - first[[9, t]]).norm() < 1e-12);
            assert!((joint[[10, t]] - second[[0, t]]).norm() < 1e-12);
        }
    }

    #[test]
    fn test_average_tap_power() {
        // Average over many independent channel draws approaches the profile
        let pdp = PowerDelayProfile::four_tap_exponential();
        let mut rng = StdRng::seed_from_u64(3);
        let mut mean_power = vec![0.0; pdp.num_taps()];
        let num_draws = 400;

        for _ in 0..num_draws {
            let mut channel = TdlChannel::new(pdp.clone(), 0.0, &mut rng).unwrap();
            let coeffs = channel.generate(1);
            for t in 0..pdp.num_taps() {
                mean_power[t] += coeffs[[0, t]].norm_sqr() / num_draws as f64;
            }
        }

        for t in 0..pdp.num_taps() {
            let expected = pdp.powers()[t];
            assert!(
                (mean_power[t] - expected).abs() < 0.2 * expected.max(0.05),
                "tap {} power {} vs expected {}",
                t,
                mean_power[t],
                expected
            );
        }
    }

    #[test]
    fn test_filter_impulse_response() {
        let pdp = PowerDelayProfile::new(&[0, 2], &[0.0, 0.0]).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let mut channel = TdlChannel::new(pdp, 0.0, &mut rng).unwrap();
        let coeffs = channel.generate(8);

        let mut input = vec![Complex64::new(0.0, 0.0); 8];
        input[0] = Complex64::new(1.0, 0.0);
        let output = channel.filter(&input, &coeffs).unwrap();

        assert_eq!(output.len(), 8);
        assert!((output[0] - coeffs[[0, 0]]).norm() < 1e-12);
        assert!(output[1].norm() < 1e-12);
        assert!((output[2] - coeffs[[2, 1]]).norm() < 1e-12);
        assert!(output[3].norm() < 1e-12);
    }

    #[test]
    fn test_filter_dimension_check() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut channel =
            TdlChannel::new(PowerDelayProfile::single_tap(), 0.0, &mut rng).unwrap();
        let coeffs = channel.generate(4);
        let input = vec![Complex64::new(1.0, 0.0); 8];
        assert!(channel.filter(&input, &coeffs).is_err());
    }

    #[test]
    fn test_awgn_zero_variance_is_exact() {
        let awgn = AwgnChannel::new(0.0).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let mut samples = vec![Complex64::new(1.0, -1.0); 16];
        let original = samples.clone();
        awgn.add_noise(&mut samples, &mut rng);
        assert_eq!(samples, original);
    }

    #[test]
    fn test_awgn_variance() {
        let n0 = 0.5;
        let awgn = AwgnChannel::new(n0).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let mut samples = vec![Complex64::new(0.0, 0.0); 20000];
        awgn.add_noise(&mut samples, &mut rng);

        let measured: f64 =
            samples.iter().map(|s| s.norm_sqr()).sum::<f64>() / samples.len() as f64;
        assert!((measured - n0).abs() < 0.05);
    }

    #[test]
    fn test_awgn_rejects_negative_variance() {
        assert!(AwgnChannel::new(-1.0).is_err());
        assert!(AwgnChannel::new(f64::NAN).is_err());
    }

    #[test]
    fn test_doppler_range_check() {
        let mut rng = StdRng::seed_from_u64(4);
        assert!(TdlChannel::new(PowerDelayProfile::single_tap(), 0.5, &mut rng).is_err());
        assert!(TdlChannel::new(PowerDelayProfile::single_tap(), -0.1, &mut rng).is_err());
    }
}
