//! BPSK Modulation and Hard-Decision Demodulation
//!
//! Maps bits onto the real axis (bit 0 -> +1, bit 1 -> -1, unit energy) and
//! recovers bits from the sign of the real part. Both directions are pure
//! functions over slices.

use crate::LinkError;
use num_complex::Complex64;

/// BPSK modulator / hard-decision demodulator
#[derive(Debug, Clone, Copy, Default)]
pub struct BpskModulator;

impl BpskModulator {
    /// Create a new BPSK modulator
    pub fn new() -> Self {
        Self
    }

    /// Bits carried per constellation symbol
    pub fn bits_per_symbol(&self) -> usize {
        1
    }

    /// Map bits to unit-energy constellation points
    ///
    /// Bit 0 maps to +1, bit 1 maps to -1. The bit count must be a multiple
    /// of `bits_per_symbol()`.
    pub fn modulate(&self, bits: &[u8]) -> Result<Vec<Complex64>, LinkError> {
        if bits.len() % self.bits_per_symbol() != 0 {
            return Err(LinkError::InvalidInput(format!(
                "bit count {} is not a multiple of bits per symbol {}",
                bits.len(),
                self.bits_per_symbol()
            )));
        }

        Ok(bits
            .iter()
            .map(|&b| {
                if b == 0 {
                    Complex64::new(1.0, 0.0)
                } else {
                    Complex64::new(-1.0, 0.0)
                }
            })
            .collect())
    }

    /// Nearest-point hard decision, the inverse of `modulate`
    pub fn demodulate(&self, symbols: &[Complex64]) -> Vec<u8> {
        symbols
            .iter()
            .map(|s| if s.re < 0.0 { 1 } else { 0 })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bpsk_mapping() {
        let modulator = BpskModulator::new();
        let symbols = modulator.modulate(&[0, 1, 1, 0]).unwrap();
        assert_eq!(symbols[0], Complex64::new(1.0, 0.0));
        assert_eq!(symbols[1], Complex64::new(-1.0, 0.0));
        assert_eq!(symbols[2], Complex64::new(-1.0, 0.0));
        assert_eq!(symbols[3], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_bpsk_roundtrip() {
        let modulator = BpskModulator::new();
        let bits = vec![1, 0, 0, 1, 1, 1, 0, 0];
        let symbols = modulator.modulate(&bits).unwrap();
        assert_eq!(modulator.demodulate(&symbols), bits);
    }

    #[test]
    fn test_hard_decision_with_noise() {
        let modulator = BpskModulator::new();
        // Decision depends only on the sign of the real part
        let symbols = vec![
            Complex64::new(0.3, -2.0),
            Complex64::new(-0.01, 5.0),
            Complex64::new(1.7, 0.2),
        ];
        assert_eq!(modulator.demodulate(&symbols), vec![0, 1, 0]);
    }

    #[test]
    fn test_unit_energy() {
        let modulator = BpskModulator::new();
        for s in modulator.modulate(&[0, 1]).unwrap() {
            assert!((s.norm_sqr() - 1.0).abs() < 1e-15);
        }
    }
}
