//! Bit-Error-Rate Accounting
//!
//! Accumulates Hamming distance between transmitted and recovered bit
//! matrices across the batches of one Eb/N0 sweep point.

use ndarray::Array2;

/// Running error/total bit counter
#[derive(Debug, Clone, Copy, Default)]
pub struct BerAccumulator {
    errors: u64,
    total_bits: u64,
}

impl BerAccumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare two equal-shape bit matrices and accumulate the result
    ///
    /// Returns the (errors, total) contribution of this call.
    pub fn count(&mut self, sent: &Array2<u8>, recovered: &Array2<u8>) -> (u64, u64) {
        debug_assert_eq!(sent.dim(), recovered.dim());

        let errors = sent
            .iter()
            .zip(recovered.iter())
            .filter(|(a, b)| a != b)
            .count() as u64;
        let total = sent.len() as u64;

        self.errors += errors;
        self.total_bits += total;
        (errors, total)
    }

    /// Cumulative bit errors
    pub fn errors(&self) -> u64 {
        self.errors
    }

    /// Cumulative bits compared
    pub fn total_bits(&self) -> u64 {
        self.total_bits
    }

    /// Cumulative bit error rate
    pub fn ber(&self) -> f64 {
        if self.total_bits == 0 {
            0.0
        } else {
            self.errors as f64 / self.total_bits as f64
        }
    }

    /// Clear the counts between sweep points
    pub fn reset(&mut self) {
        self.errors = 0;
        self.total_bits = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_hamming_distance() {
        let sent = array![[0u8, 1, 1, 0], [1, 1, 0, 0]];
        let recovered = array![[0u8, 0, 1, 0], [1, 1, 0, 1]];

        let mut acc = BerAccumulator::new();
        let (errors, total) = acc.count(&sent, &recovered);
        assert_eq!(errors, 2);
        assert_eq!(total, 8);
        assert_eq!(acc.ber(), 0.25);
    }

    #[test]
    fn test_accumulation_and_reset() {
        let sent = array![[0u8, 0], [0, 0]];
        let all_wrong = array![[1u8, 1], [1, 1]];

        let mut acc = BerAccumulator::new();
        acc.count(&sent, &sent);
        acc.count(&sent, &all_wrong);
        assert_eq!(acc.errors(), 4);
        assert_eq!(acc.total_bits(), 8);
        assert_eq!(acc.ber(), 0.5);

        acc.reset();
        assert_eq!(acc.errors(), 0);
        assert_eq!(acc.total_bits(), 0);
        assert_eq!(acc.ber(), 0.0);
    }
}
