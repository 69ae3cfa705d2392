//! Zero-Forcing MIMO Equalization
//!
//! Separates spatially multiplexed streams by inverting the instantaneous
//! per-subcarrier channel matrix. For a square system the equalizer solves
//! H * x = y directly; with more rx than tx antennas it solves the normal
//! equations (H^H H) x = H^H y, the least-squares solution. Near-singular
//! matrices are retried with diagonal loading and flagged to the caller
//! instead of silently propagating numerical garbage.

use crate::LinkError;
use ndarray::Array2;
use num_complex::Complex64;

/// Relative pivot threshold below which a matrix counts as singular
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Diagonal loading factor applied when a solve needs regularization
const LOADING_FACTOR: f64 = 1e-6;

/// Build the Nr x Nt channel matrix for one (frame, subcarrier) point
///
/// `responses` holds one [num_frames x Nsub] frequency-response matrix per
/// (rx, tx) pair, indexed rx * num_tx + tx.
pub fn build_channel_matrix(
    responses: &[Array2<Complex64>],
    num_rx: usize,
    num_tx: usize,
    frame: usize,
    subcarrier: usize,
) -> Array2<Complex64> {
    debug_assert_eq!(responses.len(), num_rx * num_tx);

    let mut h = Array2::zeros((num_rx, num_tx));
    for i in 0..num_rx {
        for j in 0..num_tx {
            h[[i, j]] = responses[i * num_tx + j][[frame, subcarrier]];
        }
    }
    h
}

/// Result of equalizing one received vector
#[derive(Debug, Clone)]
pub struct Equalized {
    /// Zero-forcing estimate of the transmitted symbol vector
    pub symbols: Vec<Complex64>,
    /// True when the solve needed diagonal loading
    pub regularized: bool,
}

/// Zero-forcing equalizer for an Nr x Nt spatial-multiplexing link
#[derive(Debug, Clone, Copy)]
pub struct ZfEqualizer {
    num_rx: usize,
    num_tx: usize,
}

impl ZfEqualizer {
    /// Create an equalizer; requires `num_rx >= num_tx >= 1`
    pub fn new(num_rx: usize, num_tx: usize) -> Result<Self, LinkError> {
        if num_tx == 0 {
            return Err(LinkError::InvalidConfiguration(
                "at least one tx antenna required".into(),
            ));
        }
        if num_rx < num_tx {
            return Err(LinkError::InvalidConfiguration(format!(
                "unsupported antenna geometry: {} rx < {} tx",
                num_rx, num_tx
            )));
        }
        Ok(Self { num_rx, num_tx })
    }

    /// Recover the transmitted symbol vector from one received vector
    pub fn equalize(
        &self,
        h: &Array2<Complex64>,
        y: &[Complex64],
    ) -> Result<Equalized, LinkError> {
        if h.dim() != (self.num_rx, self.num_tx) || y.len() != self.num_rx {
            return Err(LinkError::InvalidInput(format!(
                "channel matrix {:?} / received vector {} do not match {}x{} link",
                h.dim(),
                y.len(),
                self.num_rx,
                self.num_tx
            )));
        }

        // Square system: invert H directly; tall system: normal equations
        let (a, b) = if self.num_rx == self.num_tx {
            (h.clone(), y.to_vec())
        } else {
            let mut a = Array2::zeros((self.num_tx, self.num_tx));
            let mut b = vec![Complex64::new(0.0, 0.0); self.num_tx];
            for r in 0..self.num_tx {
                for c in 0..self.num_tx {
                    let mut acc = Complex64::new(0.0, 0.0);
                    for i in 0..self.num_rx {
                        acc += h[[i, r]].conj() * h[[i, c]];
                    }
                    a[[r, c]] = acc;
                }
                for i in 0..self.num_rx {
                    b[r] += h[[i, r]].conj() * y[i];
                }
            }
            (a, b)
        };

        if let Some(symbols) = solve_square(&a, &b) {
            return Ok(Equalized {
                symbols,
                regularized: false,
            });
        }

        // Deep fade: load the diagonal and retry, flagging the sample
        let n = a.nrows();
        let trace_mag: f64 = (0..n).map(|i| a[[i, i]].norm()).sum();
        let loading = LOADING_FACTOR * (trace_mag / n as f64).max(f64::MIN_POSITIVE);
        let mut loaded = a;
        for i in 0..n {
            loaded[[i, i]] += Complex64::new(loading, 0.0);
        }

        let symbols = solve_square(&loaded, &b)
            .unwrap_or_else(|| vec![Complex64::new(0.0, 0.0); self.num_tx]);
        Ok(Equalized {
            symbols,
            regularized: true,
        })
    }
}

/// Solve A x = b by Gaussian elimination with partial pivoting
///
/// Returns None when a pivot falls below the tolerance relative to the
/// largest element of A, signalling a (near-)singular system.
fn solve_square(a: &Array2<Complex64>, b: &[Complex64]) -> Option<Vec<Complex64>> {
    let n = a.nrows();
    debug_assert_eq!(a.ncols(), n);
    debug_assert_eq!(b.len(), n);

    let scale = a.iter().map(|c| c.norm()).fold(0.0_f64, f64::max);
    if scale == 0.0 {
        return None;
    }
    let threshold = PIVOT_TOLERANCE * scale;

    let mut m = a.clone();
    let mut x = b.to_vec();

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&r1, &r2| {
                m[[r1, col]]
                    .norm()
                    .partial_cmp(&m[[r2, col]].norm())
                    .expect("pivot magnitudes are finite")
            })
            .expect("non-empty pivot range");
        if m[[pivot_row, col]].norm() < threshold {
            return None;
        }

        if pivot_row != col {
            for c in 0..n {
                let tmp = m[[col, c]];
                m[[col, c]] = m[[pivot_row, c]];
                m[[pivot_row, c]] = tmp;
            }
            x.swap(col, pivot_row);
        }

        for row in (col + 1)..n {
            let factor = m[[row, col]] / m[[col, col]];
            for c in col..n {
                let sub = factor * m[[col, c]];
                m[[row, c]] -= sub;
            }
            let sub = factor * x[col];
            x[row] -= sub;
        }
    }

    for col in (0..n).rev() {
        let mut acc = x[col];
        for c in (col + 1)..n {
            acc -= m[[col, c]] * x[c];
        }
        x[col] = acc / m[[col, col]];
    }

    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn mul(h: &Array2<Complex64>, x: &[Complex64]) -> Vec<Complex64> {
        (0..h.nrows())
            .map(|i| (0..h.ncols()).map(|j| h[[i, j]] * x[j]).sum())
            .collect()
    }

    #[test]
    fn test_build_channel_matrix() {
        let mut pair = Vec::new();
        for idx in 0..4 {
            let mut r = Array2::zeros((2, 3));
            r[[1, 2]] = Complex64::new(idx as f64, -(idx as f64));
            pair.push(r);
        }

        let h = build_channel_matrix(&pair, 2, 2, 1, 2);
        assert_eq!(h.dim(), (2, 2));
        assert_eq!(h[[0, 0]], Complex64::new(0.0, 0.0));
        assert_eq!(h[[0, 1]], Complex64::new(1.0, -1.0));
        assert_eq!(h[[1, 0]], Complex64::new(2.0, -2.0));
        assert_eq!(h[[1, 1]], Complex64::new(3.0, -3.0));
    }

    #[test]
    fn test_square_zero_forcing_is_exact() {
        let h = array![
            [Complex64::new(1.0, 0.5), Complex64::new(-0.3, 0.8)],
            [Complex64::new(0.2, -1.1), Complex64::new(0.9, 0.4)]
        ];
        let x = vec![Complex64::new(1.0, 0.0), Complex64::new(-1.0, 0.0)];
        let y = mul(&h, &x);

        let eq = ZfEqualizer::new(2, 2).unwrap();
        let result = eq.equalize(&h, &y).unwrap();
        assert!(!result.regularized);
        for (a, b) in result.symbols.iter().zip(x.iter()) {
            assert!((a - b).norm() < 1e-10);
        }
    }

    #[test]
    fn test_least_squares_is_exact_for_consistent_system() {
        let h = array![
            [Complex64::new(1.0, 0.0), Complex64::new(0.4, 0.2)],
            [Complex64::new(-0.5, 0.7), Complex64::new(1.2, -0.1)],
            [Complex64::new(0.3, -0.3), Complex64::new(-0.8, 0.6)]
        ];
        let x = vec![Complex64::new(-1.0, 0.0), Complex64::new(1.0, 0.0)];
        let y = mul(&h, &x);

        let eq = ZfEqualizer::new(3, 2).unwrap();
        let result = eq.equalize(&h, &y).unwrap();
        assert!(!result.regularized);
        for (a, b) in result.symbols.iter().zip(x.iter()) {
            assert!((a - b).norm() < 1e-10);
        }
    }

    #[test]
    fn test_singular_matrix_is_regularized() {
        // Rank-1 channel: second row is a multiple of the first
        let h = array![
            [Complex64::new(1.0, 0.0), Complex64::new(2.0, 0.0)],
            [Complex64::new(2.0, 0.0), Complex64::new(4.0, 0.0)]
        ];
        let y = vec![Complex64::new(1.0, 0.0), Complex64::new(2.0, 0.0)];

        let eq = ZfEqualizer::new(2, 2).unwrap();
        let result = eq.equalize(&h, &y).unwrap();
        assert!(result.regularized);
        for s in &result.symbols {
            assert!(s.re.is_finite() && s.im.is_finite());
        }
    }

    #[test]
    fn test_geometry_checks() {
        assert!(ZfEqualizer::new(1, 2).is_err());
        assert!(ZfEqualizer::new(2, 0).is_err());
        assert!(ZfEqualizer::new(2, 2).is_ok());
        assert!(ZfEqualizer::new(3, 2).is_ok());

        let eq = ZfEqualizer::new(2, 2).unwrap();
        let h = Array2::<Complex64>::zeros((3, 2));
        assert!(eq.equalize(&h, &[Complex64::new(0.0, 0.0); 2]).is_err());
    }
}
