use crate::error::ConfigError;

/// Savitzky–Golay smoothing kernel.
///
/// Interior samples are a convolution with the least-squares weights of a
/// centred window. The first and last `window_length / 2` samples take the
/// value of the polynomial fitted to the first / last full window, so the
/// output has the same length as the input and no padding is invented.
#[derive(Debug, Clone)]
pub struct SavitzkyGolay {
    window_length: usize,
    polyorder: usize,
    center: Vec<f64>,
    leading: Vec<Vec<f64>>,
    trailing: Vec<Vec<f64>>,
}

impl SavitzkyGolay {
    pub fn new(window_length: usize, polyorder: usize) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidSmoothingParams {
            window_length,
            polyorder,
            reason: reason.to_string(),
        };
        if window_length % 2 == 0 {
            return Err(invalid("window_length must be a positive odd number"));
        }
        if polyorder >= window_length {
            return Err(invalid("polyorder must be less than window_length"));
        }

        let half = window_length / 2;
        let scale = half.max(1) as f64;
        let positions: Vec<f64> = (0..window_length)
            .map(|k| (k as f64 - half as f64) / scale)
            .collect();
        let fit = GramBasis::new(&positions, polyorder);

        let center = fit.weights_at(half);
        let leading = (0..half).map(|p| fit.weights_at(p)).collect();
        let trailing = (half + 1..window_length).map(|p| fit.weights_at(p)).collect();

        Ok(SavitzkyGolay {
            window_length,
            polyorder,
            center,
            leading,
            trailing,
        })
    }

    pub fn window_length(&self) -> usize {
        self.window_length
    }

    pub fn polyorder(&self) -> usize {
        self.polyorder
    }

    /// Rows shorter than the window cannot be smoothed.
    pub fn check_len(&self, len: usize) -> Result<(), ConfigError> {
        if self.window_length > len {
            return Err(ConfigError::InvalidSmoothingParams {
                window_length: self.window_length,
                polyorder: self.polyorder,
                reason: format!("window_length exceeds row length {len}"),
            });
        }
        Ok(())
    }

    /// Smooth one row. `values.len()` must be at least `window_length`.
    pub fn apply(&self, values: &[f64]) -> Vec<f64> {
        let n = values.len();
        let w = self.window_length;
        let half = w / 2;
        debug_assert!(n >= w);

        let mut out = Vec::with_capacity(n);
        let head = &values[..w];
        out.extend(self.leading.iter().map(|weights| dot(weights, head)));
        out.extend(values.windows(w).map(|window| dot(&self.center, window)));
        let tail = &values[n - w..];
        out.extend(self.trailing.iter().map(|weights| dot(weights, tail)));

        debug_assert_eq!(out.len(), half + (n - w + 1) + half);
        out
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

// ---------------------------------------------------------------------------
// Polynomial least squares over a fixed set of positions
// ---------------------------------------------------------------------------

/// Orthonormal basis of the polynomials of degree `<= order` sampled at the
/// window positions. `basis[j][k]` is the degree-`j` member at sample `k`.
///
/// Built by the Stieltjes recurrence (multiply the last member by `t`, then
/// orthogonalize), so the monomial Vandermonde matrix is never formed.
struct GramBasis {
    basis: Vec<Vec<f64>>,
}

impl GramBasis {
    fn new(positions: &[f64], order: usize) -> Self {
        let n = positions.len();
        let mut basis: Vec<Vec<f64>> = Vec::with_capacity(order + 1);
        basis.push(vec![1.0 / (n as f64).sqrt(); n]);

        for degree in 1..=order {
            let mut v: Vec<f64> = positions
                .iter()
                .zip(&basis[degree - 1])
                .map(|(t, q)| t * q)
                .collect();
            // Two passes: a single one loses orthogonality at high degree.
            for _ in 0..2 {
                for q in &basis {
                    let c = dot(q, &v);
                    for (vi, qi) in v.iter_mut().zip(q) {
                        *vi -= c * qi;
                    }
                }
            }
            // Distinct positions and degree < n keep the norm non-zero.
            let norm = dot(&v, &v).sqrt();
            for vi in &mut v {
                *vi /= norm;
            }
            basis.push(v);
        }
        GramBasis { basis }
    }

    /// Weights `w` such that `dot(w, y)` is the fitted polynomial at sample `p`:
    /// row `p` of the projection `Q Qᵀ`.
    fn weights_at(&self, p: usize) -> Vec<f64> {
        let n = self.basis[0].len();
        (0..n)
            .map(|k| self.basis.iter().map(|q| q[p] * q[k]).sum())
            .collect()
    }
}
