use super::{CurveFunction, FitError, validate_samples};
use crate::numerics::linalg::{DenseMatrix, lu_solve};
use serde::{Deserialize, Serialize};

/// Least-squares Legendre series on abscissae mapped into `[-1, 1]` by the
/// observed minimum and maximum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendreFit {
    pub coefficients: Vec<f64>,
    pub domain_min: f64,
    pub domain_max: f64,
}

impl LegendreFit {
    pub fn fit(xs: &[f64], ys: &[f64], degree: Option<usize>) -> Result<Self, FitError> {
        validate_samples(xs, ys)?;
        let degree = match degree {
            Some(degree) if degree > 0 => degree,
            _ => return Err(FitError::DegreeUndefined),
        };
        if degree >= xs.len() {
            return Err(FitError::DegreeTooHigh {
                degree,
                points: xs.len(),
            });
        }

        let domain_min = xs.iter().copied().fold(f64::INFINITY, f64::min);
        let domain_max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if domain_max == domain_min {
            return Err(FitError::DegenerateDomain { value: domain_min });
        }

        let terms = degree + 1;
        let mut normal = DenseMatrix::zeros(terms, terms);
        let mut moment = vec![0.0; terms];
        let mut basis = vec![0.0; terms];
        for (x, y) in xs.iter().zip(ys) {
            legendre_values(rescale(*x, domain_min, domain_max), &mut basis);
            for row in 0..terms {
                moment[row] += basis[row] * y;
                for col in 0..terms {
                    normal[(row, col)] += basis[row] * basis[col];
                }
            }
        }

        let coefficients = lu_solve(&normal, &moment)?;
        Ok(Self {
            coefficients,
            domain_min,
            domain_max,
        })
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }
}

impl CurveFunction for LegendreFit {
    fn evaluate(&self, x: f64) -> f64 {
        let mut basis = vec![0.0; self.coefficients.len()];
        legendre_values(rescale(x, self.domain_min, self.domain_max), &mut basis);
        basis
            .iter()
            .zip(&self.coefficients)
            .map(|(p, c)| p * c)
            .sum()
    }

    fn derivative(&self, x: f64) -> f64 {
        let terms = self.coefficients.len();
        let mut basis = vec![0.0; terms];
        let t = rescale(x, self.domain_min, self.domain_max);
        legendre_values(t, &mut basis);

        // P'_k = P'_{k-2} + (2k - 1) P_{k-1}
        let mut slopes = vec![0.0; terms];
        for k in 1..terms {
            let previous = if k >= 2 { slopes[k - 2] } else { 0.0 };
            slopes[k] = previous + (2 * k - 1) as f64 * basis[k - 1];
        }

        let chain = 2.0 / (self.domain_max - self.domain_min);
        chain
            * slopes
                .iter()
                .zip(&self.coefficients)
                .map(|(dp, c)| dp * c)
                .sum::<f64>()
    }
}

fn rescale(x: f64, min: f64, max: f64) -> f64 {
    2.0 * (x - min) / (max - min) - 1.0
}

/// Fills `out[k] = P_k(t)` by the three-term recurrence.
fn legendre_values(t: f64, out: &mut [f64]) {
    for k in 0..out.len() {
        out[k] = match k {
            0 => 1.0,
            1 => t,
            _ => {
                let k_f = k as f64;
                ((2.0 * k_f - 1.0) * t * out[k - 1] - (k_f - 1.0) * out[k - 2]) / k_f
            }
        };
    }
}
