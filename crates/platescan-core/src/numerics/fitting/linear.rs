use super::{CurveFunction, FitError, validate_samples};
use serde::{Deserialize, Serialize};

/// Ordinary least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn fit(xs: &[f64], ys: &[f64]) -> Result<Self, FitError> {
        validate_samples(xs, ys)?;

        let count = xs.len() as f64;
        let mean_x = xs.iter().sum::<f64>() / count;
        let mean_y = ys.iter().sum::<f64>() / count;
        let (sxx, sxy) = xs
            .iter()
            .zip(ys)
            .fold((0.0, 0.0), |(sxx, sxy), (x, y)| {
                let dx = x - mean_x;
                (sxx + dx * dx, sxy + dx * (y - mean_y))
            });
        if sxx == 0.0 {
            return Err(FitError::DegenerateDomain { value: xs[0] });
        }

        let slope = sxy / sxx;
        Ok(Self {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    /// Line through two points with distinct abscissae.
    pub(crate) fn through(first: (f64, f64), second: (f64, f64)) -> Self {
        let slope = (second.1 - first.1) / (second.0 - first.0);
        Self {
            slope,
            intercept: first.1 - slope * first.0,
        }
    }
}

impl CurveFunction for LinearFit {
    fn evaluate(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    fn derivative(&self, _x: f64) -> f64 {
        self.slope
    }
}
