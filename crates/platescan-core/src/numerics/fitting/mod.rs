//! One-dimensional curve fitting behind a single entry point.
//!
//! Every strategy returns a value that can be evaluated and differentiated
//! anywhere on the real line; how it behaves outside the sampled domain is
//! strategy specific.

pub mod legendre;
pub mod linear;
pub mod piecewise;
pub mod spline;

pub use legendre::LegendreFit;
pub use linear::LinearFit;
pub use piecewise::PiecewiseLinearFit;
pub use spline::QuadraticSplineFit;

use super::linalg::LuError;
use serde::{Deserialize, Serialize};

pub const MIN_FIT_POINTS: usize = 2;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    #[error("curve fitting requires at least {min} points, got {actual}", min = MIN_FIT_POINTS)]
    InsufficientPoints { actual: usize },
    #[error("curve fitting input length mismatch: xs={xs}, ys={ys}")]
    MismatchedLength { xs: usize, ys: usize },
    #[error("a Legendre fit requires a polynomial degree of at least 1")]
    DegreeUndefined,
    #[error("a degree {degree} Legendre fit requires at least {} points, got {points}", .degree + 1)]
    DegreeTooHigh { degree: usize, points: usize },
    #[error("all abscissae coincide at {value}; the slope is undefined")]
    DegenerateDomain { value: f64 },
    #[error("abscissa {value} appears more than once")]
    DuplicateAbscissa { value: f64 },
    #[error("sample at index {index} is not finite")]
    NonFiniteInput { index: usize },
    #[error("fit system could not be solved: {0}")]
    SingularSystem(#[from] LuError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CurveKind {
    Linear,
    PiecewiseLinear,
    QuadraticSpline,
    Legendre,
}

impl CurveKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::PiecewiseLinear => "piecewiseLinear",
            Self::QuadraticSpline => "quadraticSpline",
            Self::Legendre => "legendre",
        }
    }
}

/// Shared evaluation surface of every fitted curve.
pub trait CurveFunction {
    fn evaluate(&self, x: f64) -> f64;
    fn derivative(&self, x: f64) -> f64;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FittedCurve {
    Linear(LinearFit),
    PiecewiseLinear(PiecewiseLinearFit),
    QuadraticSpline(QuadraticSplineFit),
    Legendre(LegendreFit),
}

impl FittedCurve {
    pub const fn kind(&self) -> CurveKind {
        match self {
            Self::Linear(_) => CurveKind::Linear,
            Self::PiecewiseLinear(_) => CurveKind::PiecewiseLinear,
            Self::QuadraticSpline(_) => CurveKind::QuadraticSpline,
            Self::Legendre(_) => CurveKind::Legendre,
        }
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        CurveFunction::evaluate(self, x)
    }

    pub fn derivative(&self, x: f64) -> f64 {
        CurveFunction::derivative(self, x)
    }
}

impl CurveFunction for FittedCurve {
    fn evaluate(&self, x: f64) -> f64 {
        match self {
            Self::Linear(curve) => curve.evaluate(x),
            Self::PiecewiseLinear(curve) => curve.evaluate(x),
            Self::QuadraticSpline(curve) => curve.evaluate(x),
            Self::Legendre(curve) => curve.evaluate(x),
        }
    }

    fn derivative(&self, x: f64) -> f64 {
        match self {
            Self::Linear(curve) => curve.derivative(x),
            Self::PiecewiseLinear(curve) => curve.derivative(x),
            Self::QuadraticSpline(curve) => curve.derivative(x),
            Self::Legendre(curve) => curve.derivative(x),
        }
    }
}

/// `degree` is only read by [`CurveKind::Legendre`].
pub fn fit(
    kind: CurveKind,
    xs: &[f64],
    ys: &[f64],
    degree: Option<usize>,
) -> Result<FittedCurve, FitError> {
    match kind {
        CurveKind::Linear => LinearFit::fit(xs, ys).map(FittedCurve::Linear),
        CurveKind::PiecewiseLinear => {
            PiecewiseLinearFit::fit(xs, ys).map(FittedCurve::PiecewiseLinear)
        }
        CurveKind::QuadraticSpline => {
            QuadraticSplineFit::fit(xs, ys).map(FittedCurve::QuadraticSpline)
        }
        CurveKind::Legendre => LegendreFit::fit(xs, ys, degree).map(FittedCurve::Legendre),
    }
}

pub(crate) fn validate_samples(xs: &[f64], ys: &[f64]) -> Result<(), FitError> {
    if xs.len() != ys.len() {
        return Err(FitError::MismatchedLength {
            xs: xs.len(),
            ys: ys.len(),
        });
    }
    if xs.len() < MIN_FIT_POINTS {
        return Err(FitError::InsufficientPoints { actual: xs.len() });
    }
    if let Some(index) = xs
        .iter()
        .zip(ys)
        .position(|(x, y)| !x.is_finite() || !y.is_finite())
    {
        return Err(FitError::NonFiniteInput { index });
    }
    Ok(())
}

/// Points sorted by abscissa, rejecting repeated abscissae.
pub(crate) fn sorted_distinct_points(xs: &[f64], ys: &[f64]) -> Result<Vec<(f64, f64)>, FitError> {
    let mut points: Vec<(f64, f64)> = xs.iter().copied().zip(ys.iter().copied()).collect();
    points.sort_by(|lhs, rhs| lhs.0.total_cmp(&rhs.0));

    if let Some(pair) = points.windows(2).find(|pair| pair[0].0 == pair[1].0) {
        if points.iter().all(|point| point.0 == pair[0].0) {
            return Err(FitError::DegenerateDomain { value: pair[0].0 });
        }
        return Err(FitError::DuplicateAbscissa { value: pair[0].0 });
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::{CurveKind, FitError, FittedCurve, fit};

    #[test]
    fn every_kind_rejects_a_single_point() {
        for kind in [
            CurveKind::Linear,
            CurveKind::PiecewiseLinear,
            CurveKind::QuadraticSpline,
            CurveKind::Legendre,
        ] {
            let error = fit(kind, &[1.0], &[2.0], Some(1)).expect_err("one point");
            assert_eq!(error, FitError::InsufficientPoints { actual: 1 }, "{kind:?}");
        }
    }

    #[test]
    fn every_kind_rejects_mismatched_lengths() {
        for kind in [
            CurveKind::Linear,
            CurveKind::PiecewiseLinear,
            CurveKind::QuadraticSpline,
            CurveKind::Legendre,
        ] {
            let error = fit(kind, &[1.0, 2.0, 3.0], &[2.0, 3.0], Some(1)).expect_err("mismatch");
            assert_eq!(error, FitError::MismatchedLength { xs: 3, ys: 2 }, "{kind:?}");
        }
    }

    #[test]
    fn non_finite_samples_are_rejected() {
        let error = fit(CurveKind::Linear, &[1.0, f64::NAN], &[1.0, 2.0], None)
            .expect_err("NaN abscissa");
        assert_eq!(error, FitError::NonFiniteInput { index: 1 });
    }

    #[test]
    fn dispatch_preserves_the_requested_kind() {
        let xs = [0.0, 1.0, 2.0, 4.0];
        let ys = [1.0, 3.0, 2.0, 5.0];
        for kind in [
            CurveKind::Linear,
            CurveKind::PiecewiseLinear,
            CurveKind::QuadraticSpline,
            CurveKind::Legendre,
        ] {
            let curve = fit(kind, &xs, &ys, Some(2)).expect("fit");
            assert_eq!(curve.kind(), kind);
        }
    }

    #[test]
    fn fitted_curves_round_trip_through_json() {
        let curve = fit(CurveKind::QuadraticSpline, &[0.0, 1.0, 3.0], &[0.0, 2.0, 1.0], None)
            .expect("spline fit");
        let json = serde_json::to_string(&curve).expect("serialize");
        assert!(json.contains(r#""kind":"quadraticSpline""#), "{json}");

        let decoded: FittedCurve = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded.kind(), CurveKind::QuadraticSpline);
        for x in [-1.0, 0.5, 2.0, 4.0] {
            assert!((decoded.evaluate(x) - curve.evaluate(x)).abs() < 1.0e-9);
        }
    }
}
