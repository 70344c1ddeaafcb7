use super::CalibrationPointPair;
use crate::numerics::fitting::{CurveKind, FitError, FittedCurve, fit};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InferenceKind {
    #[default]
    Linear,
    PiecewiseLinear,
    Legendre,
}

impl InferenceKind {
    pub const fn needs_degree(self) -> bool {
        matches!(self, Self::Legendre)
    }

    const fn curve_kind(self) -> CurveKind {
        match self {
            Self::Linear => CurveKind::Linear,
            Self::PiecewiseLinear => CurveKind::PiecewiseLinear,
            Self::Legendre => CurveKind::Legendre,
        }
    }
}

/// Calibration failure handed back to the caller as a value, so a missing
/// function can be rendered instead of aborting.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct FittingError {
    pub kind: FitError,
    pub message: String,
}

impl From<FitError> for FittingError {
    fn from(kind: FitError) -> Self {
        let message = match &kind {
            FitError::InsufficientPoints { actual } => format!(
                "at least two lamp/material mark pairs are needed, got {actual}"
            ),
            other => other.to_string(),
        };
        Self { kind, message }
    }
}

/// Pixel to wavelength mapping of one lamp spectrum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceFunction {
    pub kind: InferenceKind,
    pub curve: FittedCurve,
}

impl InferenceFunction {
    pub fn wavelength_at(&self, pixel: f64) -> f64 {
        self.curve.evaluate(pixel)
    }

    /// Local dispersion in wavelength units per pixel.
    pub fn dispersion_at(&self, pixel: f64) -> f64 {
        self.curve.derivative(pixel)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibratedSample {
    pub wavelength: f64,
    pub intensity: f64,
}

/// Fit `pixel -> wavelength` through the paired marks. `degree` is only
/// used by [`InferenceKind::Legendre`].
pub fn build_inference_function(
    kind: InferenceKind,
    pairs: &[CalibrationPointPair],
    degree: Option<usize>,
) -> Result<InferenceFunction, FittingError> {
    let pixels: Vec<f64> = pairs.iter().map(|pair| pair.pixel).collect();
    let wavelengths: Vec<f64> = pairs.iter().map(|pair| pair.wavelength).collect();
    let degree = if kind.needs_degree() { degree } else { None };

    let curve = fit(kind.curve_kind(), &pixels, &wavelengths, degree)?;
    Ok(InferenceFunction { kind, curve })
}

/// Wavelength axis for a persisted intensity profile: sample `i` sits at
/// pixel `i`.
pub fn calibrate_intensities(
    function: &InferenceFunction,
    intensities: &[f64],
) -> Vec<CalibratedSample> {
    intensities
        .iter()
        .enumerate()
        .map(|(pixel, intensity)| CalibratedSample {
            wavelength: function.wavelength_at(pixel as f64),
            intensity: *intensity,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{InferenceKind, build_inference_function, calibrate_intensities};
    use crate::calibration::{CalibrationPointPair, pair_marks};
    use crate::numerics::fitting::FitError;

    #[test]
    fn two_marks_give_unit_dispersion() {
        let pairs = pair_marks(&[10.0, 20.0], &[5000.0, 5010.0]);
        let function =
            build_inference_function(InferenceKind::Linear, &pairs, None).expect("linear");

        assert!((function.dispersion_at(0.0) - 1.0).abs() < 1.0e-12);
        assert!((function.wavelength_at(15.0) - 5005.0).abs() < 1.0e-9);
    }

    #[test]
    fn single_mark_is_reported_as_a_value() {
        let pairs = [CalibrationPointPair::new(10.0, 5000.0)];
        let error = build_inference_function(InferenceKind::PiecewiseLinear, &pairs, None)
            .expect_err("one mark");

        assert_eq!(error.kind, FitError::InsufficientPoints { actual: 1 });
        assert_eq!(
            error.to_string(),
            "at least two lamp/material mark pairs are needed, got 1"
        );
    }

    #[test]
    fn legendre_needs_a_degree() {
        let pairs = pair_marks(&[1.0, 2.0, 3.0], &[10.0, 20.0, 35.0]);
        let error = build_inference_function(InferenceKind::Legendre, &pairs, None)
            .expect_err("no degree");
        assert_eq!(error.kind, FitError::DegreeUndefined);

        let function = build_inference_function(InferenceKind::Legendre, &pairs, Some(2))
            .expect("quadratic");
        assert!((function.wavelength_at(3.0) - 35.0).abs() < 1.0e-9);
    }

    #[test]
    fn degree_is_ignored_for_non_polynomial_kinds() {
        let pairs = pair_marks(&[1.0, 2.0], &[10.0, 20.0]);
        assert!(build_inference_function(InferenceKind::Linear, &pairs, Some(9)).is_ok());
    }

    #[test]
    fn intensities_are_placed_on_the_wavelength_axis() {
        let pairs = pair_marks(&[0.0, 10.0], &[4000.0, 4020.0]);
        let function =
            build_inference_function(InferenceKind::Linear, &pairs, None).expect("linear");
        let calibrated = calibrate_intensities(&function, &[7.0, 8.0, 9.0]);

        assert_eq!(calibrated.len(), 3);
        assert!((calibrated[2].wavelength - 4004.0).abs() < 1.0e-9);
        assert_eq!(calibrated[1].intensity, 8.0);
    }
}
