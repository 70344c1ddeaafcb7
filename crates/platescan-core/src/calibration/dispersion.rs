use super::CalibrationPointPair;
use super::inference::InferenceFunction;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DispersionError {
    pub wavelength: f64,
    pub error: f64,
}

/// Residual `wavelength - f(pixel)` of every mark pair. Display only.
pub fn dispersion_errors(
    function: &InferenceFunction,
    pairs: &[CalibrationPointPair],
) -> Vec<DispersionError> {
    pairs
        .iter()
        .map(|pair| DispersionError {
            wavelength: pair.wavelength,
            error: pair.wavelength - function.wavelength_at(pair.pixel),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispersionSummary {
    pub count: usize,
    pub mean: f64,
    pub rms: f64,
    pub max_abs: f64,
}

impl DispersionSummary {
    pub fn from_errors(errors: &[DispersionError]) -> Option<Self> {
        if errors.is_empty() {
            return None;
        }
        let count = errors.len() as f64;
        let mean = errors.iter().map(|e| e.error).sum::<f64>() / count;
        let rms = (errors.iter().map(|e| e.error * e.error).sum::<f64>() / count).sqrt();
        let max_abs = errors.iter().map(|e| e.error.abs()).fold(0.0, f64::max);

        Some(Self {
            count: errors.len(),
            mean,
            rms,
            max_abs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{DispersionError, DispersionSummary, dispersion_errors};
    use crate::calibration::{InferenceKind, build_inference_function, pair_marks};

    #[test]
    fn exact_fit_has_zero_errors() {
        let pairs = pair_marks(&[10.0, 20.0], &[5000.0, 5010.0]);
        let function =
            build_inference_function(InferenceKind::Linear, &pairs, None).expect("linear");
        let errors = dispersion_errors(&function, &pairs);

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].wavelength, 5000.0);
        assert!(errors.iter().all(|e| e.error.abs() < 1.0e-9));
    }

    #[test]
    fn residuals_follow_the_least_squares_line() {
        let pairs = pair_marks(&[0.0, 1.0, 2.0, 3.0], &[1.0, 3.0, 2.0, 4.0]);
        let function =
            build_inference_function(InferenceKind::Linear, &pairs, None).expect("linear");
        let errors = dispersion_errors(&function, &pairs);

        let expected = [-0.3, 0.9, -0.9, 0.3];
        for (error, expected) in errors.iter().zip(expected) {
            assert!((error.error - expected).abs() < 1.0e-12);
        }
    }

    #[test]
    fn summary_reports_mean_rms_and_peak() {
        let errors = [
            DispersionError {
                wavelength: 1.0,
                error: 3.0,
            },
            DispersionError {
                wavelength: 2.0,
                error: -4.0,
            },
        ];
        let summary = DispersionSummary::from_errors(&errors).expect("summary");

        assert_eq!(summary.count, 2);
        assert!((summary.mean + 0.5).abs() < 1.0e-12);
        assert!((summary.rms - 12.5_f64.sqrt()).abs() < 1.0e-12);
        assert_eq!(summary.max_abs, 4.0);
        assert!(DispersionSummary::from_errors(&[]).is_none());
    }
}
