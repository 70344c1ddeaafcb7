//! Wavelength calibration from user marks on a lamp spectrum.

pub mod dispersion;
pub mod inference;
pub mod reference;

pub use dispersion::{DispersionError, DispersionSummary, dispersion_errors};
pub use inference::{
    CalibratedSample, FittingError, InferenceFunction, InferenceKind, build_inference_function,
    calibrate_intensities,
};
pub use reference::{
    DEFAULT_PEAK_WINDOW_FRACTION, ReferenceLine, ReferencePeak, filter_reference_lines,
    parse_reference_lines, snap_to_peak,
};

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPointPair {
    pub pixel: f64,
    pub wavelength: f64,
}

impl CalibrationPointPair {
    pub fn new(pixel: f64, wavelength: f64) -> Self {
        Self { pixel, wavelength }
    }
}

/// Pair lamp pixels with material wavelengths by index. Marks beyond the
/// shorter list are dropped.
pub fn pair_marks(lamp_pixels: &[f64], material_wavelengths: &[f64]) -> Vec<CalibrationPointPair> {
    if lamp_pixels.len() != material_wavelengths.len() {
        debug!(
            lamp_marks = lamp_pixels.len(),
            material_marks = material_wavelengths.len(),
            "unpaired calibration marks are ignored"
        );
    }
    lamp_pixels
        .iter()
        .zip(material_wavelengths)
        .map(|(pixel, wavelength)| CalibrationPointPair::new(*pixel, *wavelength))
        .collect()
}
