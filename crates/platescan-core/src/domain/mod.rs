pub mod errors;

pub use errors::{EngineError, EngineResult, ErrorCategory};

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpectrumKind {
    Science,
    Lamp,
}

impl SpectrumKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Science => "science",
            Self::Lamp => "lamp",
        }
    }
}

impl Display for SpectrumKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// A spectrum bounding box on the plate, in raster pixel coordinates.
///
/// Coordinates are kept as drawn (fractional); they are floored when the
/// box is turned into pixel bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rectangle {
    pub id: String,
    pub kind: SpectrumKind,
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rectangle {
    pub fn new(
        id: impl Into<String>,
        kind: SpectrumKind,
        top: f64,
        left: f64,
        width: f64,
        height: f64,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            top,
            left,
            width,
            height,
        }
    }

    pub fn science(id: impl Into<String>, top: f64, left: f64, width: f64, height: f64) -> Self {
        Self::new(id, SpectrumKind::Science, top, left, width, height)
    }

    pub fn lamp(id: impl Into<String>, top: f64, left: f64, width: f64, height: f64) -> Self {
        Self::new(id, SpectrumKind::Lamp, top, left, width, height)
    }

    pub fn is_principal(&self) -> bool {
        self.kind == SpectrumKind::Science
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn is_finite(&self) -> bool {
        [self.top, self.left, self.width, self.height]
            .iter()
            .all(|value| value.is_finite())
    }

    /// Same placement and size, ignoring id and kind.
    pub fn same_geometry(&self, other: &Rectangle) -> bool {
        self.top == other.top
            && self.left == other.left
            && self.width == other.width
            && self.height == other.height
    }

    /// Integer pixel bounds `(left, top, width, height)` clipped to a
    /// `raster_width x raster_height` raster, or `None` when nothing of the
    /// box falls inside it or any coordinate is non-finite.
    pub fn pixel_bounds(
        &self,
        raster_width: usize,
        raster_height: usize,
    ) -> Option<PixelBounds> {
        if !self.is_finite() {
            return None;
        }
        let left = self.left.floor().max(0.0);
        let top = self.top.floor().max(0.0);
        let right = (self.left.floor() + self.width.floor()).min(raster_width as f64);
        let bottom = (self.top.floor() + self.height.floor()).min(raster_height as f64);
        if !(right > left && bottom > top) {
            return None;
        }

        Some(PixelBounds {
            left: left as usize,
            top: top as usize,
            width: (right - left) as usize,
            height: (bottom - top) as usize,
        })
    }

    /// Top-to-bottom, then left-to-right ordering used to list spectra on a
    /// plate.
    pub fn reading_order(&self, other: &Rectangle) -> Ordering {
        self.top
            .total_cmp(&other.top)
            .then_with(|| self.left.total_cmp(&other.left))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelBounds {
    pub left: usize,
    pub top: usize,
    pub width: usize,
    pub height: usize,
}

impl PixelBounds {
    pub fn right(&self) -> usize {
        self.left + self.width
    }

    pub fn bottom(&self) -> usize {
        self.top + self.height
    }
}

/// Function used to model a spectrum's centerline through its checkpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TraceFit {
    #[default]
    Linear,
    QuadraticSpline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractionSettings {
    pub checkpoint_count: usize,
    pub aperture_coefficient: f64,
    pub segment_width: usize,
    pub threshold_fraction: f64,
    pub reuse_mode: bool,
    pub trace_fit: TraceFit,
    pub mask_fill: f32,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            checkpoint_count: 5,
            aperture_coefficient: 1.0,
            segment_width: 100,
            threshold_fraction: 0.5,
            reuse_mode: false,
            trace_fit: TraceFit::Linear,
            mask_fill: 0.0,
        }
    }
}

impl ExtractionSettings {
    pub const MIN_CHECKPOINTS: usize = 2;
    pub const MIN_APERTURE_COEFFICIENT: f64 = 0.01;

    pub fn validate(&self) -> EngineResult<()> {
        if self.checkpoint_count < Self::MIN_CHECKPOINTS {
            return Err(EngineError::invalid_settings(
                "checkpointCount",
                format!(
                    "at least {} checkpoints are required, got {}",
                    Self::MIN_CHECKPOINTS,
                    self.checkpoint_count
                ),
            ));
        }
        if !self.aperture_coefficient.is_finite()
            || self.aperture_coefficient < Self::MIN_APERTURE_COEFFICIENT
        {
            return Err(EngineError::invalid_settings(
                "apertureCoefficient",
                format!(
                    "must be finite and >= {}, got {}",
                    Self::MIN_APERTURE_COEFFICIENT,
                    self.aperture_coefficient
                ),
            ));
        }
        if self.segment_width == 0 {
            return Err(EngineError::invalid_settings(
                "segmentWidth",
                "must be greater than zero",
            ));
        }
        if !(self.threshold_fraction > 0.0 && self.threshold_fraction <= 1.0) {
            return Err(EngineError::invalid_settings(
                "thresholdFraction",
                format!("must lie in (0, 1], got {}", self.threshold_fraction),
            ));
        }
        if !self.mask_fill.is_finite() {
            return Err(EngineError::invalid_settings(
                "maskFill",
                format!("must be finite, got {}", self.mask_fill),
            ));
        }

        Ok(())
    }
}
