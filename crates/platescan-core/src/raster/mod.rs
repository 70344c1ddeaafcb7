//! Single-channel raster normalization.
//!
//! Every byte layout the scanning front end hands over (plain gray samples,
//! 8-bit gray, 8-bit RGBA) is converted once into a [`PixelBuffer`]; the
//! rest of the engine only ever reads through `sample(x, y)`.

pub mod mask;

pub use mask::{MaskPatch, erase, erase_patch, restore};

use crate::domain::PixelBounds;
use serde::{Deserialize, Serialize};

const LUMA_RED: f32 = 0.2989;
const LUMA_GREEN: f32 = 0.587;
const LUMA_BLUE: f32 = 0.114;
const RGBA_CHANNELS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RasterError {
    #[error("raster dimensions must be non-zero, got {width}x{height}")]
    EmptyRaster { width: usize, height: usize },
    #[error("raster {width}x{height} expects {expected} samples, got {actual}")]
    SampleCountMismatch {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },
    #[error("raster is {actual_width}x{actual_height}, expected {expected_width}x{expected_height}")]
    DimensionMismatch {
        expected_width: usize,
        expected_height: usize,
        actual_width: usize,
        actual_height: usize,
    },
    #[error("raster sample at index {index} is not finite")]
    NonFiniteSample { index: usize },
    #[error("crop {width}x{height}+{left}+{top} exceeds raster {raster_width}x{raster_height}")]
    CropOutOfBounds {
        left: usize,
        top: usize,
        width: usize,
        height: usize,
        raster_width: usize,
        raster_height: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GraySamples")]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    samples: Vec<f32>,
}

/// Wire form; decoding re-runs the [`PixelBuffer::from_gray`] checks.
#[derive(Deserialize)]
struct GraySamples {
    width: usize,
    height: usize,
    samples: Vec<f32>,
}

impl TryFrom<GraySamples> for PixelBuffer {
    type Error = RasterError;

    fn try_from(raw: GraySamples) -> Result<Self, Self::Error> {
        Self::from_gray(raw.width, raw.height, raw.samples)
    }
}

impl PixelBuffer {
    pub fn from_gray(width: usize, height: usize, samples: Vec<f32>) -> Result<Self, RasterError> {
        validate_shape(width, height, samples.len(), 1)?;
        if let Some(index) = samples.iter().position(|value| !value.is_finite()) {
            return Err(RasterError::NonFiniteSample { index });
        }

        Ok(Self {
            width,
            height,
            samples,
        })
    }

    pub fn from_gray8(width: usize, height: usize, bytes: &[u8]) -> Result<Self, RasterError> {
        validate_shape(width, height, bytes.len(), 1)?;
        Ok(Self {
            width,
            height,
            samples: bytes.iter().map(|value| f32::from(*value)).collect(),
        })
    }

    /// Interleaved RGBA bytes reduced to luma; alpha is ignored.
    pub fn from_rgba8(width: usize, height: usize, bytes: &[u8]) -> Result<Self, RasterError> {
        validate_shape(width, height, bytes.len(), RGBA_CHANNELS)?;
        let samples = bytes
            .chunks_exact(RGBA_CHANNELS)
            .map(|pixel| {
                LUMA_RED * f32::from(pixel[0])
                    + LUMA_GREEN * f32::from(pixel[1])
                    + LUMA_BLUE * f32::from(pixel[2])
            })
            .collect();

        Ok(Self {
            width,
            height,
            samples,
        })
    }

    pub fn filled(width: usize, height: usize, value: f32) -> Result<Self, RasterError> {
        Self::from_gray(width, height, vec![value; width * height])
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Panics when `(x, y)` lies outside the raster.
    pub fn sample(&self, x: usize, y: usize) -> f32 {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} raster",
            self.width,
            self.height
        );
        self.samples[y * self.width + x]
    }

    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        (x < self.width && y < self.height).then(|| self.samples[y * self.width + x])
    }

    pub fn row(&self, y: usize) -> &[f32] {
        let start = y * self.width;
        &self.samples[start..start + self.width]
    }

    pub fn crop(&self, bounds: PixelBounds) -> Result<PixelBuffer, RasterError> {
        if bounds.width == 0
            || bounds.height == 0
            || bounds.right() > self.width
            || bounds.bottom() > self.height
        {
            return Err(RasterError::CropOutOfBounds {
                left: bounds.left,
                top: bounds.top,
                width: bounds.width,
                height: bounds.height,
                raster_width: self.width,
                raster_height: self.height,
            });
        }

        let mut samples = Vec::with_capacity(bounds.width * bounds.height);
        for y in bounds.top..bounds.bottom() {
            samples.extend_from_slice(&self.row(y)[bounds.left..bounds.right()]);
        }

        Ok(PixelBuffer {
            width: bounds.width,
            height: bounds.height,
            samples,
        })
    }

    pub(crate) fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }
}

fn validate_shape(
    width: usize,
    height: usize,
    actual: usize,
    channels: usize,
) -> Result<(), RasterError> {
    if width == 0 || height == 0 {
        return Err(RasterError::EmptyRaster { width, height });
    }
    let expected = width * height * channels;
    if actual != expected {
        return Err(RasterError::SampleCountMismatch {
            width,
            height,
            expected,
            actual,
        });
    }
    Ok(())
}
