//! Masking of already-accounted-for spectra.
//!
//! All operations return a fresh [`PixelBuffer`]; the input raster is only
//! ever read.

use super::{PixelBuffer, RasterError};
use crate::domain::{PixelBounds, Rectangle};
use serde::{Deserialize, Serialize};

/// Footprint of an aperture band in crop coordinates: for every crop column
/// `x`, rows `row_start[x]..row_end[x]` belong to the patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "MaskPatchFields")]
pub struct MaskPatch {
    width: usize,
    height: usize,
    bands: Vec<(usize, usize)>,
}

/// Wire form; decoding goes through [`MaskPatch::from_bands`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MaskPatchFields {
    width: usize,
    height: usize,
    bands: Vec<(usize, usize)>,
}

impl From<MaskPatchFields> for MaskPatch {
    fn from(fields: MaskPatchFields) -> Self {
        Self::from_bands(fields.width, fields.height, fields.bands)
    }
}

impl MaskPatch {
    pub fn from_bands(width: usize, height: usize, bands: Vec<(usize, usize)>) -> Self {
        let bands = bands
            .into_iter()
            .map(|(start, end)| {
                let end = end.min(height);
                (start.min(end), end)
            })
            .collect();
        Self {
            width,
            height,
            bands,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Row range `[start, end)` per crop column.
    pub fn bands(&self) -> &[(usize, usize)] {
        &self.bands
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        self.bands
            .get(x)
            .is_some_and(|(start, end)| y >= *start && y < *end)
    }

    pub fn pixel_count(&self) -> usize {
        self.bands.iter().map(|(start, end)| end - start).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pixel_count() == 0
    }
}

/// Copy of `raster` with the rectangle's footprint (clipped to the raster)
/// replaced by `fill`.
pub fn erase(raster: &PixelBuffer, rectangle: &Rectangle, fill: f32) -> PixelBuffer {
    let mut erased = raster.clone();
    if let Some(bounds) = rectangle.pixel_bounds(raster.width(), raster.height()) {
        let width = erased.width();
        let samples = erased.samples_mut();
        for y in bounds.top..bounds.bottom() {
            samples[y * width + bounds.left..y * width + bounds.right()].fill(fill);
        }
    }
    erased
}

/// Copy of `raster` with only the patch's pixels replaced by `fill`. The
/// patch is anchored at the rectangle's top-left pixel.
pub fn erase_patch(
    raster: &PixelBuffer,
    rectangle: &Rectangle,
    patch: &MaskPatch,
    fill: f32,
) -> PixelBuffer {
    let mut erased = raster.clone();
    let Some(bounds) = rectangle.pixel_bounds(raster.width(), raster.height()) else {
        return erased;
    };

    let width = erased.width();
    let samples = erased.samples_mut();
    for (x, (start, end)) in patch.bands.iter().enumerate().take(bounds.width) {
        let end = (*end).min(bounds.height);
        for y in (*start).min(end)..end {
            samples[(bounds.top + y) * width + bounds.left + x] = fill;
        }
    }
    erased
}

/// Composite the original pixels under the rectangle's footprint back onto
/// `erased`.
pub fn restore(
    erased: &PixelBuffer,
    original: &PixelBuffer,
    rectangle: &Rectangle,
) -> Result<PixelBuffer, RasterError> {
    if erased.width() != original.width() || erased.height() != original.height() {
        return Err(RasterError::DimensionMismatch {
            expected_width: original.width(),
            expected_height: original.height(),
            actual_width: erased.width(),
            actual_height: erased.height(),
        });
    }

    let mut restored = erased.clone();
    if let Some(PixelBounds {
        left,
        top,
        width: footprint_width,
        height: footprint_height,
    }) = rectangle.pixel_bounds(original.width(), original.height())
    {
        let width = original.width();
        let samples = restored.samples_mut();
        for y in top..top + footprint_height {
            let range = y * width + left..y * width + left + footprint_width;
            samples[range.clone()].copy_from_slice(&original.samples()[range]);
        }
    }
    Ok(restored)
}

#[cfg(test)]
mod tests {
    use super::{MaskPatch, erase, erase_patch, restore};
    use crate::domain::Rectangle;
    use crate::raster::{PixelBuffer, RasterError};

    fn gradient(width: usize, height: usize) -> PixelBuffer {
        let samples = (0..width * height).map(|index| index as f32 + 1.0).collect();
        PixelBuffer::from_gray(width, height, samples).expect("gradient raster")
    }

    #[test]
    fn erase_fills_only_the_footprint() {
        let raster = gradient(6, 5);
        let rectangle = Rectangle::lamp("l", 1.0, 2.0, 3.0, 2.0);
        let erased = erase(&raster, &rectangle, 0.0);

        for y in 0..5 {
            for x in 0..6 {
                let inside = (2..5).contains(&x) && (1..3).contains(&y);
                if inside {
                    assert_eq!(erased.sample(x, y), 0.0);
                } else {
                    assert_eq!(erased.sample(x, y), raster.sample(x, y));
                }
            }
        }
    }

    #[test]
    fn erase_leaves_its_input_untouched() {
        let raster = gradient(4, 4);
        let snapshot = raster.clone();
        let _ = erase(&raster, &Rectangle::lamp("l", 0.0, 0.0, 4.0, 4.0), -1.0);
        assert_eq!(raster, snapshot);
    }

    #[test]
    fn erase_clips_rectangles_hanging_off_the_raster() {
        let raster = gradient(4, 4);
        let erased = erase(&raster, &Rectangle::lamp("l", 2.0, 2.0, 10.0, 10.0), 0.0);
        assert_eq!(erased.sample(3, 3), 0.0);
        assert_eq!(erased.sample(1, 1), raster.sample(1, 1));
    }

    #[test]
    fn restore_round_trips_the_original_raster() {
        let raster = gradient(7, 6);
        let rectangle = Rectangle::science("s", 1.5, 0.2, 4.0, 3.0);
        let erased = erase(&raster, &rectangle, 0.0);
        assert_ne!(erased, raster);

        let restored = restore(&erased, &raster, &rectangle).expect("same dimensions");
        assert_eq!(restored, raster);
    }

    #[test]
    fn restore_rejects_mismatched_rasters() {
        let error = restore(
            &gradient(3, 3),
            &gradient(4, 3),
            &Rectangle::lamp("l", 0.0, 0.0, 1.0, 1.0),
        )
        .expect_err("dimension mismatch");
        assert!(matches!(error, RasterError::DimensionMismatch { .. }));
    }

    #[test]
    fn erase_patch_touches_only_band_pixels() {
        let raster = gradient(5, 5);
        let rectangle = Rectangle::lamp("l", 1.0, 1.0, 3.0, 4.0);
        let patch = MaskPatch::from_bands(3, 4, vec![(0, 1), (1, 3), (2, 9)]);
        let erased = erase_patch(&raster, &rectangle, &patch, 0.0);

        assert_eq!(erased.sample(1, 1), 0.0);
        assert_eq!(erased.sample(1, 2), raster.sample(1, 2));
        assert_eq!(erased.sample(2, 2), 0.0);
        assert_eq!(erased.sample(2, 3), 0.0);
        assert_eq!(erased.sample(2, 1), raster.sample(2, 1));
        assert_eq!(erased.sample(3, 3), 0.0);
        assert_eq!(erased.sample(3, 4), 0.0);
        assert_eq!(erased.sample(0, 0), raster.sample(0, 0));
        assert_eq!(patch.pixel_count(), 1 + 2 + 2);
    }

    #[test]
    fn patch_membership_follows_bands() {
        let patch = MaskPatch::from_bands(2, 3, vec![(1, 2), (0, 0)]);
        assert!(patch.contains(0, 1));
        assert!(!patch.contains(0, 2));
        assert!(!patch.contains(1, 0));
        assert!(!patch.contains(5, 0));
    }

    #[test]
    fn decoded_patches_are_normalized() {
        let patch: MaskPatch =
            serde_json::from_str(r#"{"width":2,"height":3,"bands":[[2,1],[1,9]]}"#)
                .expect("patch");
        assert_eq!(patch.bands(), [(1, 1), (1, 3)]);
        assert_eq!(patch.pixel_count(), 2);
    }
}
