use crate::domain::PixelBounds;
use crate::raster::{PixelBuffer, RasterError};
use serde::{Deserialize, Serialize};

pub const DEFAULT_THRESHOLD_FRACTION: f64 = 0.5;

/// Checkpoint column paired with the detected trace center at that column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfilePoint {
    pub x: f64,
    pub y: f64,
}

impl ProfilePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Plateau {
    pub center: f64,
    pub opening: usize,
}

impl Plateau {
    /// No row cleared the threshold, so there is no usable aperture.
    pub fn is_degenerate(&self) -> bool {
        self.opening == 0
    }
}

/// `count` columns spread over `[0, width - 1]`, both ends included.
///
/// Position `i` is `ceil(i * (width - 1) / (count - 1))`.
pub fn find_checkpoints(width: usize, count: usize) -> Vec<usize> {
    match (width, count) {
        (0, _) | (_, 0) => Vec::new(),
        (_, 1) => vec![0],
        _ => {
            let last = width - 1;
            let steps = count - 1;
            (0..count)
                .map(|index| (index * last).div_ceil(steps))
                .collect()
        }
    }
}

/// Full-height window of `segment_width` columns around column `x`, clipped
/// to the buffer.
pub fn sample_segment(
    buffer: &PixelBuffer,
    x: usize,
    segment_width: usize,
) -> Result<PixelBuffer, RasterError> {
    let left = x.saturating_sub(segment_width / 2);
    let right = (x + segment_width.div_ceil(2))
        .min(buffer.width())
        .max(left + 1);
    buffer.crop(PixelBounds {
        left,
        top: 0,
        width: right - left,
        height: buffer.height(),
    })
}

/// Mean intensity of every row of `segment`.
pub fn horizontal_average(segment: &PixelBuffer) -> Vec<f64> {
    let columns = segment.width() as f64;
    (0..segment.height())
        .map(|y| {
            segment
                .row(y)
                .iter()
                .map(|value| f64::from(*value))
                .sum::<f64>()
                / columns
        })
        .collect()
}

/// Longest run of rows at or above `threshold_fraction * max(profile)`; the
/// first run wins ties.
pub fn find_plateau(profile: &[f64], threshold_fraction: f64) -> Plateau {
    let max = profile.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if profile.is_empty() || !(max > 0.0) {
        return Plateau::default();
    }

    let threshold = threshold_fraction * max;
    let mut best: Option<(usize, usize)> = None;
    let mut run_start: Option<usize> = None;

    for (row, value) in profile.iter().enumerate() {
        match (run_start, *value >= threshold) {
            (None, true) => run_start = Some(row),
            (Some(start), false) => {
                best = longer_run(best, (start, row));
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        best = longer_run(best, (start, profile.len()));
    }

    best.map_or_else(Plateau::default, |(start, end)| Plateau {
        center: (start + end - 1) as f64 / 2.0,
        opening: end - start,
    })
}

fn longer_run(best: Option<(usize, usize)>, candidate: (usize, usize)) -> Option<(usize, usize)> {
    match best {
        Some((start, end)) if end - start >= candidate.1 - candidate.0 => Some((start, end)),
        _ => Some(candidate),
    }
}

/// Profile of the segment around column `x`.
pub fn profile_at(
    buffer: &PixelBuffer,
    x: usize,
    segment_width: usize,
) -> Result<Vec<f64>, RasterError> {
    sample_segment(buffer, x, segment_width).map(|segment| horizontal_average(&segment))
}
