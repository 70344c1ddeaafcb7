use super::profile::{Plateau, ProfilePoint, find_checkpoints, find_plateau, profile_at};
use crate::domain::{EngineError, EngineResult, ExtractionSettings, Rectangle, TraceFit};
use crate::numerics::fitting::{CurveKind, FittedCurve, fit};
use crate::raster::{MaskPatch, PixelBuffer};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Centerline model of a trace, in crop coordinates (column -> row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum MediaFunction {
    Fitted { curve: FittedCurve },
    /// `curve(x * x_scale) * y_scale`: a principal centerline carried over to
    /// a crop of a different size.
    #[serde(rename_all = "camelCase")]
    Rescaled {
        curve: FittedCurve,
        x_scale: f64,
        y_scale: f64,
    },
}

impl MediaFunction {
    pub fn evaluate(&self, x: f64) -> f64 {
        match self {
            Self::Fitted { curve } => curve.evaluate(x),
            Self::Rescaled {
                curve,
                x_scale,
                y_scale,
            } => curve.evaluate(x * x_scale) * y_scale,
        }
    }

    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            Self::Fitted { curve } => curve.derivative(x),
            Self::Rescaled {
                curve,
                x_scale,
                y_scale,
            } => curve.derivative(x * x_scale) * x_scale * y_scale,
        }
    }

    pub fn curve(&self) -> &FittedCurve {
        match self {
            Self::Fitted { curve } | Self::Rescaled { curve, .. } => curve,
        }
    }

    /// Same centerline expressed for a crop whose columns are `1 / x_scale`
    /// and rows `y_scale` times this one's.
    pub fn rescaled(&self, x_scale: f64, y_scale: f64) -> Self {
        match self {
            Self::Fitted { curve } => Self::Rescaled {
                curve: curve.clone(),
                x_scale,
                y_scale,
            },
            Self::Rescaled {
                curve,
                x_scale: inner_x,
                y_scale: inner_y,
            } => Self::Rescaled {
                curve: curve.clone(),
                x_scale: x_scale * inner_x,
                y_scale: y_scale * inner_y,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpectrumTrace {
    pub media_points: Vec<ProfilePoint>,
    pub media_function: MediaFunction,
    pub avg_opening: f64,
    pub transversal_averages: Vec<f64>,
    pub width: usize,
    pub height: usize,
}

impl SpectrumTrace {
    pub fn has_aperture(&self) -> bool {
        self.avg_opening > 0.0
    }

    /// Rows `[start, end)` of the aperture band at column `x`.
    pub fn band_at(&self, x: usize) -> (usize, usize) {
        aperture_band(
            self.media_function.evaluate(x as f64),
            self.avg_opening,
            self.height,
        )
    }

    /// Footprint of the aperture band over the whole crop.
    pub fn mask_patch(&self) -> MaskPatch {
        let bands = (0..self.width).map(|x| self.band_at(x)).collect();
        MaskPatch::from_bands(self.width, self.height, bands)
    }
}

/// Locate the centerline and aperture of the spectrum inside `rectangle` and
/// average the aperture band column by column.
pub fn extract_trace(
    buffer: &PixelBuffer,
    rectangle: &Rectangle,
    settings: &ExtractionSettings,
) -> EngineResult<SpectrumTrace> {
    settings.validate()?;
    let crop = crop_rectangle(buffer, rectangle)?;

    let mut checkpoints = find_checkpoints(crop.width(), settings.checkpoint_count);
    checkpoints.dedup();

    let mut media_points = Vec::with_capacity(checkpoints.len());
    let mut plateaus: Vec<Plateau> = Vec::with_capacity(checkpoints.len());
    for x in checkpoints {
        let profile = profile_at(&crop, x, settings.segment_width)?;
        let plateau = find_plateau(&profile, settings.threshold_fraction);
        if plateau.is_degenerate() {
            warn!(
                spectrum = %rectangle.id,
                column = x,
                "no row reaches the plateau threshold; checkpoint has no aperture"
            );
        }
        media_points.push(ProfilePoint::new(x as f64, plateau.center));
        plateaus.push(plateau);
    }

    let xs: Vec<f64> = media_points.iter().map(|point| point.x).collect();
    let ys: Vec<f64> = media_points.iter().map(|point| point.y).collect();
    let curve = fit(curve_kind(settings.trace_fit), &xs, &ys, None)?;
    let media_function = MediaFunction::Fitted { curve };

    let mean_opening = plateaus
        .iter()
        .map(|plateau| plateau.opening as f64)
        .sum::<f64>()
        / plateaus.len() as f64;
    let avg_opening = mean_opening * settings.aperture_coefficient;
    if avg_opening <= 0.0 {
        warn!(spectrum = %rectangle.id, "trace has a zero-width aperture");
    }

    let transversal_averages = transversal_averages(&crop, &media_function, avg_opening);
    debug!(
        spectrum = %rectangle.id,
        checkpoints = media_points.len(),
        avg_opening,
        "extracted spectrum trace"
    );

    Ok(SpectrumTrace {
        media_points,
        media_function,
        avg_opening,
        transversal_averages,
        width: crop.width(),
        height: crop.height(),
    })
}

/// Lamp extraction that reuses `principal`'s centerline and aperture,
/// rescaled to the lamp crop, instead of detecting its own.
pub fn extract_trace_reusing(
    buffer: &PixelBuffer,
    rectangle: &Rectangle,
    principal: &SpectrumTrace,
) -> EngineResult<SpectrumTrace> {
    let crop = crop_rectangle(buffer, rectangle)?;
    let width_ratio = crop.width() as f64 / principal.width as f64;
    let height_ratio = crop.height() as f64 / principal.height as f64;

    let media_points = principal
        .media_points
        .iter()
        .map(|point| ProfilePoint::new((point.x * width_ratio).round(), point.y * height_ratio))
        .collect();
    let media_function = principal
        .media_function
        .rescaled(1.0 / width_ratio, height_ratio);
    let avg_opening = principal.avg_opening * height_ratio;

    let transversal_averages = transversal_averages(&crop, &media_function, avg_opening);
    debug!(
        spectrum = %rectangle.id,
        width_ratio,
        height_ratio,
        "reused principal trace"
    );

    Ok(SpectrumTrace {
        media_points,
        media_function,
        avg_opening,
        transversal_averages,
        width: crop.width(),
        height: crop.height(),
    })
}

fn crop_rectangle(buffer: &PixelBuffer, rectangle: &Rectangle) -> EngineResult<PixelBuffer> {
    if !rectangle.is_finite() {
        return Err(EngineError::NonFiniteRectangle {
            id: rectangle.id.clone(),
        });
    }
    let bounds = rectangle
        .pixel_bounds(buffer.width(), buffer.height())
        .ok_or_else(|| EngineError::RectangleOutsideRaster {
            id: rectangle.id.clone(),
            width: buffer.width(),
            height: buffer.height(),
        })?;
    Ok(buffer.crop(bounds)?)
}

const fn curve_kind(trace_fit: TraceFit) -> CurveKind {
    match trace_fit {
        TraceFit::Linear => CurveKind::Linear,
        TraceFit::QuadraticSpline => CurveKind::QuadraticSpline,
    }
}

fn aperture_band(center: f64, opening: f64, height: usize) -> (usize, usize) {
    let clamp = |row: f64| {
        if row.is_nan() {
            0
        } else {
            row.round().clamp(0.0, height as f64) as usize
        }
    };
    let start = clamp(center - opening / 2.0);
    let end = clamp(center + opening / 2.0);
    (start, end.max(start))
}

fn transversal_averages(crop: &PixelBuffer, media: &MediaFunction, opening: f64) -> Vec<f64> {
    (0..crop.width())
        .map(|x| {
            let (start, end) = aperture_band(media.evaluate(x as f64), opening, crop.height());
            if start == end {
                return 0.0;
            }
            let total: f64 = (start..end).map(|y| f64::from(crop.sample(x, y))).sum();
            total / (end - start) as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{MediaFunction, aperture_band, extract_trace, extract_trace_reusing};
    use crate::domain::{EngineError, ExtractionSettings, Rectangle, TraceFit};
    use crate::numerics::fitting::{FitError, FittedCurve, LinearFit};
    use crate::raster::PixelBuffer;

    /// Plate with a bright horizontal band `rows` tall starting at `top`.
    fn banded_plate(width: usize, height: usize, top: usize, rows: usize) -> PixelBuffer {
        let mut samples = vec![10.0; width * height];
        for y in top..top + rows {
            for x in 0..width {
                samples[y * width + x] = 200.0 + x as f32;
            }
        }
        PixelBuffer::from_gray(width, height, samples).expect("plate")
    }

    #[test]
    fn horizontal_band_is_traced_along_its_center() {
        let plate = banded_plate(120, 40, 14, 8);
        let rectangle = Rectangle::science("s", 0.0, 0.0, 120.0, 40.0);
        let trace = extract_trace(&plate, &rectangle, &ExtractionSettings::default())
            .expect("trace");

        assert_eq!(trace.width, 120);
        assert_eq!(trace.height, 40);
        assert_eq!(trace.media_points.len(), 5);
        for x in [0.0, 37.0, 119.0] {
            assert!((trace.media_function.evaluate(x) - 17.5).abs() < 1.0e-9);
        }
        assert!((trace.avg_opening - 8.0).abs() < 1.0e-12);
        assert_eq!(trace.transversal_averages.len(), 120);
        for (x, average) in trace.transversal_averages.iter().enumerate() {
            assert!((average - (200.0 + x as f64)).abs() < 1.0e-9, "column {x}");
        }
    }

    #[test]
    fn aperture_coefficient_scales_the_opening() {
        let plate = banded_plate(60, 30, 10, 6);
        let rectangle = Rectangle::science("s", 0.0, 0.0, 60.0, 30.0);
        let settings = ExtractionSettings {
            aperture_coefficient: 1.5,
            ..ExtractionSettings::default()
        };
        let trace = extract_trace(&plate, &rectangle, &settings).expect("trace");
        assert!((trace.avg_opening - 9.0).abs() < 1.0e-12);
        assert_eq!(trace.band_at(0), (8, 17));
    }

    #[test]
    fn tilted_band_is_followed_by_the_spline_fit() {
        let width = 100;
        let height = 60;
        let mut samples = vec![0.0; width * height];
        for x in 0..width {
            let center = 10 + x * 3 / 10;
            for y in center..center + 5 {
                samples[y * width + x] = 255.0;
            }
        }
        let plate = PixelBuffer::from_gray(width, height, samples).expect("plate");
        let settings = ExtractionSettings {
            trace_fit: TraceFit::QuadraticSpline,
            segment_width: 1,
            ..ExtractionSettings::default()
        };
        let rectangle = Rectangle::science("s", 0.0, 0.0, 100.0, 60.0);
        let trace = extract_trace(&plate, &rectangle, &settings).expect("trace");

        for point in &trace.media_points {
            assert!((trace.media_function.evaluate(point.x) - point.y).abs() < 1.0e-6);
        }
        assert!(trace.media_function.evaluate(99.0) > trace.media_function.evaluate(0.0));
    }

    #[test]
    fn dark_region_yields_zero_aperture_not_an_error() {
        let plate = PixelBuffer::filled(50, 20, 0.0).expect("plate");
        let rectangle = Rectangle::lamp("l", 0.0, 0.0, 50.0, 20.0);
        let trace = extract_trace(&plate, &rectangle, &ExtractionSettings::default())
            .expect("degenerate trace");

        assert!(!trace.has_aperture());
        assert!(trace.transversal_averages.iter().all(|value| *value == 0.0));
        assert!(trace.mask_patch().is_empty());
    }

    #[test]
    fn rectangle_outside_raster_is_rejected() {
        let plate = PixelBuffer::filled(10, 10, 1.0).expect("plate");
        let rectangle = Rectangle::lamp("far", 50.0, 50.0, 5.0, 5.0);
        let error = extract_trace(&plate, &rectangle, &ExtractionSettings::default())
            .expect_err("outside");
        assert!(matches!(error, EngineError::RectangleOutsideRaster { .. }));
    }

    #[test]
    fn nan_rectangle_is_rejected_instead_of_cropping_everything() {
        let plate = PixelBuffer::filled(20, 10, 1.0).expect("plate");
        let rectangle = Rectangle::science("s", f64::NAN, f64::NAN, 5.0, 5.0);
        let error = extract_trace(&plate, &rectangle, &ExtractionSettings::default())
            .expect_err("nan box");
        assert_eq!(
            error,
            EngineError::NonFiniteRectangle {
                id: "s".to_string()
            }
        );
    }

    #[test]
    fn single_column_crop_cannot_fit_a_centerline() {
        let plate = PixelBuffer::filled(10, 10, 1.0).expect("plate");
        let rectangle = Rectangle::lamp("thin", 0.0, 3.0, 1.0, 10.0);
        let error = extract_trace(&plate, &rectangle, &ExtractionSettings::default())
            .expect_err("single column");
        assert_eq!(
            error,
            EngineError::Fit(FitError::InsufficientPoints { actual: 1 })
        );
    }

    #[test]
    fn reuse_mode_rescales_the_principal_trace() {
        let plate = banded_plate(200, 80, 10, 8);
        let principal_rect = Rectangle::science("s", 0.0, 0.0, 100.0, 40.0);
        let principal = extract_trace(&plate, &principal_rect, &ExtractionSettings::default())
            .expect("principal trace");

        let lamp_rect = Rectangle::lamp("l", 0.0, 0.0, 200.0, 80.0);
        let lamp = extract_trace_reusing(&plate, &lamp_rect, &principal).expect("lamp trace");

        assert_eq!(lamp.width, 200);
        assert!((lamp.avg_opening - principal.avg_opening * 2.0).abs() < 1.0e-12);
        assert_eq!(lamp.media_points.len(), principal.media_points.len());
        assert_eq!(lamp.media_points[1].x, (principal.media_points[1].x * 2.0).round());
        assert!(
            (lamp.media_function.evaluate(50.0) - principal.media_function.evaluate(25.0) * 2.0)
                .abs()
                < 1.0e-12
        );
    }

    #[test]
    fn rescaled_derivative_applies_both_scale_factors() {
        let media = MediaFunction::Fitted {
            curve: FittedCurve::Linear(LinearFit {
                slope: 2.0,
                intercept: 1.0,
            }),
        }
        .rescaled(0.5, 3.0)
        .rescaled(2.0, 2.0);

        assert!((media.evaluate(4.0) - 6.0 * 9.0).abs() < 1.0e-12);
        assert!((media.derivative(4.0) - 12.0).abs() < 1.0e-12);
    }

    #[test]
    fn aperture_band_is_clamped_to_the_crop() {
        assert_eq!(aperture_band(2.0, 10.0, 20), (0, 7));
        assert_eq!(aperture_band(18.0, 10.0, 20), (13, 20));
        assert_eq!(aperture_band(5.0, 0.0, 20), (5, 5));
        assert_eq!(aperture_band(-40.0, 4.0, 20), (0, 0));
    }
}
