use super::linear::LinearFit;
use super::{CurveFunction, FitError, sorted_distinct_points, validate_samples};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearSegment {
    pub start: f64,
    pub line: LinearFit,
}

/// Connect-the-dots interpolation through sorted control points.
///
/// Queries outside `[first, last)` fall on the single line through the first
/// and last control point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiecewiseLinearFit {
    segments: Vec<LinearSegment>,
    first: f64,
    last: f64,
    outer: LinearFit,
}

impl PiecewiseLinearFit {
    pub fn fit(xs: &[f64], ys: &[f64]) -> Result<Self, FitError> {
        validate_samples(xs, ys)?;
        let points = sorted_distinct_points(xs, ys)?;

        let segments = points
            .windows(2)
            .map(|pair| LinearSegment {
                start: pair[0].0,
                line: LinearFit::through(pair[0], pair[1]),
            })
            .collect();
        let first = points[0];
        let last = points[points.len() - 1];

        Ok(Self {
            segments,
            first: first.0,
            last: last.0,
            outer: LinearFit::through(first, last),
        })
    }

    pub fn segments(&self) -> &[LinearSegment] {
        &self.segments
    }

    fn line_at(&self, x: f64) -> &LinearFit {
        if x < self.first || x >= self.last {
            return &self.outer;
        }
        self.segments
            .iter()
            .rev()
            .find(|segment| segment.start <= x)
            .map_or(&self.outer, |segment| &segment.line)
    }
}

impl CurveFunction for PiecewiseLinearFit {
    fn evaluate(&self, x: f64) -> f64 {
        self.line_at(x).evaluate(x)
    }

    fn derivative(&self, x: f64) -> f64 {
        self.line_at(x).slope
    }
}
