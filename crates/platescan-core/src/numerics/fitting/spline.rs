use super::{CurveFunction, FitError, sorted_distinct_points, validate_samples};
use crate::numerics::linalg::{DenseMatrix, lu_solve};
use serde::{Deserialize, Serialize};

/// `a * t^2 + b * t + c` on one knot interval, with `t = x - origin`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadraticPiece {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl QuadraticPiece {
    fn value(&self, t: f64) -> f64 {
        (self.a * t + self.b) * t + self.c
    }

    fn slope(&self, t: f64) -> f64 {
        2.0 * self.a * t + self.b
    }
}

/// C1 quadratic interpolating spline whose first piece is a straight line.
///
/// Coefficients are expressed relative to the first knot so the dense
/// system stays well scaled for pixel-sized abscissae.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadraticSplineFit {
    origin: f64,
    knots: Vec<f64>,
    pieces: Vec<QuadraticPiece>,
}

impl QuadraticSplineFit {
    pub fn fit(xs: &[f64], ys: &[f64]) -> Result<Self, FitError> {
        validate_samples(xs, ys)?;
        let points = sorted_distinct_points(xs, ys)?;

        let origin = points[0].0;
        let knots: Vec<f64> = points.iter().map(|(x, _)| x - origin).collect();
        let intervals = points.len() - 1;
        let size = 3 * intervals;
        let mut system = DenseMatrix::zeros(size, size);
        let mut rhs = vec![0.0; size];
        let mut row = 0;

        for interval in 0..intervals {
            let column = 3 * interval;
            for (t, y) in [
                (knots[interval], points[interval].1),
                (knots[interval + 1], points[interval + 1].1),
            ] {
                system[(row, column)] = t * t;
                system[(row, column + 1)] = t;
                system[(row, column + 2)] = 1.0;
                rhs[row] = y;
                row += 1;
            }
        }

        // slope continuity at every interior knot
        for interval in 0..intervals.saturating_sub(1) {
            let knot = knots[interval + 1];
            let column = 3 * interval;
            system[(row, column)] = 2.0 * knot;
            system[(row, column + 1)] = 1.0;
            system[(row, column + 3)] = -2.0 * knot;
            system[(row, column + 4)] = -1.0;
            row += 1;
        }

        system[(row, 0)] = 1.0;

        let solution = lu_solve(&system, &rhs)?;
        let pieces = solution
            .chunks_exact(3)
            .map(|coefficients| QuadraticPiece {
                a: coefficients[0],
                b: coefficients[1],
                c: coefficients[2],
            })
            .collect();

        Ok(Self {
            origin,
            knots,
            pieces,
        })
    }

    pub fn knots(&self) -> impl Iterator<Item = f64> + '_ {
        self.knots.iter().map(|t| t + self.origin)
    }

    pub fn pieces(&self) -> &[QuadraticPiece] {
        &self.pieces
    }

    /// Interval containing `t`, clamped to the first and last interval.
    fn piece_at(&self, t: f64) -> &QuadraticPiece {
        let interior = &self.knots[1..self.knots.len() - 1];
        let index = interior.partition_point(|knot| *knot <= t);
        &self.pieces[index]
    }
}

impl CurveFunction for QuadraticSplineFit {
    fn evaluate(&self, x: f64) -> f64 {
        let t = x - self.origin;
        self.piece_at(t).value(t)
    }

    fn derivative(&self, x: f64) -> f64 {
        let t = x - self.origin;
        self.piece_at(t).slope(t)
    }
}
