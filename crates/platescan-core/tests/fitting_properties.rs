use platescan_core::domain::Rectangle;
use platescan_core::geometry::iou;
use platescan_core::numerics::fitting::{CurveKind, FittedCurve, fit};

/// Deterministic sample sets: strictly increasing abscissae with uneven
/// spacing and bumpy ordinates.
fn sample_sets() -> Vec<(Vec<f64>, Vec<f64>)> {
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state % 10_000) as f64 / 10_000.0
    };

    (2..=7)
        .map(|count| {
            let mut x = 5.0 + 20.0 * next();
            let mut xs = Vec::with_capacity(count);
            let mut ys = Vec::with_capacity(count);
            for _ in 0..count {
                xs.push(x);
                ys.push(3900.0 + 300.0 * next());
                x += 10.0 + 90.0 * next();
            }
            (xs, ys)
        })
        .collect()
}

fn assert_interpolates(curve: &FittedCurve, xs: &[f64], ys: &[f64], tolerance: f64) {
    for (x, y) in xs.iter().zip(ys) {
        let actual = curve.evaluate(*x);
        assert!(
            (actual - y).abs() <= tolerance,
            "{:?} at x={x}: expected={y} actual={actual}",
            curve.kind()
        );
    }
}

#[test]
fn linear_fit_reproduces_collinear_points() {
    for (xs, _) in sample_sets() {
        let ys: Vec<f64> = xs.iter().map(|x| 0.75 * x + 3800.0).collect();
        let curve = fit(CurveKind::Linear, &xs, &ys, None).expect("linear fit");
        assert_interpolates(&curve, &xs, &ys, 1.0e-9);
    }
}

#[test]
fn piecewise_fit_passes_through_every_control_point() {
    for (xs, ys) in sample_sets() {
        let curve = fit(CurveKind::PiecewiseLinear, &xs, &ys, None).expect("piecewise fit");
        assert_interpolates(&curve, &xs, &ys, 1.0e-9);
    }
}

#[test]
fn spline_interpolates_with_continuous_slope() {
    for (xs, ys) in sample_sets() {
        let curve = fit(CurveKind::QuadraticSpline, &xs, &ys, None).expect("spline fit");
        assert_interpolates(&curve, &xs, &ys, 1.0e-5);

        let step = 1.0e-9;
        for knot in &xs[1..xs.len() - 1] {
            let left = curve.derivative(knot - step);
            let right = curve.derivative(knot + step);
            assert!(
                (left - right).abs() < 1.0e-4,
                "slope jump at {knot}: {left} vs {right}"
            );
        }
    }
}

#[test]
fn full_degree_legendre_interpolates() {
    for (xs, ys) in sample_sets() {
        let degree = xs.len() - 1;
        let curve = fit(CurveKind::Legendre, &xs, &ys, Some(degree)).expect("legendre fit");
        assert_interpolates(&curve, &xs, &ys, 1.0e-4);
    }
}

#[test]
fn iou_is_symmetric_and_bounded() {
    let boxes = [
        Rectangle::lamp("a", 0.0, 0.0, 10.0, 10.0),
        Rectangle::lamp("b", 4.0, 6.0, 10.0, 3.0),
        Rectangle::lamp("c", 30.0, 30.0, 1.0, 1.0),
        Rectangle::science("d", 2.5, 2.5, 5.0, 5.0),
    ];
    for a in &boxes {
        assert_eq!(iou(a, a), 1.0);
        for b in &boxes {
            let forward = iou(a, b);
            assert_eq!(forward, iou(b, a));
            assert!((0.0..=1.0).contains(&forward));
        }
    }
    assert_eq!(iou(&boxes[0], &boxes[2]), 0.0);
}
