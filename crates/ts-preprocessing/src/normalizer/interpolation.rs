//! Gap-filling kernels.
//!
//! Every method works on a sequence of `(x, y)` samples where `y` may be
//! missing. Only interior gaps are filled: entries before the first or after
//! the last known value stay missing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How interior gaps of a numeric column are filled after reindexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Linear in elapsed time between the neighbouring known values.
    Time,
    /// Linear in row position, ignoring timestamps.
    Linear,
    /// Piecewise quadratic spline through every known value.
    Spline,
    /// Quadratic through the two neighbours and the nearest further known value.
    Polynomial,
}

impl Interpolation {
    /// Whether the method fits a curve of degree two.
    pub fn is_quadratic(self) -> bool {
        matches!(self, Self::Spline | Self::Polynomial)
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Time => "time",
            Self::Linear => "linear",
            Self::Spline => "spline",
            Self::Polynomial => "polynomial",
        };
        f.write_str(name)
    }
}

/// Fill the interior gaps of `ys`.
///
/// `times` are the sample coordinates used by the time-aware methods; they must
/// be strictly increasing and as long as `ys`. `Linear` uses row positions
/// instead. With fewer than two known values nothing is filled, and the
/// quadratic methods fall back to linear in time when fewer than three exist.
pub fn interpolate(times: &[f64], ys: &[Option<f64>], method: Interpolation) -> Vec<Option<f64>> {
    let known: Vec<usize> = ys
        .iter()
        .enumerate()
        .filter_map(|(i, y)| y.map(|_| i))
        .collect();

    if known.len() < 2 || known.len() == ys.len() {
        return ys.to_vec();
    }

    let positions: Vec<f64>;
    let xs: &[f64] = if method == Interpolation::Linear {
        positions = (0..ys.len()).map(|i| i as f64).collect();
        &positions
    } else {
        times
    };

    let points: Vec<(f64, f64)> = known
        .iter()
        .filter_map(|&i| ys[i].map(|y| (xs[i], y)))
        .collect();

    let method = if method.is_quadratic() && points.len() < 3 {
        Interpolation::Time
    } else {
        method
    };
    let spline = (method == Interpolation::Spline).then(|| QuadraticSpline::fit(&points));

    let (first, last) = (known[0], known[known.len() - 1]);
    let mut out = ys.to_vec();
    for i in first + 1..last {
        if out[i].is_some() {
            continue;
        }
        // index of the first known row after i
        let hi = known.partition_point(|&k| k < i);
        let lo = hi - 1;
        let x = xs[i];

        out[i] = Some(match (&spline, method) {
            (Some(spline), _) => spline.eval(lo, x),
            (None, Interpolation::Polynomial) => local_quadratic(&points, lo, hi, x),
            _ => linear(points[lo], points[hi], x),
        });
    }
    out
}

fn linear((x0, y0): (f64, f64), (x1, y1): (f64, f64), x: f64) -> f64 {
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

fn lagrange(p: [(f64, f64); 3], x: f64) -> f64 {
    let [(x0, y0), (x1, y1), (x2, y2)] = p;
    y0 * (x - x1) * (x - x2) / ((x0 - x1) * (x0 - x2))
        + y1 * (x - x0) * (x - x2) / ((x1 - x0) * (x1 - x2))
        + y2 * (x - x0) * (x - x1) / ((x2 - x0) * (x2 - x1))
}

/// Quadratic through `points[lo]`, `points[hi]` and whichever outer neighbour
/// lies closer to `x`.
fn local_quadratic(points: &[(f64, f64)], lo: usize, hi: usize, x: f64) -> f64 {
    let before = lo.checked_sub(1).map(|k| points[k]);
    let after = points.get(hi + 1).copied();

    let third = match (before, after) {
        (Some(b), Some(a)) => {
            if (x - b.0).abs() <= (a.0 - x).abs() {
                b
            } else {
                a
            }
        }
        (Some(b), None) => b,
        (None, Some(a)) => a,
        (None, None) => return linear(points[lo], points[hi], x),
    };

    let mut triple = [points[lo], points[hi], third];
    triple.sort_by(|a, b| a.0.total_cmp(&b.0));
    lagrange(triple, x)
}

/// C1 piecewise quadratic spline with knots at every known point.
///
/// The slope at the first knot is taken from the parabola through the first
/// three knots, so quadratic data is reproduced exactly.
struct QuadraticSpline {
    knots: Vec<(f64, f64)>,
    slopes: Vec<f64>,
    curvatures: Vec<f64>,
}

impl QuadraticSpline {
    fn fit(knots: &[(f64, f64)]) -> Self {
        let [(x0, y0), (x1, y1), (x2, y2)] = [knots[0], knots[1], knots[2]];
        let d01 = (y1 - y0) / (x1 - x0);
        let d12 = (y2 - y1) / (x2 - x1);
        let mut slope = d01 + (d12 - d01) / (x2 - x0) * (x0 - x1);

        let segments = knots.len() - 1;
        let mut slopes = Vec::with_capacity(segments);
        let mut curvatures = Vec::with_capacity(segments);
        for pair in knots.windows(2) {
            let h = pair[1].0 - pair[0].0;
            let d = (pair[1].1 - pair[0].1) / h;
            slopes.push(slope);
            curvatures.push((d - slope) / h);
            slope = 2.0 * d - slope;
        }

        Self {
            knots: knots.to_vec(),
            slopes,
            curvatures,
        }
    }

    fn eval(&self, segment: usize, x: f64) -> f64 {
        let (xj, yj) = self.knots[segment];
        let dx = x - xj;
        yj + self.slopes[segment] * dx + self.curvatures[segment] * dx * dx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    fn assert_close(actual: &[Option<f64>], expected: &[Option<f64>]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            match (a, e) {
                (Some(a), Some(e)) => assert!((a - e).abs() < 1e-9, "{} != {}", a, e),
                (None, None) => {}
                _ => panic!("{:?} != {:?}", actual, expected),
            }
        }
    }

    #[test]
    fn test_linear_fills_interior_only() {
        let ys = [None, Some(1.0), None, None, Some(4.0), None];
        let out = interpolate(&grid(6), &ys, Interpolation::Linear);
        assert_close(&out, &[None, Some(1.0), Some(2.0), Some(3.0), Some(4.0), None]);
    }

    #[test]
    fn test_time_uses_coordinates() {
        let times = [0.0, 1.0, 4.0];
        let ys = [Some(0.0), None, Some(8.0)];

        let by_time = interpolate(&times, &ys, Interpolation::Time);
        let by_position = interpolate(&times, &ys, Interpolation::Linear);
        assert_close(&by_time, &[Some(0.0), Some(2.0), Some(8.0)]);
        assert_close(&by_position, &[Some(0.0), Some(4.0), Some(8.0)]);
    }

    #[test]
    fn test_quadratic_methods_reproduce_parabola() {
        let f = |x: f64| 2.0 * x * x - 3.0 * x + 1.0;
        let xs = grid(8);
        let ys: Vec<Option<f64>> = xs
            .iter()
            .map(|&x| if [2.0, 3.0, 5.0].contains(&x) { None } else { Some(f(x)) })
            .collect();
        let expected: Vec<Option<f64>> = xs.iter().map(|&x| Some(f(x))).collect();

        for method in [Interpolation::Spline, Interpolation::Polynomial] {
            assert_close(&interpolate(&xs, &ys, method), &expected);
        }
    }

    #[test]
    fn test_quadratic_falls_back_to_linear_with_two_points() {
        let ys = [Some(0.0), None, None, Some(3.0)];
        for method in [Interpolation::Spline, Interpolation::Polynomial] {
            let out = interpolate(&grid(4), &ys, method);
            assert_close(&out, &[Some(0.0), Some(1.0), Some(2.0), Some(3.0)]);
        }
    }

    #[test]
    fn test_single_known_value_is_untouched() {
        let ys = [None, Some(5.0), None];
        assert_eq!(interpolate(&grid(3), &ys, Interpolation::Spline), ys.to_vec());
    }

    #[test]
    fn test_polynomial_picks_nearer_neighbour() {
        // Known at 0, 1, 3, 10. The gap at 2 sits between 1 and 3; 0 is nearer than 10.
        let xs = grid(11);
        let mut ys = vec![None; 11];
        ys[0] = Some(0.0);
        ys[1] = Some(1.0);
        ys[3] = Some(9.0);
        ys[10] = Some(1_000.0);

        let out = interpolate(&xs, &ys, Interpolation::Polynomial);
        // parabola through (0,0), (1,1), (3,9) is x^2
        assert!((out[2].unwrap() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_display() {
        assert_eq!(Interpolation::Time.to_string(), "time");
        assert_eq!(Interpolation::Polynomial.to_string(), "polynomial");
    }
}
