//! Natural cubic spline interpolation.
//!
//! Tabulated curves (the emission cross-section table, 1-D passes of the
//! bicubic resampler) are provided at discrete abscissae; a natural cubic
//! spline gives a smooth curve through them with continuous first and
//! second derivatives.

/// A natural cubic spline interpolator for real-valued data.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    /// Sorted knot positions.
    knots: Vec<f64>,
    /// Values at the knots.
    values: Vec<f64>,
    /// Second derivatives at the knots, fixed at construction.
    d2: Vec<f64>,
}

impl CubicSpline {
    /// Construct a natural cubic spline through `(knots[i], values[i])`.
    ///
    /// # Panics
    /// Panics if the slices differ in length, hold fewer than 2 points, or
    /// if `knots` is not strictly increasing.
    pub fn new(knots: &[f64], values: &[f64]) -> Self {
        assert_eq!(knots.len(), values.len(), "knots and values must match");
        assert!(knots.len() >= 2, "need at least 2 data points");
        for i in 1..knots.len() {
            assert!(
                knots[i] > knots[i - 1],
                "knots must be strictly increasing at index {}",
                i
            );
        }

        let n = knots.len();
        let mut d2 = vec![0.0; n];
        let mut work = vec![0.0; n - 1];

        // Tridiagonal sweep for the natural-spline second derivatives.
        for i in 1..n - 1 {
            let sig = (knots[i] - knots[i - 1]) / (knots[i + 1] - knots[i - 1]);
            let p = sig * d2[i - 1] + 2.0;
            d2[i] = (sig - 1.0) / p;
            let slope_hi = (values[i + 1] - values[i]) / (knots[i + 1] - knots[i]);
            let slope_lo = (values[i] - values[i - 1]) / (knots[i] - knots[i - 1]);
            work[i] =
                (6.0 * (slope_hi - slope_lo) / (knots[i + 1] - knots[i - 1]) - sig * work[i - 1])
                    / p;
        }
        for k in (0..n - 2).rev() {
            d2[k + 1] = d2[k + 1] * d2[k + 2] + work[k + 1];
        }

        Self {
            knots: knots.to_vec(),
            values: values.to_vec(),
            d2,
        }
    }

    /// Evaluate the spline at `x`.
    ///
    /// Outside the knot range the boundary polynomial is extended.
    pub fn evaluate(&self, x: f64) -> f64 {
        let n = self.knots.len();

        let mut lo = 0;
        let mut hi = n - 1;
        while hi - lo > 1 {
            let mid = (lo + hi) / 2;
            if self.knots[mid] > x {
                hi = mid;
            } else {
                lo = mid;
            }
        }

        let h = self.knots[hi] - self.knots[lo];
        let a = (self.knots[hi] - x) / h;
        let b = (x - self.knots[lo]) / h;

        a * self.values[lo]
            + b * self.values[hi]
            + ((a * a * a - a) * self.d2[lo] + (b * b * b - b) * self.d2[hi]) * h * h / 6.0
    }

    /// Evaluate the spline at each position in `xs`.
    pub fn evaluate_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.evaluate(x)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn passes_through_data_points() {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let ys = [2.0, 3.0, 5.0, 4.0, 1.0];
        let spline = CubicSpline::new(&xs, &ys);
        for (x, y) in xs.iter().zip(ys.iter()) {
            assert_relative_eq!(spline.evaluate(*x), *y, epsilon = 1e-10);
        }
    }

    #[test]
    fn linear_data_reproduced_between_knots() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [0.0, 2.0, 4.0, 6.0];
        let spline = CubicSpline::new(&xs, &ys);
        assert_relative_eq!(spline.evaluate(1.5), 3.0, epsilon = 1e-10);
        assert_relative_eq!(spline.evaluate(0.25), 0.5, epsilon = 1e-10);
    }
}
