//! 2-D resampling between rectilinear grids.
//!
//! Two policies are used at the crystal/field seams:
//!
//! - bicubic spline resampling ([`BicubicSpline`]) for smooth meshes such
//!   as the population-inversion density and field component planes;
//! - bilinear resampling with edge clamping ([`resample_bilinear`]) for the
//!   measured index-perturbation map, where spline overshoot would
//!   manufacture phase from noise and out-of-domain samples must stay
//!   finite.

use ndarray::Array2;

use crate::grid::{linspace, TransverseGrid};
use crate::spline::CubicSpline;

/// Bicubic resampler on a rectilinear grid.
///
/// Built from values `v[ix, iy]` sampled at positions `(x[ix], y[iy])`;
/// evaluation runs a cubic spline along each source row to the target
/// vertical positions, then along each resulting column to the target
/// horizontal positions.
pub struct BicubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    values: Array2<f64>,
}

impl BicubicSpline {
    pub fn new(x: Vec<f64>, y: Vec<f64>, values: Array2<f64>) -> Self {
        assert_eq!(values.dim(), (x.len(), y.len()), "value/axis shape mismatch");
        Self { x, y, values }
    }

    /// Evaluate on the tensor grid `bx × by`.
    pub fn resample(&self, bx: &[f64], by: &[f64]) -> Array2<f64> {
        let nx = self.x.len();

        // Pass 1: spline each row along y, evaluated at the target by.
        let mut rows = Array2::<f64>::zeros((nx, by.len()));
        for ix in 0..nx {
            let row: Vec<f64> = (0..self.y.len()).map(|iy| self.values[[ix, iy]]).collect();
            let spline = CubicSpline::new(&self.y, &row);
            for (jy, &yv) in by.iter().enumerate() {
                rows[[ix, jy]] = spline.evaluate(yv);
            }
        }

        // Pass 2: spline each intermediate column along x at the target bx.
        let mut out = Array2::<f64>::zeros((bx.len(), by.len()));
        for jy in 0..by.len() {
            let col: Vec<f64> = (0..nx).map(|ix| rows[[ix, jy]]).collect();
            let spline = CubicSpline::new(&self.x, &col);
            for (jx, &xv) in bx.iter().enumerate() {
                out[[jx, jy]] = spline.evaluate(xv);
            }
        }
        out
    }
}

/// Resample `values` (sampled at `x × y`) onto `bx × by` bilinearly.
///
/// Target points outside the source domain clamp to the nearest edge value,
/// so the result is always finite.
pub fn resample_bilinear(
    x: &[f64],
    y: &[f64],
    values: &Array2<f64>,
    bx: &[f64],
    by: &[f64],
) -> Array2<f64> {
    assert_eq!(values.dim(), (x.len(), y.len()), "value/axis shape mismatch");

    let bracket = |axis: &[f64], v: f64| -> (usize, f64) {
        if v <= axis[0] {
            return (0, 0.0);
        }
        if v >= axis[axis.len() - 1] {
            return (axis.len() - 2, 1.0);
        }
        let mut lo = 0;
        let mut hi = axis.len() - 1;
        while hi - lo > 1 {
            let mid = (lo + hi) / 2;
            if axis[mid] > v {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        (lo, (v - axis[lo]) / (axis[lo + 1] - axis[lo]))
    };

    Array2::from_shape_fn((bx.len(), by.len()), |(jx, jy)| {
        let (ix, tx) = bracket(x, bx[jx]);
        let (iy, ty) = bracket(y, by[jy]);
        let v00 = values[[ix, iy]];
        let v10 = values[[ix + 1, iy]];
        let v01 = values[[ix, iy + 1]];
        let v11 = values[[ix + 1, iy + 1]];
        v00 * (1.0 - tx) * (1.0 - ty)
            + v10 * tx * (1.0 - ty)
            + v01 * (1.0 - tx) * ty
            + v11 * tx * ty
    })
}

/// Resample a set of real planes onto the minimal enclosing odd-count grid.
///
/// The diffraction-integral kernel requires a symmetric center sample on
/// both axes. An even axis is re-gridded to `n + 1` samples over the same
/// span via bicubic resampling; odd axes are left untouched. Returns the
/// (possibly unchanged) grid and planes.
pub fn resample_to_odd(
    grid: &TransverseGrid,
    planes: &[&Array2<f64>],
) -> (TransverseGrid, Vec<Array2<f64>>) {
    let nx_new = if grid.nx % 2 == 0 { grid.nx + 1 } else { grid.nx };
    let ny_new = if grid.ny % 2 == 0 { grid.ny + 1 } else { grid.ny };

    if nx_new == grid.nx && ny_new == grid.ny {
        return (
            grid.clone(),
            planes.iter().map(|p| (*p).clone()).collect(),
        );
    }

    let x_old = grid.x_coords();
    let y_old = grid.y_coords();
    let x_new = linspace(grid.x_start, grid.x_fin, nx_new);
    let y_new = linspace(grid.y_start, grid.y_fin, ny_new);

    let out = planes
        .iter()
        .map(|p| BicubicSpline::new(x_old.clone(), y_old.clone(), (*p).clone()).resample(&x_new, &y_new))
        .collect();

    let new_grid = TransverseGrid {
        x_start: grid.x_start,
        x_fin: grid.x_fin,
        nx: nx_new,
        y_start: grid.y_start,
        y_fin: grid.y_fin,
        ny: ny_new,
    };
    (new_grid, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp(nx: usize, ny: usize) -> Array2<f64> {
        Array2::from_shape_fn((nx, ny), |(i, j)| i as f64 + 2.0 * j as f64)
    }

    #[test]
    fn bicubic_identity_on_same_grid() {
        let x = linspace(-1.0, 1.0, 9);
        let y = linspace(-1.0, 1.0, 9);
        let v = ramp(9, 9);
        let out = BicubicSpline::new(x.clone(), y.clone(), v.clone()).resample(&x, &y);
        for (a, b) in out.iter().zip(v.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn bilinear_clamps_outside_domain() {
        let x = linspace(0.0, 1.0, 3);
        let y = linspace(0.0, 1.0, 3);
        let v = ramp(3, 3);
        let out = resample_bilinear(&x, &y, &v, &[-5.0, 5.0], &[0.0]);
        assert_relative_eq!(out[[0, 0]], v[[0, 0]]);
        assert_relative_eq!(out[[1, 0]], v[[2, 0]]);
    }

    #[test]
    fn odd_resampling_only_touches_even_axes() {
        let grid = TransverseGrid {
            x_start: -1.0,
            x_fin: 1.0,
            nx: 8,
            y_start: -1.0,
            y_fin: 1.0,
            ny: 9,
        };
        let plane = Array2::from_shape_fn((8, 9), |(i, j)| (i * j) as f64);
        let (new_grid, planes) = resample_to_odd(&grid, &[&plane]);
        assert_eq!(new_grid.nx, 9);
        assert_eq!(new_grid.ny, 9);
        assert!(new_grid.is_odd());
        assert_eq!(planes[0].dim(), (9, 9));

        let (same_grid, _) = resample_to_odd(&new_grid, &[&planes[0]]);
        assert_eq!(same_grid, new_grid);
    }
}
