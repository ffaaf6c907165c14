//! Rectangular transverse sampling grids.
//!
//! Every field in the simulation carries its grid metadata
//! (`x_start, x_fin, nx, y_start, y_fin, ny`) so that resampling between
//! meshes of different extent or density is always well defined.

use serde::{Deserialize, Serialize};

/// Evenly spaced sample positions from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![start];
    }
    let step = (end - start) / (n - 1) as f64;
    (0..n).map(|i| start + step * i as f64).collect()
}

/// Description of a rectangular transverse sampling grid.
///
/// Samples run from `x_start` to `x_fin` inclusive with `nx` points along
/// the horizontal axis, and likewise along the vertical axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransverseGrid {
    pub x_start: f64,
    pub x_fin: f64,
    pub nx: usize,
    pub y_start: f64,
    pub y_fin: f64,
    pub ny: usize,
}

impl TransverseGrid {
    /// Square grid symmetric about the origin with half-width `extent`.
    pub fn symmetric(extent: f64, n: usize) -> Self {
        Self {
            x_start: -extent,
            x_fin: extent,
            nx: n,
            y_start: -extent,
            y_fin: extent,
            ny: n,
        }
    }

    /// Grid centered on zero given per-axis sample counts and spacings.
    pub fn centered(nx: usize, hx: f64, ny: usize, hy: f64) -> Self {
        let half_x = (nx - 1) as f64 * hx / 2.0;
        let half_y = (ny - 1) as f64 * hy / 2.0;
        Self {
            x_start: -half_x,
            x_fin: half_x,
            nx,
            y_start: -half_y,
            y_fin: half_y,
            ny,
        }
    }

    /// Horizontal sample positions.
    pub fn x_coords(&self) -> Vec<f64> {
        linspace(self.x_start, self.x_fin, self.nx)
    }

    /// Vertical sample positions.
    pub fn y_coords(&self) -> Vec<f64> {
        linspace(self.y_start, self.y_fin, self.ny)
    }

    /// Horizontal sample spacing.
    pub fn dx(&self) -> f64 {
        (self.x_fin - self.x_start) / (self.nx - 1) as f64
    }

    /// Vertical sample spacing.
    pub fn dy(&self) -> f64 {
        (self.y_fin - self.y_start) / (self.ny - 1) as f64
    }

    /// Horizontal cell width (grid span divided by sample count), used for
    /// areal-density normalization of photon counts.
    pub fn cell_dx(&self) -> f64 {
        (self.x_fin - self.x_start) / self.nx as f64
    }

    /// Vertical cell width.
    pub fn cell_dy(&self) -> f64 {
        (self.y_fin - self.y_start) / self.ny as f64
    }

    /// True when both axes carry an odd number of samples, i.e. the grid
    /// has a symmetric center sample.
    pub fn is_odd(&self) -> bool {
        self.nx % 2 == 1 && self.ny % 2 == 1
    }

    /// Translate the coordinate frame by `(-dx, -dy)`.
    pub fn shift(&mut self, dx: f64, dy: f64) {
        self.x_start -= dx;
        self.x_fin -= dx;
        self.y_start -= dy;
        self.y_fin -= dy;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn linspace_endpoints_and_spacing() {
        let xs = linspace(-1.0, 1.0, 5);
        assert_eq!(xs.len(), 5);
        assert_relative_eq!(xs[0], -1.0);
        assert_relative_eq!(xs[4], 1.0);
        assert_relative_eq!(xs[2], 0.0);
    }

    #[test]
    fn centered_grid_is_symmetric() {
        let g = TransverseGrid::centered(5, 0.1, 7, 0.2);
        assert_relative_eq!(g.x_start, -g.x_fin);
        assert_relative_eq!(g.y_start, -g.y_fin);
        assert_relative_eq!(g.dx(), 0.1, max_relative = 1e-12);
        assert_relative_eq!(g.dy(), 0.2, max_relative = 1e-12);
        assert!(g.is_odd());
    }

    #[test]
    fn shift_round_trip_restores_frame() {
        let mut g = TransverseGrid::symmetric(0.01, 9);
        let orig = g.clone();
        g.shift(1.5e-3, -2.0e-4);
        g.shift(-1.5e-3, 2.0e-4);
        assert_relative_eq!(g.x_start, orig.x_start, max_relative = 1e-12);
        assert_relative_eq!(g.y_fin, orig.y_fin, max_relative = 1e-12);
    }
}
