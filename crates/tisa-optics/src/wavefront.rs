//! The opaque transverse-field container.
//!
//! A [`Wavefront`] holds both polarization components of a coherent complex
//! field on a rectangular grid, together with the photon energy that fixes
//! its wavelength. The crystal engine only ever touches it through the
//! extraction/reconstruction contract: pull out the four real component
//! planes, operate on them, and rebuild a new wavefront from the results.

use ndarray::Array2;
use num_complex::Complex64;

use crate::grid::TransverseGrid;

/// hc in eV·µm; converts photon energy to wavelength.
pub const HC_EV_UM: f64 = 1.23984198;

/// Complex transverse field (both polarizations) on a rectangular grid.
///
/// Arrays are indexed `[ix, iy]` with `ix` along the horizontal axis.
#[derive(Debug, Clone)]
pub struct Wavefront {
    pub grid: TransverseGrid,
    pub photon_energy_ev: f64,
    pub ex: Array2<Complex64>,
    pub ey: Array2<Complex64>,
}

impl Wavefront {
    /// Rebuild a wavefront from the four real component planes.
    ///
    /// This is the reconstruction half of the field contract; the arrays
    /// must all have shape `(grid.nx, grid.ny)`.
    pub fn from_fields(
        ex_re: Array2<f64>,
        ex_im: Array2<f64>,
        ey_re: Array2<f64>,
        ey_im: Array2<f64>,
        photon_energy_ev: f64,
        grid: TransverseGrid,
    ) -> Self {
        assert_eq!(ex_re.dim(), (grid.nx, grid.ny), "field/grid shape mismatch");
        let ex = Array2::from_shape_fn(ex_re.dim(), |idx| {
            Complex64::new(ex_re[idx], ex_im[idx])
        });
        let ey = Array2::from_shape_fn(ey_re.dim(), |idx| {
            Complex64::new(ey_re[idx], ey_im[idx])
        });
        Self {
            grid,
            photon_energy_ev,
            ex,
            ey,
        }
    }

    /// Extract the four real component planes `(ex_re, ex_im, ey_re, ey_im)`.
    pub fn extract_fields(&self) -> (Array2<f64>, Array2<f64>, Array2<f64>, Array2<f64>) {
        (
            self.ex.mapv(|c| c.re),
            self.ex.mapv(|c| c.im),
            self.ey.mapv(|c| c.re),
            self.ey.mapv(|c| c.im),
        )
    }

    /// Wavelength in meters corresponding to the photon energy.
    pub fn wavelength_m(&self) -> f64 {
        HC_EV_UM / self.photon_energy_ev * 1e-6
    }

    /// Total field "energy" `Σ (|Ex|² + |Ey|²)` over all samples
    /// (unnormalized; used for conservation checks).
    pub fn total_intensity(&self) -> f64 {
        self.ex.iter().map(|c| c.norm_sqr()).sum::<f64>()
            + self.ey.iter().map(|c| c.norm_sqr()).sum::<f64>()
    }

    /// Horizontally polarized Gaussian field `exp(-r²/w²)` of waist `w`.
    pub fn gaussian(grid: TransverseGrid, photon_energy_ev: f64, waist: f64) -> Self {
        let xs = grid.x_coords();
        let ys = grid.y_coords();
        let ex = Array2::from_shape_fn((grid.nx, grid.ny), |(ix, iy)| {
            let r2 = xs[ix] * xs[ix] + ys[iy] * ys[iy];
            Complex64::new((-r2 / (waist * waist)).exp(), 0.0)
        });
        let ey = Array2::zeros((grid.nx, grid.ny));
        Self {
            grid,
            photon_energy_ev,
            ex,
            ey,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::TransverseGrid;
    use approx::assert_relative_eq;

    #[test]
    fn field_contract_round_trip() {
        let grid = TransverseGrid::symmetric(1.0e-3, 7);
        let wfr = Wavefront::gaussian(grid.clone(), 1.55, 5.0e-4);
        let (xr, xi, yr, yi) = wfr.extract_fields();
        let back = Wavefront::from_fields(xr, xi, yr, yi, wfr.photon_energy_ev, grid);
        assert_relative_eq!(
            back.total_intensity(),
            wfr.total_intensity(),
            max_relative = 1e-12
        );
    }

    #[test]
    fn wavelength_from_photon_energy() {
        let grid = TransverseGrid::symmetric(1.0e-3, 3);
        let wfr = Wavefront::gaussian(grid, 1.55, 5.0e-4);
        // 1.55 eV is ~800 nm.
        assert_relative_eq!(wfr.wavelength_m(), 800.0e-9, max_relative = 1e-3);
    }
}
