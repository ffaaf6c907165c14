//! Nonlinear phase kick from a measured index perturbation.
//!
//! A slice may carry a measured 2-D refractive-index perturbation Δn on its
//! own radial grid. The kick multiplies the complex field by the
//! phase-only term `exp(i Δn(x,y) L / λ)` — no amplitude change, both
//! transverse components and both polarizations kicked identically.

use ndarray::Array2;
use num_complex::Complex64;

use tisa_optics::grid::linspace;
use tisa_optics::interp::resample_bilinear;
use tisa_optics::pulse::SpectralComponent;

/// Measured index-perturbation map on a square radial grid spanning
/// ±`extent` (azimuthal symmetry assumed upstream).
#[derive(Debug, Clone)]
pub struct DeltaNMap {
    pub values: Array2<f64>,
    pub extent: f64,
}

impl DeltaNMap {
    /// Sample positions along each axis.
    pub fn coords(&self) -> Vec<f64> {
        linspace(-self.extent, self.extent, self.values.dim().0)
    }
}

/// Apply the nonlinear kick to one spectral component in place.
pub(crate) fn apply_kick(slice_length: f64, delta_n: &DeltaNMap, comp: &mut SpectralComponent) {
    let grid = &comp.wavefront.grid;
    let src = delta_n.coords();

    // Δn on the field grid; out-of-domain samples clamp to the map edge so
    // the phase stays finite everywhere.
    let delta_n_local = resample_bilinear(
        &src,
        &src,
        &delta_n.values,
        &grid.x_coords(),
        &grid.y_coords(),
    );

    let l_over_lambda = slice_length / comp.wavelength_m();
    for ix in 0..grid.nx {
        for iy in 0..grid.ny {
            let kick = Complex64::new(0.0, delta_n_local[[ix, iy]] * l_over_lambda).exp();
            comp.wavefront.ex[[ix, iy]] *= kick;
            comp.wavefront.ey[[ix, iy]] *= kick;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tisa_optics::grid::TransverseGrid;
    use tisa_optics::pulse::SpectralComponent;
    use tisa_optics::wavefront::Wavefront;

    fn component() -> SpectralComponent {
        let grid = TransverseGrid::symmetric(1.0e-3, 11);
        SpectralComponent::new(Wavefront::gaussian(grid, 1.55, 5.0e-4), 1.0e9)
    }

    #[test]
    fn kick_preserves_amplitude() {
        let mut comp = component();
        let before = comp.wavefront.total_intensity();

        let delta_n = DeltaNMap {
            values: Array2::from_shape_fn((9, 9), |(i, j)| 1.0e-6 * (i + j) as f64),
            extent: 2.0e-3,
        };
        apply_kick(0.01, &delta_n, &mut comp);

        assert_relative_eq!(
            comp.wavefront.total_intensity(),
            before,
            max_relative = 1e-12
        );
    }

    #[test]
    fn uniform_delta_n_applies_global_phase() {
        let mut comp = component();
        let reference = comp.wavefront.ex.clone();

        let delta_n = DeltaNMap {
            values: Array2::from_elem((5, 5), 2.0e-6),
            extent: 2.0e-3,
        };
        let slice_length = 0.01;
        apply_kick(slice_length, &delta_n, &mut comp);

        let expected_phase = 2.0e-6 * slice_length / comp.wavelength_m();
        let rotation = Complex64::new(0.0, expected_phase).exp();
        for (out, orig) in comp.wavefront.ex.iter().zip(reference.iter()) {
            let want = orig * rotation;
            assert_relative_eq!(out.re, want.re, epsilon = 1e-12);
            assert_relative_eq!(out.im, want.im, epsilon = 1e-12);
        }
    }
}
