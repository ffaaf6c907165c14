//! Saturable-gain calculator.
//!
//! For each spectral component the slice's stored inversion is resampled
//! onto the field grid, a per-cell energy gain is computed from the
//! Frantz–Nodvik saturated-amplifier form, and three updates are applied in
//! place: the photon-count mesh is multiplied by the gain, the inversion
//! mesh is decremented by exactly the extracted population, and the complex
//! field is scaled by √gain so its phase is untouched.
//!
//! The gain state lives in the inversion mesh and accumulates across every
//! sub-slice and every crystal slice touched in a pass: later sub-slices
//! see the depletion left by earlier ones.

use ndarray::Array2;

use tisa_optics::interp::BicubicSpline;
use tisa_optics::pulse::SpectralComponent;
use tisa_optics::spline::CubicSpline;
use tisa_optics::wavefront::Wavefront;

use crate::inversion::{PopulationInversionMesh, MESH_EXTENT_FACTOR};

/// Degeneracy factor relating photon flux to inversion depletion.
pub const DEGENERACY_FACTOR: f64 = 1.67;

/// Below this saturation parameter the closed form loses precision to
/// cancellation and the Taylor expansion takes over.
pub const EPSILON_TAYLOR_CUTOFF: f64 = 1.0e-5;

/// Per-cell energy gain of a saturable amplifier.
///
/// `epsilon` is the dimensionless photon areal density
/// (degeneracy × σ × photons/area) and `beta` the dimensionless stored
/// inversion (σ × ΔN × slice length). Small `epsilon` uses a 4-term Taylor
/// expansion of the exact form; the result is clamped to ≥ 1 so numerical
/// undershoot can never introduce spurious loss.
pub fn energy_gain(epsilon: f64, beta: f64) -> f64 {
    let eb = beta.exp();
    let gain = if epsilon < EPSILON_TAYLOR_CUTOFF {
        eb - 0.5 * epsilon * eb * (eb - 1.0)
            + (1.0 / 6.0) * epsilon * epsilon * eb * (1.0 - 3.0 * eb + 2.0 * eb * eb)
            + (1.0 / 24.0)
                * epsilon.powi(3)
                * eb
                * (1.0 - 7.0 * eb + 12.0 * eb * eb - 6.0 * eb * eb * eb)
    } else {
        (1.0 / epsilon) * (1.0 + eb * (epsilon.exp() - 1.0)).ln()
    };
    gain.max(1.0)
}

/// Apply saturable gain to one spectral component, depleting `inversion`.
pub(crate) fn apply_gain(
    slice_length: f64,
    cross_section: &CubicSpline,
    inversion: &mut PopulationInversionMesh,
    comp: &mut SpectralComponent,
) {
    let grid = comp.wavefront.grid.clone();

    // Inversion density on the field grid.
    let local_inversion = resample_mesh(
        &inversion.coords(),
        &inversion.coords(),
        &inversion.mesh,
        &grid.x_coords(),
        &grid.y_coords(),
        inversion,
    );

    // Emission cross-section at this component's wavelength [m²]. The
    // spline can undershoot below the tabulated floor; a negative σ is
    // unphysical.
    let sigma = cross_section.evaluate(comp.wavelength_m()).max(0.0);

    let cell_area = grid.cell_dx() * grid.cell_dy();
    let n_incident = comp.photons.mesh.mapv(|n| n / cell_area);

    let mut gain = Array2::<f64>::ones((grid.nx, grid.ny));
    for ix in 0..grid.nx {
        for iy in 0..grid.ny {
            let epsilon = DEGENERACY_FACTOR * sigma * n_incident[[ix, iy]];
            let beta = sigma * local_inversion[[ix, iy]] * slice_length;
            gain[[ix, iy]] = energy_gain(epsilon, beta);
        }
    }

    // Extracted inversion corresponds exactly to the photons added.
    let change = Array2::from_shape_fn((grid.nx, grid.ny), |idx| {
        -DEGENERACY_FACTOR * n_incident[idx] * (gain[idx] - 1.0) / slice_length
    });
    let change_native = resample_mesh(
        &grid.x_coords(),
        &grid.y_coords(),
        &change,
        &inversion.coords(),
        &inversion.coords(),
        inversion,
    );
    // Spline overshoot must not re-pump a cell: a gain event only ever
    // removes inversion.
    inversion.mesh += &change_native.mapv(|v| v.min(0.0));

    comp.photons.mesh *= &gain;

    // Scale the field by √gain per cell, preserving phase, through the
    // extraction/reconstruction contract.
    let (ex_re, ex_im, ey_re, ey_im) = comp.wavefront.extract_fields();
    let root = gain.mapv(f64::sqrt);
    comp.wavefront = Wavefront::from_fields(
        ex_re * &root,
        ex_im * &root,
        ey_re * &root,
        ey_im * &root,
        comp.photon_energy_ev,
        grid,
    );
}

/// Bicubic resample between the inversion mesh's grid and a field grid.
///
/// Skipped entirely when the axes already coincide. Target samples outside
/// the source grid's span are zeroed rather than extrapolated — beyond its
/// edge the source mesh carries no data — as are samples outside the
/// inversion mesh's physical extent.
fn resample_mesh(
    src_x: &[f64],
    src_y: &[f64],
    values: &Array2<f64>,
    dst_x: &[f64],
    dst_y: &[f64],
    inversion: &PopulationInversionMesh,
) -> Array2<f64> {
    if src_x == dst_x && src_y == dst_y {
        return values.clone();
    }

    let mut out = BicubicSpline::new(src_x.to_vec(), src_y.to_vec(), values.clone())
        .resample(dst_x, dst_y);

    let (x_lo, x_hi) = (src_x[0], src_x[src_x.len() - 1]);
    let (y_lo, y_hi) = (src_y[0], src_y[src_y.len() - 1]);
    let rim = MESH_EXTENT_FACTOR * inversion.mesh_extent - 0.9 * inversion.cell_size();
    for (ix, &x) in dst_x.iter().enumerate() {
        for (iy, &y) in dst_y.iter().enumerate() {
            let outside_source = x < x_lo || x > x_hi || y < y_lo || y > y_hi;
            if outside_source || (x * x + y * y).sqrt() > rim {
                out[[ix, iy]] = 0.0;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn gain_never_below_unity() {
        // Scan both saturation parameters across their physical ranges,
        // including the Taylor/closed-form boundary.
        for i in 0..60 {
            let epsilon = 1.0e-9 * 10.0_f64.powf(i as f64 * 0.2);
            for j in 0..40 {
                let beta = j as f64 * 0.05;
                let g = energy_gain(epsilon, beta);
                assert!(
                    g >= 1.0,
                    "gain {} < 1 at epsilon={}, beta={}",
                    g,
                    epsilon,
                    beta
                );
            }
        }
    }

    #[test]
    fn zero_inversion_gives_unit_gain() {
        assert_relative_eq!(energy_gain(1.0e-8, 0.0), 1.0, max_relative = 1e-12);
        assert_relative_eq!(energy_gain(0.5, 0.0), 1.0, max_relative = 1e-12);
    }

    #[test]
    fn small_signal_limit_is_exponential() {
        // epsilon -> 0: gain -> e^beta.
        let beta = 0.35;
        assert_relative_eq!(
            energy_gain(1.0e-12, beta),
            beta.exp(),
            max_relative = 1e-9
        );
    }

    #[test]
    fn taylor_and_closed_form_agree_at_the_boundary()
    {
        for &beta in &[0.0, 0.1, 0.5, 1.0, 2.0] {
            let below = energy_gain(EPSILON_TAYLOR_CUTOFF * (1.0 - 1e-9), beta);
            let above = energy_gain(EPSILON_TAYLOR_CUTOFF * (1.0 + 1e-9), beta);
            assert_relative_eq!(below, above, max_relative = 1e-8);
        }
    }

    #[test]
    fn depletion_never_adds_inversion_beyond_the_field_support() {
        use crate::config::PumpConfig;
        use tisa_optics::grid::TransverseGrid;
        use tisa_optics::pulse::SpectralComponent;
        use tisa_optics::wavefront::Wavefront;

        // Field grid much narrower than the inversion mesh: the depletion
        // resampled back must stay zero beyond the field edge instead of
        // extrapolating, and no cell may end up above its seeded value.
        let pump = PumpConfig::default();
        let mut inversion = PopulationInversionMesh::seed(&pump, 0.005, 0, 1);
        let seeded = inversion.mesh.clone();
        let seeded_total = inversion.total(0.005);

        let grid = TransverseGrid::symmetric(3.0e-3, 21);
        let mut comp =
            SpectralComponent::new(Wavefront::gaussian(grid, 1.55, 1.5e-3), 1.0e14);
        let sigma = CubicSpline::new(&[600.0e-9, 1050.0e-9], &[4.8e-23, 4.8e-23]);

        apply_gain(0.005, &sigma, &mut inversion, &mut comp);

        assert!(
            inversion.total(0.005) < seeded_total,
            "gain extraction must deplete the inversion"
        );
        let coords = inversion.coords();
        for (ix, &x) in coords.iter().enumerate() {
            for (iy, &y) in coords.iter().enumerate() {
                let idx = [ix, iy];
                assert!(
                    inversion.mesh[idx] <= seeded[idx],
                    "cell ({}, {}) rose from {} to {}",
                    x,
                    y,
                    seeded[idx],
                    inversion.mesh[idx]
                );
                if x.abs() > 3.0e-3 || y.abs() > 3.0e-3 {
                    assert_relative_eq!(inversion.mesh[idx], seeded[idx]);
                }
            }
        }
    }

    #[test]
    fn gain_monotone_in_stored_inversion() {
        let epsilon = 0.01;
        let mut last = 0.0;
        for j in 1..=20 {
            let g = energy_gain(epsilon, j as f64 * 0.1);
            assert!(g > last);
            last = g;
        }
    }
}
