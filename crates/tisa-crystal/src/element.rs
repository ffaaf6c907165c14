//! Generic optical-element contract.
//!
//! Anything with a fixed ray-transfer matrix can participate in a beamline
//! pass: the default propagation wavelength-scales the matrix per spectral
//! component, runs the LCT kernel, and re-synchronizes the photon meshes
//! with the moved wavefront grids.

use tisa_optics::lct::{propagate_wavefront, AbcdMatrix};
use tisa_optics::pulse::Pulse;

use crate::error::CrystalError;

pub trait Element {
    /// Fixed ABCD coefficients of this element at the reference wavelength.
    fn abcd(&self) -> AbcdMatrix;

    /// Default pass: per-component wavelength-scaled LCT, then photon-mesh
    /// resync and a final mesh unification across components.
    fn propagate_default(&mut self, mut pulse: Pulse) -> Result<Pulse, CrystalError> {
        let l_scale = pulse.l_scale();
        let fixed = self.abcd();
        for comp in pulse.components_mut() {
            let scaled = fixed.wavelength_scaled(comp.wavelength_m(), l_scale);
            comp.wavefront = propagate_wavefront(&comp.wavefront, scaled, l_scale);
        }
        pulse.update_photon_positions();
        pulse.resize_mesh();
        Ok(pulse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tisa_optics::grid::TransverseGrid;
    use tisa_optics::pulse::Pulse;

    struct FixedDrift;

    impl Element for FixedDrift {
        fn abcd(&self) -> AbcdMatrix {
            AbcdMatrix::drift(0.05)
        }
    }

    #[test]
    fn default_pass_keeps_grids_odd_and_meshes_synchronized() {
        let grid = TransverseGrid::symmetric(2.0e-3, 33);
        let pulse = Pulse::gaussian(grid, 1.55, 8.0e-4, 2, 1, 1.0e12);

        let out = FixedDrift.propagate_default(pulse).unwrap();
        for comp in out.components() {
            assert!(comp.wavefront.grid.is_odd());
            assert_eq!(comp.photons.grid.nx, comp.wavefront.grid.nx);
            assert_eq!(comp.photons.grid.ny, comp.wavefront.grid.ny);
        }
    }

    #[test]
    fn default_pass_conserves_photon_count() {
        let grid = TransverseGrid::symmetric(2.0e-3, 33);
        let pulse = Pulse::gaussian(grid, 1.55, 8.0e-4, 1, 0, 4.0e11);
        let before = pulse.total_photons();

        let out = FixedDrift.propagate_default(pulse).unwrap();
        assert_relative_eq!(out.total_photons(), before, max_relative = 1e-9);
    }
}
