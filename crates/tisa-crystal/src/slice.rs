//! One longitudinal crystal slice and its propagation-mode dispatch.
//!
//! A slice owns its optical parameters, its population-inversion mesh, and
//! the dispatch over the propagation algorithms. All modes share the same
//! per-component order: gain (if requested), then the nonlinear kick (if
//! requested), then the optical transform — gain must see the field before
//! diffraction spreads it.

use serde::Deserialize;

use tisa_optics::beamline::{Beamline, BeamlineElement};
use tisa_optics::lct::{propagate_wavefront, AbcdMatrix};
use tisa_optics::pulse::{Pulse, SpectralComponent};
use tisa_optics::spline::CubicSpline;

use crate::config::PumpConfig;
use crate::element::Element;
use crate::error::CrystalError;
use crate::gain;
use crate::inversion::PopulationInversionMesh;
use crate::kick::{self, DeltaNMap};

/// Wavelength-dependent stimulated-emission cross-section of Ti:sapphire,
/// P. F. Moulton, J. Opt. Soc. Am. B 3, 125 (1986). Peak value 4.8e-23 m².
const CROSS_SECTION_WAVELENGTHS_M: [f64; 12] = [
    600.0e-9, 625.0e-9, 650.0e-9, 700.0e-9, 750.0e-9, 800.0e-9, 850.0e-9, 900.0e-9, 950.0e-9,
    1000.0e-9, 1025.0e-9, 1050.0e-9,
];
const CROSS_SECTION_RELATIVE: [f64; 12] = [
    0.0, 0.02, 0.075, 0.437, 0.845, 0.99, 0.815, 0.6, 0.415, 0.276, 0.255, 0.247,
];
const CROSS_SECTION_PEAK_M2: f64 = 4.8e-23;

/// Propagation algorithm selector.
///
/// An unknown mode name is rejected at the deserialization boundary; the
/// dispatch itself is an exhaustive match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropagationMode {
    /// Fixed precomputed ABCD matrix, wavelength-scaled off-diagonals,
    /// realized by the LCT kernel.
    AbcdLct,
    /// ABCD matrix derived per call from `(n0, n2)` via the graded-index
    /// analytic solution, realized by the LCT kernel.
    N0n2Lct,
    /// The same analytic matrix realized as a thin-lens/drift/thin-lens
    /// beamline handed to the fixed-index propagator.
    N0n2Srw,
    /// No optical propagation; applies gain only.
    GainCalc,
    /// Forward to the generic [`Element`] contract.
    Default,
}

/// Analytic ray-transfer matrix of a graded-index duct of length `length`:
/// `γ = √(n2/n0)`, `A = D = cos(γL)`, `B = sin(γL)/(n0·γ)`,
/// `C = -n0·γ·sin(γL)`. Unit determinant for any `n0 > 0, n2 ≥ 0`; the
/// flat-index limit is a drift of `L/n0`.
pub fn grin_abcd(n0: f64, n2: f64, length: f64) -> AbcdMatrix {
    let gamma = (n2 / n0).sqrt();
    let arg = gamma * length;
    let a = arg.cos();
    let b = if arg.abs() < 1e-12 {
        length / n0
    } else {
        arg.sin() / (n0 * gamma)
    };
    let c = -n0 * gamma * arg.sin();
    AbcdMatrix::new(a, b, c, a)
}

/// One longitudinal segment of the crystal.
#[derive(Debug, Clone)]
pub struct CrystalSlice {
    /// Slice thickness [m].
    pub length: f64,
    /// Total slice count of the owning crystal.
    pub nslice: usize,
    /// 0-based position along the construction direction.
    pub slice_index: usize,
    /// On-axis refractive index.
    pub n0: f64,
    /// Quadratic transverse index variation [1/m²].
    pub n2: f64,
    /// Fixed ABCD coefficients for [`PropagationMode::AbcdLct`].
    pub abcd: AbcdMatrix,
    /// Width factor of the radial gain-averaging blend.
    pub radial_n2_factor: f64,
    /// Optional measured index-perturbation map.
    pub delta_n: Option<DeltaNMap>,
    /// Pump parameters this slice was seeded with.
    pub pump: PumpConfig,
    /// Stored population inversion, depleted by gain extraction.
    pub inversion: PopulationInversionMesh,
    cross_section: CubicSpline,
}

impl CrystalSlice {
    /// Build a slice and seed its inversion mesh from the pump model.
    pub fn new(
        length: f64,
        slice_index: usize,
        nslice: usize,
        n0: f64,
        n2: f64,
        abcd: AbcdMatrix,
        radial_n2_factor: f64,
        delta_n: Option<DeltaNMap>,
        pump: PumpConfig,
    ) -> Self {
        let inversion = PopulationInversionMesh::seed(&pump, length, slice_index, nslice);
        let sigma: Vec<f64> = CROSS_SECTION_RELATIVE
            .iter()
            .map(|&r| r * CROSS_SECTION_PEAK_M2)
            .collect();
        Self {
            length,
            nslice,
            slice_index,
            n0,
            n2,
            abcd,
            radial_n2_factor,
            delta_n,
            pump,
            inversion,
            cross_section: CubicSpline::new(&CROSS_SECTION_WAVELENGTHS_M, &sigma),
        }
    }

    /// Propagate a pulse through this slice with the selected algorithm.
    pub fn propagate(
        &mut self,
        pulse: Pulse,
        mode: PropagationMode,
        calc_gain: bool,
        nl_kick: bool,
    ) -> Result<Pulse, CrystalError> {
        match mode {
            PropagationMode::AbcdLct => {
                let abcd = self.abcd;
                self.propagate_lct_mode(pulse, abcd, calc_gain, nl_kick)
            }
            PropagationMode::N0n2Lct => {
                let abcd = grin_abcd(self.n0, self.n2, self.length);
                self.propagate_lct_mode(pulse, abcd, calc_gain, nl_kick)
            }
            PropagationMode::N0n2Srw => self.propagate_beamline(pulse, calc_gain, nl_kick),
            PropagationMode::GainCalc => Ok(self.propagate_gain_only(pulse)),
            PropagationMode::Default => self.propagate_default(pulse),
        }
    }

    /// Gain and/or kick for one component, in that order.
    fn gain_and_kick(
        &mut self,
        comp: &mut SpectralComponent,
        calc_gain: bool,
        nl_kick: bool,
    ) -> Result<(), CrystalError> {
        if calc_gain {
            gain::apply_gain(self.length, &self.cross_section, &mut self.inversion, comp);
        }
        if nl_kick {
            let delta_n = self.delta_n.as_ref().ok_or(CrystalError::MissingDeltaN {
                slice_index: self.slice_index,
            })?;
            kick::apply_kick(self.length, delta_n, comp);
        }
        Ok(())
    }

    /// Shared body of the two LCT-backed modes: the matrix differs, the
    /// per-component plumbing does not.
    fn propagate_lct_mode(
        &mut self,
        mut pulse: Pulse,
        abcd: AbcdMatrix,
        calc_gain: bool,
        nl_kick: bool,
    ) -> Result<Pulse, CrystalError> {
        let l_scale = pulse.l_scale();
        let mut components: Vec<&mut SpectralComponent> = pulse.components_mut().collect();
        for comp in components.iter_mut() {
            self.gain_and_kick(comp, calc_gain, nl_kick)?;
            let scaled = abcd.wavelength_scaled(comp.wavelength_m(), l_scale);
            comp.wavefront = propagate_wavefront(&comp.wavefront, scaled, l_scale);
        }
        Ok(pulse)
    }

    /// Thin-lens/drift/thin-lens realization handed to the fixed-index
    /// propagator; a flat-index slice degenerates to a single drift.
    fn propagate_beamline(
        &mut self,
        mut pulse: Pulse,
        calc_gain: bool,
        nl_kick: bool,
    ) -> Result<Pulse, CrystalError> {
        let line = if self.n2 == 0.0 {
            Beamline::new(vec![BeamlineElement::Drift {
                length: self.length / self.n0,
            }])
        } else {
            let m = grin_abcd(self.n0, self.n2, self.length);
            let f1 = m.b / (1.0 - m.a);
            let f2 = m.b / (1.0 - m.d);
            Beamline::new(vec![
                BeamlineElement::Lens { fx: f1, fy: f1 },
                BeamlineElement::Drift { length: m.b },
                BeamlineElement::Lens { fx: f2, fy: f2 },
            ])
        };

        let l_scale = pulse.l_scale();
        let mut components: Vec<&mut SpectralComponent> = pulse.components_mut().collect();
        for comp in components.iter_mut() {
            self.gain_and_kick(comp, calc_gain, nl_kick)?;
            comp.wavefront = line.propagate(&comp.wavefront, l_scale);
        }
        Ok(pulse)
    }

    /// Gain for every component regardless of the `calc_gain` flag.
    fn propagate_gain_only(&mut self, mut pulse: Pulse) -> Pulse {
        let mut components: Vec<&mut SpectralComponent> = pulse.components_mut().collect();
        for comp in components.iter_mut() {
            gain::apply_gain(self.length, &self.cross_section, &mut self.inversion, comp);
        }
        pulse
    }
}

impl Element for CrystalSlice {
    fn abcd(&self) -> AbcdMatrix {
        self.abcd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn grin_matrix_has_unit_determinant() {
        // Property over a sweep of physical parameters, including large
        // gamma*L where a missing 1/n0 factor would show up immediately.
        for &n0 in &[1.0, 1.45, 1.75, 2.4] {
            for &n2 in &[0.0, 1.0e-4, 0.001, 0.5, 20.0] {
                for &length in &[1.0e-3, 0.02, 0.2, 1.5] {
                    let m = grin_abcd(n0, n2, length);
                    assert_relative_eq!(
                        m.det(),
                        1.0,
                        epsilon = 1e-12,
                        max_relative = 1e-12
                    );
                }
            }
        }
    }

    #[test]
    fn flat_index_matrix_is_a_drift() {
        let m = grin_abcd(1.75, 0.0, 0.02);
        assert_relative_eq!(m.a, 1.0);
        assert_relative_eq!(m.b, 0.02 / 1.75, max_relative = 1e-12);
        assert_relative_eq!(m.c, 0.0);
        assert_relative_eq!(m.d, 1.0);
    }

    #[test]
    fn lens_drift_lens_reproduces_the_grin_matrix() {
        let m = grin_abcd(1.75, 12.0, 0.05);
        let f1 = m.b / (1.0 - m.a);
        let f2 = m.b / (1.0 - m.d);

        // Compose lens(f2) * drift(B) * lens(f1) by hand.
        let compose = |p: AbcdMatrix, q: AbcdMatrix| {
            AbcdMatrix::new(
                p.a * q.a + p.b * q.c,
                p.a * q.b + p.b * q.d,
                p.c * q.a + p.d * q.c,
                p.c * q.b + p.d * q.d,
            )
        };
        let lens = |f: f64| AbcdMatrix::new(1.0, 0.0, -1.0 / f, 1.0);
        let total = compose(lens(f2), compose(AbcdMatrix::drift(m.b), lens(f1)));

        assert_relative_eq!(total.a, m.a, max_relative = 1e-10);
        assert_relative_eq!(total.b, m.b, max_relative = 1e-10);
        assert_relative_eq!(total.c, m.c, max_relative = 1e-10);
        assert_relative_eq!(total.d, m.d, max_relative = 1e-10);
    }

    #[test]
    fn mode_names_deserialize_and_unknowns_fail() {
        #[derive(Deserialize)]
        struct Holder {
            mode: PropagationMode,
        }
        let ok: Holder = toml::from_str("mode = \"n0n2_srw\"").unwrap();
        assert_eq!(ok.mode, PropagationMode::N0n2Srw);
        let bad: Result<Holder, _> = toml::from_str("mode = \"warp_drive\"");
        assert!(bad.is_err());
    }
}
