//! Thermo-optic coupling contract.
//!
//! Heat deposited by the pump perturbs the refractive-index profile; a
//! solver turns the crystal's material constants and a heat-load shape into
//! per-slice `(n0, n2)` arrays plus an equivalent ABCD matrix. The solver
//! itself lives outside this crate — typically a finite-element or
//! analytic radial heat-equation code — and plugs in through
//! [`ThermoOpticSolver`]. [`Crystal::apply_thermo_optic`] validates and
//! installs the result.
//!
//! [`Crystal::apply_thermo_optic`]: crate::crystal::Crystal::apply_thermo_optic

use serde::Deserialize;

use tisa_optics::lct::AbcdMatrix;

use crate::crystal::Crystal;
use crate::error::CrystalError;

/// Transverse shape assumed for the deposited heat load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatLoadModel {
    Gaussian,
    SuperGaussian,
    TopHat,
}

/// Per-slice index profile produced by a thermo-optic solver.
#[derive(Debug, Clone)]
pub struct ThermoOpticSolution {
    /// On-axis refractive index per slice.
    pub n0: Vec<f64>,
    /// Quadratic index coefficient per slice [1/m²].
    pub n2: Vec<f64>,
    /// Equivalent whole-crystal ABCD matrix at the reference wavelength.
    pub abcd: AbcdMatrix,
}

/// A thermal model of the pumped crystal.
pub trait ThermoOpticSolver {
    fn solve(
        &self,
        crystal: &Crystal,
        heat_load: HeatLoadModel,
    ) -> Result<ThermoOpticSolution, CrystalError>;
}
