//! Saturable-gain laser crystal engine.
//!
//! Models a longitudinally sliced Ti:sapphire gain crystal: a pulse walks
//! the slice stack, and each slice optionally applies saturable gain from
//! its stored population inversion, a nonlinear phase kick from a measured
//! index-perturbation map, and one of three optical transforms — a fixed
//! ABCD matrix through the LCT kernel, a graded-index analytic matrix
//! through the same kernel, or the matrix's thin-lens/drift/thin-lens
//! decomposition through the fixed-index beamline propagator.
//!
//! Gain follows the Frantz–Nodvik saturated-amplifier form per transverse
//! cell; extraction depletes the slice's inversion mesh in place, so later
//! time slices and subsequent passes see a weaker amplifier. Pump
//! deposition (Beer–Lambert longitudinally, super-Gaussian radially) seeds
//! the meshes at construction.

pub mod config;
pub mod crystal;
pub mod element;
pub mod error;
pub mod gain;
pub mod inversion;
pub mod kick;
pub mod slice;
pub mod thermal;

pub use config::{load_config, CrystalConfig, PumpConfig, PumpType};
pub use crystal::Crystal;
pub use element::Element;
pub use error::CrystalError;
pub use kick::DeltaNMap;
pub use slice::{grin_abcd, CrystalSlice, PropagationMode};
pub use thermal::{HeatLoadModel, ThermoOpticSolution, ThermoOpticSolver};
