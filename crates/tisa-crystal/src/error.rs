//! Errors raised by the crystal engine.
//!
//! Configuration problems are fatal at the point of detection and never
//! retried; numerical edge cases are handled by algorithmic branching in
//! the gain calculator, not by error paths.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrystalError {
    #[error("propagation not implemented for pulse direction {direction_deg} (expected 0.0 or 180.0)")]
    InvalidPassDirection { direction_deg: f64 },

    #[error("negative value(s) specified for the quadratic index coefficient n2")]
    NegativeIndexGradient,

    #[error("per-slice array of length {got} does not match nslice = {expected}")]
    SliceCountMismatch { expected: usize, got: usize },

    #[error("radial n2 averaging is only supported with the {supported:?} propagation mode, got {requested:?}")]
    RadialN2Unsupported {
        requested: crate::slice::PropagationMode,
        supported: crate::slice::PropagationMode,
    },

    #[error("nonlinear kick requested but slice {slice_index} carries no delta_n map")]
    MissingDeltaN { slice_index: usize },

    #[error("thermo-optic solver error: {0}")]
    ThermoOptic(String),
}
