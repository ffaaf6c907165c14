//! # tisa-optics
//!
//! Wave-optics building blocks consumed by the crystal engine in
//! `tisa-crystal`. This crate owns everything the gain core treats as an
//! external collaborator:
//!
//! - [`grid`] — Rectangular transverse sampling grids; grid metadata is
//!   always carried with a field.
//! - [`wavefront`] — The opaque complex-field container and its
//!   extraction/reconstruction contract.
//! - [`pulse`] — A laser pulse partitioned into time slices and bandwidth
//!   sub-slices, with the transverse bookkeeping the crystal calls between
//!   slices.
//! - [`spline`] — Natural cubic spline interpolation for tabulated curves.
//! - [`interp`] — 2-D bicubic and bilinear resampling between grids.
//! - [`lct`] — The separable 2-D linear canonical transform kernel and the
//!   odd-grid wavefront plumbing around it.
//! - [`beamline`] — A fixed-index lens/drift propagator used by the
//!   thin-lens decomposition of the graded-index slice.

pub mod beamline;
pub mod grid;
pub mod interp;
pub mod lct;
pub mod pulse;
pub mod spline;
pub mod wavefront;
