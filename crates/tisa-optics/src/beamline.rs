//! Fixed-index beamline propagation.
//!
//! A [`Beamline`] is an ordered chain of ideal thin lenses and free drifts
//! applied to a wavefront. The crystal engine uses it to realize the
//! thin-lens/drift/thin-lens decomposition of a graded-index slice, and a
//! single drift for the flat-index degenerate.

use num_complex::Complex64;

use crate::lct::{propagate_wavefront, AbcdMatrix};
use crate::wavefront::Wavefront;

/// One element of a fixed-index beamline.
#[derive(Debug, Clone, Copy)]
pub enum BeamlineElement {
    /// Free drift of the given length [m].
    Drift { length: f64 },
    /// Ideal thin lens with per-axis focal lengths [m].
    Lens { fx: f64, fy: f64 },
}

/// An ordered chain of beamline elements.
#[derive(Debug, Clone)]
pub struct Beamline {
    elements: Vec<BeamlineElement>,
}

impl Beamline {
    pub fn new(elements: Vec<BeamlineElement>) -> Self {
        Self { elements }
    }

    /// Propagate a wavefront through every element in order.
    ///
    /// Drifts run through the LCT kernel; lenses are the multiplicative
    /// quadratic phase `exp(-iπ (x²/fx + y²/fy)/λ)` and leave the grid
    /// unchanged.
    pub fn propagate(&self, wfr: &Wavefront, l_scale: f64) -> Wavefront {
        let mut current = wfr.clone();
        for element in &self.elements {
            current = match *element {
                BeamlineElement::Drift { length } => {
                    let abcd = AbcdMatrix::drift(length)
                        .wavelength_scaled(current.wavelength_m(), l_scale);
                    propagate_wavefront(&current, abcd, l_scale)
                }
                BeamlineElement::Lens { fx, fy } => apply_lens(&current, fx, fy),
            };
        }
        current
    }
}

fn apply_lens(wfr: &Wavefront, fx: f64, fy: f64) -> Wavefront {
    let lambda = wfr.wavelength_m();
    let xs = wfr.grid.x_coords();
    let ys = wfr.grid.y_coords();

    let mut out = wfr.clone();
    for ix in 0..wfr.grid.nx {
        for iy in 0..wfr.grid.ny {
            let phase = -std::f64::consts::PI
                * (xs[ix] * xs[ix] / fx + ys[iy] * ys[iy] / fy)
                / lambda;
            let t = Complex64::new(0.0, phase).exp();
            out.ex[[ix, iy]] *= t;
            out.ey[[ix, iy]] *= t;
        }
    }
    out
}
