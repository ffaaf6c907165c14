//! Laser-pulse container: time slices × bandwidth sub-slices.
//!
//! A pulse is partitioned into ordered time slices, each further split into
//! bandwidth sub-slices. Every spectral component — a time slice's primary
//! component or one of its bandwidth sub-slices — carries its own photon
//! energy, wavefront, and 2-D photon-count mesh, and the crystal engine
//! treats them all identically and independently.
//!
//! The crystal calls back into this container between slices for the
//! transverse bookkeeping it does not own: coordinate-frame shifts for
//! off-axis pumps, photon-mesh re-derivation after the grid changed under a
//! diffraction step, common-grid resizing at the end of a pass, and the
//! radial blend of two speculatively propagated pulse copies.

use ndarray::Array2;

use crate::grid::TransverseGrid;
use crate::interp::BicubicSpline;
use crate::wavefront::Wavefront;

/// 2-D photon-count mesh with its grid.
#[derive(Debug, Clone)]
pub struct PhotonMesh {
    pub grid: TransverseGrid,
    pub mesh: Array2<f64>,
}

impl PhotonMesh {
    /// Distribute `total` photons across the wavefront's intensity profile.
    pub fn from_wavefront(wfr: &Wavefront, total: f64) -> Self {
        let intensity = Array2::from_shape_fn((wfr.grid.nx, wfr.grid.ny), |idx| {
            wfr.ex[idx].norm_sqr() + wfr.ey[idx].norm_sqr()
        });
        let sum: f64 = intensity.iter().sum();
        let mesh = if sum > 0.0 {
            intensity.mapv(|v| v * total / sum)
        } else {
            intensity
        };
        Self {
            grid: wfr.grid.clone(),
            mesh,
        }
    }

    /// Total photon count.
    pub fn total(&self) -> f64 {
        self.mesh.iter().sum()
    }

    /// Resample onto `target`, conserving the total count.
    ///
    /// Spline undershoot is clamped at zero before renormalization so a
    /// count mesh never goes negative.
    pub fn resample_to(&mut self, target: &TransverseGrid) {
        if self.grid == *target {
            return;
        }
        let before = self.total();
        let resampled = BicubicSpline::new(
            self.grid.x_coords(),
            self.grid.y_coords(),
            self.mesh.clone(),
        )
        .resample(&target.x_coords(), &target.y_coords());
        let mut clamped = resampled.mapv(|v| v.max(0.0));
        let after: f64 = clamped.iter().sum();
        if after > 0.0 && before > 0.0 {
            clamped.mapv_inplace(|v| v * before / after);
        }
        self.mesh = clamped;
        self.grid = target.clone();
    }
}

/// One spectral component: photon energy, field, and photon counts.
#[derive(Debug, Clone)]
pub struct SpectralComponent {
    pub photon_energy_ev: f64,
    pub wavefront: Wavefront,
    pub photons: PhotonMesh,
}

impl SpectralComponent {
    pub fn new(wavefront: Wavefront, total_photons: f64) -> Self {
        Self {
            photon_energy_ev: wavefront.photon_energy_ev,
            photons: PhotonMesh::from_wavefront(&wavefront, total_photons),
            wavefront,
        }
    }

    /// Wavelength in meters.
    pub fn wavelength_m(&self) -> f64 {
        self.wavefront.wavelength_m()
    }
}

/// One time slice: a primary component plus its bandwidth sub-slices.
#[derive(Debug, Clone)]
pub struct PulseSlice {
    pub primary: SpectralComponent,
    pub bandwidth: Vec<SpectralComponent>,
}

/// A coherent laser pulse.
///
/// `direction_deg` is the pass direction through downstream optics: 0.0 for
/// forward, 180.0 for reversed. Other values are rejected by consumers.
#[derive(Debug, Clone)]
pub struct Pulse {
    pub direction_deg: f64,
    pub sigx_waist: f64,
    pub slices: Vec<PulseSlice>,
}

impl Pulse {
    /// Forward-going pulse of Gaussian time slices on a common grid.
    ///
    /// Each slice (and each of its `bw_nslice` bandwidth sub-slices) gets a
    /// Gaussian wavefront of waist `sigx_waist·√2` and `photons_per_slice`
    /// photons.
    pub fn gaussian(
        grid: TransverseGrid,
        photon_energy_ev: f64,
        sigx_waist: f64,
        nslice: usize,
        bw_nslice: usize,
        photons_per_slice: f64,
    ) -> Self {
        let waist = sigx_waist * std::f64::consts::SQRT_2;
        let slices = (0..nslice)
            .map(|_| {
                let wfr = Wavefront::gaussian(grid.clone(), photon_energy_ev, waist);
                PulseSlice {
                    primary: SpectralComponent::new(wfr.clone(), photons_per_slice),
                    bandwidth: (0..bw_nslice)
                        .map(|_| SpectralComponent::new(wfr.clone(), photons_per_slice))
                        .collect(),
                }
            })
            .collect();
        Self {
            direction_deg: 0.0,
            sigx_waist,
            slices,
        }
    }

    /// Length-scale factor for LCT propagation, `√π · sigx_waist · √2`.
    pub fn l_scale(&self) -> f64 {
        std::f64::consts::PI.sqrt() * self.sigx_waist * std::f64::consts::SQRT_2
    }

    /// Iterate over every spectral component mutably, primaries first
    /// within each time slice, then that slice's bandwidth sub-slices.
    pub fn components_mut(&mut self) -> impl Iterator<Item = &mut SpectralComponent> {
        self.slices.iter_mut().flat_map(|s| {
            std::iter::once(&mut s.primary).chain(s.bandwidth.iter_mut())
        })
    }

    /// Iterate over every spectral component.
    pub fn components(&self) -> impl Iterator<Item = &SpectralComponent> {
        self.slices
            .iter()
            .flat_map(|s| std::iter::once(&s.primary).chain(s.bandwidth.iter()))
    }

    /// Total photon count over all components.
    pub fn total_photons(&self) -> f64 {
        self.components().map(|c| c.photons.total()).sum()
    }

    /// Translate every transverse coordinate frame by `(-dx, -dy)`.
    ///
    /// Called with the pump offset before a crystal pass so per-slice
    /// computations see a centered pump, and with the negated offset after.
    pub fn shift_transverse(&mut self, dx: f64, dy: f64) {
        for comp in self.components_mut() {
            comp.wavefront.grid.shift(dx, dy);
            comp.photons.grid.shift(dx, dy);
        }
    }

    /// Re-derive photon bookkeeping after propagation may have changed the
    /// wavefront grids: each photon mesh is resampled onto its component's
    /// current wavefront grid, conserving the total count.
    pub fn update_photon_positions(&mut self) {
        for comp in self.components_mut() {
            let target = comp.wavefront.grid.clone();
            comp.photons.resample_to(&target);
        }
    }

    /// Resize every component onto the pulse's current common grid
    /// (the first time slice's wavefront grid).
    ///
    /// Diffraction steps let each component's sampling drift apart with
    /// wavelength; this brings the whole pulse back onto one transverse
    /// mesh. Odd sample counts are preserved because the reference grid
    /// comes out of the propagation plumbing odd.
    pub fn resize_mesh(&mut self) {
        let reference = match self.slices.first() {
            Some(s) => s.primary.wavefront.grid.clone(),
            None => return,
        };
        for comp in self.components_mut() {
            if comp.wavefront.grid != reference {
                comp.wavefront = resample_wavefront(&comp.wavefront, &reference);
            }
            comp.photons.resample_to(&reference);
        }
    }

    /// Combine two speculatively propagated copies of the same pulse into
    /// one, blending by radius.
    ///
    /// `n2_max` was propagated through the slice as configured, `n2_zero`
    /// through an identical slice with its quadratic index term forced to
    /// zero. The blend weight on the `n2_zero` result is
    /// `g(r) = exp(-2 (r / (factor·waist))²)`; `factor → 0` recovers the
    /// `n2_max` result and `waist → ∞` the `n2_zero` result. The weight is
    /// an approximation to azimuthally varying gain saturation, calibrated
    /// rather than derived.
    pub fn blend_radial_n2(n2_max: Pulse, n2_zero: Pulse, factor: f64, waist: f64) -> Pulse {
        assert_eq!(
            n2_max.slices.len(),
            n2_zero.slices.len(),
            "blend requires structurally identical pulses"
        );
        let mut out = n2_max;
        let scale = factor * waist;

        for (slice_out, slice_zero) in out.slices.iter_mut().zip(n2_zero.slices.into_iter()) {
            let pairs = std::iter::once((&mut slice_out.primary, slice_zero.primary)).chain(
                slice_out
                    .bandwidth
                    .iter_mut()
                    .zip(slice_zero.bandwidth.into_iter()),
            );
            for (comp_max, mut comp_zero) in pairs {
                let grid = comp_max.wavefront.grid.clone();
                if comp_zero.wavefront.grid != grid {
                    comp_zero.wavefront = resample_wavefront(&comp_zero.wavefront, &grid);
                }
                comp_zero.photons.resample_to(&grid);

                let xs = grid.x_coords();
                let ys = grid.y_coords();
                for ix in 0..grid.nx {
                    for iy in 0..grid.ny {
                        let r2 = xs[ix] * xs[ix] + ys[iy] * ys[iy];
                        let g = if scale > 0.0 {
                            (-2.0 * r2 / (scale * scale)).exp()
                        } else {
                            0.0
                        };
                        let idx = [ix, iy];
                        comp_max.wavefront.ex[idx] = comp_max.wavefront.ex[idx] * (1.0 - g)
                            + comp_zero.wavefront.ex[idx] * g;
                        comp_max.wavefront.ey[idx] = comp_max.wavefront.ey[idx] * (1.0 - g)
                            + comp_zero.wavefront.ey[idx] * g;
                        comp_max.photons.mesh[idx] = comp_max.photons.mesh[idx] * (1.0 - g)
                            + comp_zero.photons.mesh[idx] * g;
                    }
                }
            }
        }
        out
    }
}

/// Bicubic resample of a wavefront's component planes onto `target`.
fn resample_wavefront(wfr: &Wavefront, target: &TransverseGrid) -> Wavefront {
    let (ex_re, ex_im, ey_re, ey_im) = wfr.extract_fields();
    let xs = wfr.grid.x_coords();
    let ys = wfr.grid.y_coords();
    let bx = target.x_coords();
    let by = target.y_coords();
    let run = |plane: Array2<f64>| {
        BicubicSpline::new(xs.clone(), ys.clone(), plane).resample(&bx, &by)
    };
    Wavefront::from_fields(
        run(ex_re),
        run(ex_im),
        run(ey_re),
        run(ey_im),
        wfr.photon_energy_ev,
        target.clone(),
    )
}
