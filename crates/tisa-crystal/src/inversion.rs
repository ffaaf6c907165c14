//! Population-inversion mesh and the pump deposition model.
//!
//! Each crystal slice owns a square 2-D mesh of population-inversion
//! density (twice the excited-state density), seeded once at construction
//! from a Beer–Lambert longitudinal absorption factor, a normalized radial
//! super-Gaussian deposition profile, and a per-photon energy term. Gain
//! extraction during propagation only ever depletes the mesh; no pumping
//! happens mid-pass.

use ndarray::Array2;

use tisa_optics::grid::linspace;

use crate::config::{PumpConfig, PumpType};

/// Planck constant [J·s].
const PLANCK: f64 = 6.62607015e-34;
/// Speed of light [m/s].
const SPEED_OF_LIGHT: f64 = 2.99792458e8;

/// The inversion mesh physically spans ±`MESH_EXTENT_FACTOR × mesh_extent`.
pub const MESH_EXTENT_FACTOR: f64 = 1.15;

/// Longitudinal window of one slice as seen from a pump face:
/// distance from the face to the slice center, front edge, and back edge.
#[derive(Debug, Clone, Copy)]
struct PumpWindow {
    z_front: f64,
    z_back: f64,
}

/// 2-D mesh of population-inversion density [1/m³].
#[derive(Debug, Clone)]
pub struct PopulationInversionMesh {
    pub mesh: Array2<f64>,
    /// Configured half-extent [m]; the grid spans ±1.15 × this.
    pub mesh_extent: f64,
    pub n_cells: usize,
}

impl PopulationInversionMesh {
    /// Seed the mesh from the pump deposition model.
    ///
    /// `slice_index` is the 0-based position along the construction
    /// direction, `slice_length` the slice thickness, and `nslice` the
    /// total slice count (all slices are assumed equal length).
    pub fn seed(
        pump: &PumpConfig,
        slice_length: f64,
        slice_index: usize,
        nslice: usize,
    ) -> Self {
        let coords = Self::grid_coords(pump.mesh_extent, pump.n_cells);
        let windows = pump_windows(pump.pump_type, slice_length, slice_index, nslice);

        let order = pump.pump_gaussian_order;
        // Closed-form normalization of the super-Gaussian fluence profile.
        let integral_factor = (order / (std::f64::consts::PI * pump.pump_waist * pump.pump_waist))
            / (2.0_f64.powf((order - 2.0) / order) * gamma(2.0 / order));

        // Energy not converted to excited states is assumed lost to heat.
        let fraction_to_heating = (pump.lambda_seed - pump.lambda_pump) / pump.lambda_seed;
        let energy_term = (pump.pump_wavelength / (PLANCK * SPEED_OF_LIGHT))
            * (1.0 - fraction_to_heating)
            * pump.pump_energy;

        let dz = slice_length;
        let mut excited = Array2::<f64>::zeros((pump.n_cells, pump.n_cells));
        for window in &windows {
            // Beer–Lambert fraction absorbed within this slice, per unit length.
            let alpha_term = ((-pump.crystal_alpha * window.z_front).exp()
                - (-pump.crystal_alpha * window.z_back).exp())
                / (pump.crystal_alpha * dz);

            for (ix, &x) in coords.iter().enumerate() {
                for (iy, &y) in coords.iter().enumerate() {
                    let dx = x - pump.pump_offset_x;
                    let dy = y - pump.pump_offset_y;
                    let r = (dx * dx + dy * dy).sqrt();
                    let radial_term = (-2.0 * (r / pump.pump_waist).powf(order)).exp();
                    excited[[ix, iy]] += energy_term * alpha_term * radial_term * integral_factor
                        / (dz * nslice as f64);
                }
            }
        }

        // Population inversion = N2 - N1 = 2 × excited-state count.
        Self {
            mesh: excited.mapv(|v| 2.0 * v),
            mesh_extent: pump.mesh_extent,
            n_cells: pump.n_cells,
        }
    }

    /// Sample positions shared by both axes.
    pub fn coords(&self) -> Vec<f64> {
        Self::grid_coords(self.mesh_extent, self.n_cells)
    }

    fn grid_coords(mesh_extent: f64, n_cells: usize) -> Vec<f64> {
        let half = MESH_EXTENT_FACTOR * mesh_extent;
        linspace(-half, half, n_cells)
    }

    /// Cell width of the inversion mesh.
    pub fn cell_size(&self) -> f64 {
        2.0 * MESH_EXTENT_FACTOR * self.mesh_extent / self.n_cells as f64
    }

    /// Total inversion integrated over the mesh volume
    /// (cell area × slice length supplied by the caller).
    pub fn total(&self, slice_length: f64) -> f64 {
        let cell_volume = self.cell_size() * self.cell_size() * slice_length;
        self.mesh.iter().sum::<f64>() * cell_volume
    }
}

/// Longitudinal pump windows contributing to one slice.
fn pump_windows(
    pump_type: PumpType,
    slice_length: f64,
    slice_index: usize,
    nslice: usize,
) -> Vec<PumpWindow> {
    let window = |z: f64| PumpWindow {
        z_front: z - slice_length / 2.0,
        z_back: z + slice_length / 2.0,
    };
    let left = window(slice_length * (slice_index as f64 + 0.5));
    let right = window(slice_length * ((nslice - slice_index - 1) as f64 + 0.5));
    match pump_type {
        PumpType::Left => vec![left],
        PumpType::Right => vec![right],
        PumpType::Dual => vec![left, right],
    }
}

/// Gamma function via the Lanczos approximation (g = 7, n = 9).
///
/// Only evaluated at small positive arguments (the super-Gaussian
/// normalization uses `Γ(2/order)`).
pub(crate) fn gamma(x: f64) -> f64 {
    const COEFFS: [f64; 9] = [
        0.99999999999980993,
        676.5203681218851,
        -1259.1392167224028,
        771.32342877765313,
        -176.61502916214059,
        12.507343278686905,
        -0.13857109526572012,
        9.9843695780195716e-6,
        1.5056327351493116e-7,
    ];
    if x < 0.5 {
        // Reflection formula.
        std::f64::consts::PI / ((std::f64::consts::PI * x).sin() * gamma(1.0 - x))
    } else {
        let x = x - 1.0;
        let mut acc = COEFFS[0];
        for (i, &c) in COEFFS.iter().enumerate().skip(1) {
            acc += c / (x + i as f64);
        }
        let t = x + 7.5;
        (2.0 * std::f64::consts::PI).sqrt() * t.powf(x + 0.5) * (-t).exp() * acc
    }
}
