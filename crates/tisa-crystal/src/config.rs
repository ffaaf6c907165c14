//! TOML configuration for a crystal and its pump.
//!
//! Every field carries a default for a typical Ti:sapphire amplifier setup,
//! so a minimal job file only overrides what it cares about. The per-slice
//! `n0`/`n2` arrays and `nslice` interact: see [`CrystalConfig::resolve_slicing`]
//! for the documented reconciliation policy.

use ndarray::Array2;
use serde::Deserialize;

use crate::error::CrystalError;

/// Which crystal face(s) the pump enters through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PumpType {
    Left,
    Right,
    Dual,
}

/// Pump-deposition parameters seeding the population-inversion meshes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PumpConfig {
    /// Samples per axis of the inversion mesh.
    pub n_cells: usize,
    /// Physical half-extent of the inversion mesh [m]; the mesh spans
    /// ±1.15 × this value.
    pub mesh_extent: f64,
    /// Pump absorption coefficient [1/m].
    pub crystal_alpha: f64,
    /// Pump waist [m].
    pub pump_waist: f64,
    /// Pump wavelength [m].
    pub pump_wavelength: f64,
    /// Pump energy onto the crystal [J].
    pub pump_energy: f64,
    pub pump_type: PumpType,
    /// Super-Gaussian order of the radial deposition profile.
    pub pump_gaussian_order: f64,
    /// Transverse pump offset [m].
    pub pump_offset_x: f64,
    pub pump_offset_y: f64,
    /// Pump repetition rate [Hz]; consumed by thermo-optic solvers.
    pub pump_rep_rate: f64,
    /// Seed wavelength [nm] for the fractional-heating ratio.
    pub lambda_seed: f64,
    /// Pump wavelength [nm] for the fractional-heating ratio.
    pub lambda_pump: f64,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            n_cells: 64,
            mesh_extent: 0.01,
            crystal_alpha: 120.0,
            pump_waist: 0.00164,
            pump_wavelength: 532.0e-9,
            pump_energy: 0.0211,
            pump_type: PumpType::Dual,
            pump_gaussian_order: 2.0,
            pump_offset_x: 0.0,
            pump_offset_y: 0.0,
            pump_rep_rate: 1.0e3,
            lambda_seed: 800.0,
            lambda_pump: 532.0,
        }
    }
}

fn default_n0() -> f64 {
    1.75
}
fn default_n2() -> f64 {
    0.001
}
fn default_nslice() -> usize {
    50
}

/// Crystal configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CrystalConfig {
    /// Per-slice on-axis refractive index. A missing array replicates the
    /// default across all slices.
    pub n0: Option<Vec<f64>>,
    /// Per-slice quadratic index variation [1/m²], `n(r) = n0 - ½ n2 r²`.
    pub n2: Option<Vec<f64>>,
    /// Number of longitudinal slices.
    pub nslice: Option<usize>,
    /// Total crystal length [m].
    #[serde(default = "default_length")]
    pub length: f64,
    /// Length-scale factor for LCT propagation.
    #[serde(default = "default_l_scale")]
    pub l_scale: f64,
    /// Fixed ABCD coefficients for the precomputed propagation mode.
    #[serde(default = "default_abcd_a")]
    pub a: f64,
    #[serde(default = "default_abcd_b")]
    pub b: f64,
    #[serde(default = "default_abcd_c")]
    pub c: f64,
    #[serde(default = "default_abcd_d")]
    pub d: f64,
    /// Width factor of the radial gain-averaging blend.
    #[serde(default = "default_radial_n2_factor")]
    pub radial_n2_factor: f64,
    /// Half-extent [m] of the measured delta_n maps (azimuthal symmetry).
    #[serde(default = "default_delta_n_mesh_extent")]
    pub delta_n_mesh_extent: f64,
    /// Measured per-slice index-perturbation maps; set programmatically.
    #[serde(skip)]
    pub delta_n_array: Option<Vec<Array2<f64>>>,
    /// Density [kg/m³] (Al2O3 default).
    #[serde(default = "default_rho")]
    pub rho: f64,
    /// Thermal conductivity [W/(m·K)].
    #[serde(default = "default_kc")]
    pub kc: f64,
    /// Specific heat capacity [J/(kg·K)].
    #[serde(default = "default_cp")]
    pub cp: f64,
    /// Coolant/ambient temperature outside the crystal [C].
    #[serde(default)]
    pub tc: f64,
    #[serde(default)]
    pub pump: PumpConfig,
}

fn default_length() -> f64 {
    0.2
}
fn default_l_scale() -> f64 {
    0.1
}
fn default_abcd_a() -> f64 {
    0.99765495
}
fn default_abcd_b() -> f64 {
    1.41975385
}
fn default_abcd_c() -> f64 {
    -0.0023775
}
fn default_abcd_d() -> f64 {
    0.99896716
}
fn default_radial_n2_factor() -> f64 {
    1.3
}
fn default_delta_n_mesh_extent() -> f64 {
    0.01
}
fn default_rho() -> f64 {
    3980.0
}
fn default_kc() -> f64 {
    33.0
}
fn default_cp() -> f64 {
    756.0
}

impl Default for CrystalConfig {
    fn default() -> Self {
        toml::from_str("").expect("empty config deserializes from defaults")
    }
}

impl CrystalConfig {
    /// Reconcile `nslice` with the `n0`/`n2` arrays.
    ///
    /// Policy:
    /// - nothing specified: default index values replicated over the
    ///   default slice count;
    /// - `nslice` specified: a missing array replicates the default; a
    ///   present array must match `nslice` exactly, otherwise the mismatch
    ///   is a fatal configuration error;
    /// - arrays specified without `nslice`: the slice count truncates to
    ///   the shorter array.
    ///
    /// Returns `(nslice, n0, n2)` with both arrays of length `nslice`.
    pub fn resolve_slicing(&self) -> Result<(usize, Vec<f64>, Vec<f64>), CrystalError> {
        let fill = |template: f64, n: usize| vec![template; n];

        let (nslice, n0, n2) = match (self.nslice, &self.n0, &self.n2) {
            (None, None, None) => {
                let n = default_nslice();
                (n, fill(default_n0(), n), fill(default_n2(), n))
            }
            (Some(n), maybe_n0, maybe_n2) => {
                let check = |arr: &Option<Vec<f64>>, template: f64| match arr {
                    None => Ok(fill(template, n)),
                    Some(v) if v.len() == n => Ok(v.clone()),
                    Some(v) => Err(CrystalError::SliceCountMismatch {
                        expected: n,
                        got: v.len(),
                    }),
                };
                (n, check(maybe_n0, default_n0())?, check(maybe_n2, default_n2())?)
            }
            (None, maybe_n0, maybe_n2) => {
                let n0 = maybe_n0.clone().unwrap_or_else(|| {
                    fill(default_n0(), maybe_n2.as_ref().map(|v| v.len()).unwrap_or(1))
                });
                let n2 = maybe_n2
                    .clone()
                    .unwrap_or_else(|| fill(default_n2(), n0.len()));
                let n = n0.len().min(n2.len());
                (n, n0[..n].to_vec(), n2[..n].to_vec())
            }
        };

        if n2.iter().any(|&v| v < 0.0) {
            return Err(CrystalError::NegativeIndexGradient);
        }
        Ok((nslice, n0, n2))
    }
}

/// Load and parse a TOML crystal configuration file.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<CrystalConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: CrystalConfig = toml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_replicate_index_values() {
        let config = CrystalConfig::default();
        let (n, n0, n2) = config.resolve_slicing().unwrap();
        assert_eq!(n, 50);
        assert_eq!(n0.len(), 50);
        assert!(n2.iter().all(|&v| (v - 0.001).abs() < 1e-15));
    }

    #[test]
    fn arrays_without_nslice_truncate_to_shorter() {
        let config = CrystalConfig {
            n0: Some(vec![1.75; 5]),
            n2: Some(vec![0.001; 3]),
            nslice: None,
            ..Default::default()
        };
        let (n, n0, n2) = config.resolve_slicing().unwrap();
        assert_eq!(n, 3);
        assert_eq!(n0.len(), 3);
        assert_eq!(n2.len(), 3);
    }

    #[test]
    fn mismatched_array_with_nslice_is_fatal() {
        let config = CrystalConfig {
            n0: Some(vec![1.75; 4]),
            n2: None,
            nslice: Some(6),
            ..Default::default()
        };
        assert!(matches!(
            config.resolve_slicing(),
            Err(CrystalError::SliceCountMismatch { expected: 6, got: 4 })
        ));
    }

    #[test]
    fn negative_n2_is_fatal() {
        let config = CrystalConfig {
            n0: None,
            n2: Some(vec![0.001, -0.002]),
            nslice: Some(2),
            ..Default::default()
        };
        assert!(matches!(
            config.resolve_slicing(),
            Err(CrystalError::NegativeIndexGradient)
        ));
    }

    #[test]
    fn toml_round_trip_with_pump_block() {
        let text = r#"
            nslice = 4
            length = 0.02

            [pump]
            pump_type = "left"
            n_cells = 33
        "#;
        let config: CrystalConfig = toml::from_str(text).unwrap();
        assert_eq!(config.pump.pump_type, PumpType::Left);
        assert_eq!(config.pump.n_cells, 33);
        let (n, _, _) = config.resolve_slicing().unwrap();
        assert_eq!(n, 4);
    }
}
