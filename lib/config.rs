//! Scan configuration, deserialized from a TOML file.
//!
//! Quantum states are written as strings of the form
//! `"J=1, mJ=0, m1=1/2, m2=-1/2"`.

use std::path::PathBuf;
use regex::Regex;
use serde::Deserialize;
use crate::{
    error::ConfigError,
    hilbert::XState,
};

/// Top-level scan configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct ScanConfig {
    /// Number of scan workers.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Number of propagation steps per run.
    #[serde(default = "default_n_steps")]
    pub n_steps: usize,
    /// Output directory for the scan table and archives.
    pub outdir: PathBuf,
    /// Persist a full trajectory archive per grid point.
    #[serde(default)]
    pub save_archives: bool,
    /// Molecule trajectory.
    pub trajectory: TrajectoryConfig,
    /// Rotational manifolds included in the basis.
    pub basis: BasisConfig,
    /// Driven transition.
    pub transition: TransitionConfig,
    /// Microwave beam geometry.
    pub microwave: MicrowaveConfig,
    /// Parameter grid.
    pub grid: GridConfig,
    /// Nominal states for outcome extraction.
    pub states: StatesConfig,
    /// Static fields (uniform).
    pub fields: FieldsConfig,
    /// Optional hyperfine-constant overrides (Hz).
    pub hyperfine: Option<HyperfineConfig>,
}

#[derive(Copy, Clone, Debug, Deserialize)]
pub struct TrajectoryConfig {
    /// Initial position (m).
    pub rini: [f64; 3],
    /// Velocity (m/s).
    pub vini: [f64; 3],
    /// Termination plane (m).
    pub z_final: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BasisConfig {
    /// Rotational quantum numbers J to include.
    pub manifolds: Vec<u32>,
}

#[derive(Copy, Clone, Debug, Deserialize)]
pub struct TransitionConfig {
    /// Lower-manifold J.
    pub j_g: u32,
    /// Upper-manifold J.
    pub j_e: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MicrowaveConfig {
    /// Gaussian beam width (m).
    pub sigma: f64,
    /// Unit propagation vector.
    pub k: [f64; 3],
    /// Main (transverse) polarization vector.
    pub polarization: [f64; 3],
    /// Longitudinal polarization fraction.
    #[serde(default)]
    pub f_long: f64,
    /// Uniform background intensity (W/m²); zero disables the background
    /// field.
    #[serde(default)]
    pub background_intensity: f64,
    /// z-interval (m) over which the background field extends.
    #[serde(default = "default_background_range")]
    pub background_range: (f64, f64),
}

#[derive(Clone, Debug, Deserialize)]
pub struct GridConfig {
    /// Beam powers (W).
    pub powers: Vec<f64>,
    /// Detunings from the reference transition frequency (Hz).
    pub detunings: Vec<f64>,
    /// Beam-center z-positions (m).
    pub positions: Vec<f64>,
}

#[derive(Copy, Clone, Debug, Deserialize)]
pub struct StatesConfig {
    /// State the molecules start in.
    pub initial: StateSpec,
    /// State whose remaining population is reported.
    pub intermediate: StateSpec,
    /// State whose final population is reported.
    pub target: StateSpec,
}

#[derive(Copy, Clone, Debug, Deserialize)]
pub struct FieldsConfig {
    /// Uniform electric field (V/m).
    pub electric: [f64; 3],
    /// Uniform magnetic field (T).
    pub magnetic: [f64; 3],
}

#[derive(Copy, Clone, Debug, Deserialize)]
pub struct HyperfineConfig {
    pub c1: f64,
    pub c2: f64,
    pub c4: f64,
}

fn default_workers() -> usize { 9 }

fn default_n_steps() -> usize { 10_000 }

fn default_background_range() -> (f64, f64) { (-0.05, 0.05) }

/// A nominal basis state parsed from its string form.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StateSpec(pub XState);

impl<'de> Deserialize<'de> for StateSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where D: serde::Deserializer<'de>
    {
        let raw = String::deserialize(deserializer)?;
        parse_state(&raw)
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}

/// Parse a state string `"J=<int>, mJ=<int>, m1=<±1/2>, m2=<±1/2>"`.
pub fn parse_state(raw: &str) -> Result<XState, ConfigError> {
    let re = Regex::new(
        r"^\s*J\s*=\s*(\d+)\s*,\s*mJ\s*=\s*(-?\d+)\s*,\s*m1\s*=\s*(-?)1/2\s*,\s*m2\s*=\s*(-?)1/2\s*$"
    ).expect("parse_state: invalid regex");
    let caps = re.captures(raw)
        .ok_or_else(|| ConfigError::BadState(raw.to_string()))?;
    let j: u32 = caps[1].parse()
        .map_err(|_| ConfigError::BadState(raw.to_string()))?;
    let mj: i32 = caps[2].parse()
        .map_err(|_| ConfigError::BadState(raw.to_string()))?;
    let m1: i32 = if &caps[3] == "-" { -1 } else { 1 };
    let m2: i32 = if &caps[4] == "-" { -1 } else { 1 };
    XState::new(j, mj, m1, m2)
        .ok_or_else(|| ConfigError::BadState(raw.to_string()))
}

/// Read a [`ScanConfig`] from a TOML file.
pub fn read_config<P: AsRef<std::path::Path>>(path: P)
    -> Result<ScanConfig, ConfigError>
{
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .map_err(|err| ConfigError::Read {
            path: path.display().to_string(),
            err,
        })?;
    Ok(toml::from_str(&contents)?)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn state_strings() {
        let state = parse_state("J=1, mJ=0, m1=1/2, m2=-1/2").unwrap();
        assert_eq!(state, XState::new(1, 0, 1, -1).unwrap());
        assert!(parse_state("J=1, mJ=2, m1=1/2, m2=1/2").is_err());
        assert!(parse_state("garbage").is_err());
    }

    #[test]
    fn full_config() {
        let raw = r#"
            outdir = "output"

            [trajectory]
            rini = [0.0, 0.0, -0.05]
            vini = [0.0, 0.0, 184.0]
            z_final = 0.05

            [basis]
            manifolds = [0, 1, 2, 3]

            [transition]
            j_g = 1
            j_e = 2

            [microwave]
            sigma = 0.01
            k = [1.0, 0.0, 0.0]
            polarization = [0.0, 0.0, 1.0]

            [grid]
            powers = [1e-4]
            detunings = [0.0, 1e6]
            positions = [0.0]

            [states]
            initial = "J=1, mJ=0, m1=1/2, m2=-1/2"
            intermediate = "J=1, mJ=0, m1=1/2, m2=-1/2"
            target = "J=2, mJ=0, m1=1/2, m2=-1/2"

            [fields]
            electric = [0.0, 0.0, 0.0]
            magnetic = [0.0, 0.0, 1e-6]
        "#;
        let config: ScanConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.workers, 9);
        assert_eq!(config.n_steps, 10_000);
        assert_eq!(config.grid.detunings.len(), 2);
        assert_eq!(
            config.states.target.0,
            XState::new(2, 0, 1, -1).unwrap(),
        );
        assert!(!config.save_archives);
    }
}
