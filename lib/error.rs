//! Collection of all error types.
//!
//! All errors derive [`thiserror::Error`], making them composable when allowed
//! and compatible with application code using [`anyhow`][anyhow].
//!
//! [anyhow]: https://crates.io/crates/anyhow

use ndarray_linalg::error::LinalgError;
use thiserror::Error;

/// Returned from [`Trajectory`][crate::trajectory::Trajectory] construction.
#[derive(Debug, Error)]
pub enum TrajectoryError {
    /// Returned when the longitudinal velocity is zero.
    #[error("longitudinal velocity must be nonzero")]
    ZeroVelocity,

    /// Returned when the molecule moves away from the termination plane.
    #[error(
        "termination plane z = {z_final} m is unreachable \
        from z = {z0} m with vz = {vz} m/s"
    )]
    Unreachable { z0: f64, vz: f64, z_final: f64 },
}

/// Returned from field, intensity-profile, and polarization constructors.
#[derive(Debug, Error)]
pub enum FieldError {
    /// Returned when a propagation vector is not unit-normalized.
    #[error("propagation vector must be unit-normalized; got |k| = {0}")]
    BadKVector(f64),

    /// Returned when the main polarization component is not normalizable.
    #[error("main polarization vector must have nonzero norm")]
    NullPolarization,

    /// Returned when the main polarization component is not transverse.
    #[error(
        "main polarization must be orthogonal to the propagation vector; \
        got p . k = {0}"
    )]
    NonTransverse(f64),

    /// Returned when a longitudinal fraction lies outside `0 ..= 1`.
    #[error("longitudinal fraction must be within [0, 1]; got {0}")]
    BadLongFraction(f64),

    /// Returned when a beam power is negative.
    #[error("beam power must be non-negative; got {0}")]
    BadPower(f64),

    /// Returned when a beam width is non-positive.
    #[error("beam width must be positive; got {0}")]
    BadWidth(f64),

    /// Returned when an intensity is negative.
    #[error("intensity must be non-negative; got {0}")]
    BadIntensity(f64),

    /// Returned when a tabulated axial profile is unusable.
    #[error("axial profile needs equal-length tables of at least 2 points")]
    BadProfile,

    /// Returned when a microwave transition couples a manifold to itself.
    #[error("microwave transition must couple J = {0} to J = {0} ± 1")]
    BadTransition(u32),
}

impl FieldError {
    pub(crate) fn check_power(power: f64) -> Result<(), Self> {
        (power >= 0.0).then_some(()).ok_or(Self::BadPower(power))
    }

    pub(crate) fn check_width(sigma: f64) -> Result<(), Self> {
        (sigma > 0.0).then_some(()).ok_or(Self::BadWidth(sigma))
    }

    pub(crate) fn check_intensity(intensity: f64) -> Result<(), Self> {
        (intensity >= 0.0).then_some(())
            .ok_or(Self::BadIntensity(intensity))
    }
}

/// Returned from [`Simulator`][crate::sim::Simulator] construction and runs.
#[derive(Debug, Error)]
pub enum SimError {
    /// Returned when a nominal state lies outside the simulation basis.
    #[error("state {0} is not contained in the basis")]
    MissingState(String),

    /// Returned when no initial state is configured.
    #[error("at least one initial state is required")]
    NoInitialStates,

    /// Returned when a nominal state vector does not match the basis size.
    #[error("initial-state vector has length {0}; the basis has {1} states")]
    BadStateVector(usize, usize),

    /// Returned when a step count is too small to propagate.
    #[error("step counts must be at least 2; got {0}")]
    BadStepCount(usize),

    /// Returned when two microwave fields at distinct frequencies shift the
    /// same rotational manifold, so no common rotating frame exists.
    #[error(
        "rotating-frame transform failed: J = {0} is shifted by more than \
        one microwave frequency"
    )]
    RotatingFrame(u32),

    /// [`FieldError`]
    #[error("field error: {0}")]
    Field(#[from] FieldError),

    /// [`TrajectoryError`]
    #[error("trajectory error: {0}")]
    Trajectory(#[from] TrajectoryError),

    /// [`LinalgError`]
    #[error("linalg error: {0}")]
    Linalg(#[from] LinalgError),
}

/// Returned from result persistence.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Returned on filesystem failures.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when an archive cannot be written.
    #[error("npz write error: {0}")]
    Write(#[from] ndarray_npy::WriteNpzError),

    /// Returned when an archive cannot be read.
    #[error("npz read error: {0}")]
    Read(#[from] ndarray_npy::ReadNpzError),

    /// Returned when a loaded archive has inconsistent array shapes.
    #[error("archive arrays have inconsistent shapes")]
    Shape,
}

/// Returned from scan-configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Returned when the configuration file cannot be read.
    #[error("couldn't read config file {path}: {err}")]
    Read { path: String, err: std::io::Error },

    /// Returned when the configuration file cannot be parsed.
    #[error("couldn't parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Returned when a quantum-state string is malformed.
    #[error(
        "malformed state string {0:?}; expected \
        \"J=<int>, mJ=<int>, m1=<±1/2>, m2=<±1/2>\""
    )]
    BadState(String),

    /// Returned when a parameter grid is empty.
    #[error("scan grid axis {0:?} must be non-empty")]
    EmptyAxis(&'static str),

    /// Returned when a configured state lies outside the configured basis.
    #[error("state {0} is not contained in the configured basis")]
    StateOutsideBasis(String),

    /// Returned when the worker pool cannot be built.
    #[error("couldn't build worker pool: {0}")]
    Pool(String),

    /// [`SimError`]
    #[error("simulation error: {0}")]
    Sim(#[from] crate::error::SimError),

    /// [`FieldError`]
    #[error("field error: {0}")]
    Field(#[from] FieldError),

    /// [`TrajectoryError`]
    #[error("trajectory error: {0}")]
    Trajectory(#[from] TrajectoryError),
}
