//! Parameter-scan harness: expand a (power, detuning, position) grid, run
//! each point on a worker pool, and collect one tabular row per point.
//!
//! Every grid point owns an immutable [`ScanPoint`] and derives its field and
//! simulator objects fresh inside the worker; no mutable state is shared
//! across points, so parallel execution is safe by construction. A failing
//! point is surfaced as a row carrying the error message without aborting its
//! siblings.

use std::f64::consts::TAU;
use std::path::{ Path, PathBuf };
use itertools::Itertools;
use ndarray as nd;
use num_complex::Complex64 as C64;
use rayon::iter::{ IntoParallelIterator, ParallelIterator };
use crate::{
    config::ScanConfig,
    error::{ ArchiveError, ConfigError, SimError },
    fields::VectorField,
    hamiltonian::{ HBuilderBeamline, HyperfineParams },
    hilbert::{ Basis, XState, uncoupled_basis },
    microwave::{
        IntensityProfile,
        MicrowaveField,
        Polarization,
        transition_frequency,
    },
    sim::Simulator,
    trajectory::Trajectory,
};

/// One fully specified grid point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScanPoint {
    /// Beam power (W).
    pub power: f64,
    /// Detuning from the reference transition frequency (Hz).
    pub detuning: f64,
    /// Beam-center z-position (m).
    pub position: f64,
}

/// Outcome of one grid point.
#[derive(Clone, Debug)]
pub struct ScanRow {
    pub power: f64,
    pub detuning: f64,
    pub position: f64,
    /// Final population remaining in the intermediate state.
    pub prob_intermediate: f64,
    /// Final population reaching the target state.
    pub prob_final: f64,
    /// Path of the persisted trajectory archive, if any.
    pub archive: Option<PathBuf>,
    /// Error detail if the point failed.
    pub error: Option<String>,
}

impl ScanRow {
    fn failed(point: ScanPoint, error: String) -> Self {
        Self {
            power: point.power,
            detuning: point.detuning,
            position: point.position,
            prob_intermediate: f64::NAN,
            prob_final: f64::NAN,
            archive: None,
            error: Some(error),
        }
    }
}

/// All rows of one scan, in grid order.
#[derive(Clone, Debug)]
pub struct ScanTable {
    pub rows: Vec<ScanRow>,
}

impl ScanTable {
    /// Return the rows that failed.
    pub fn failures(&self) -> impl Iterator<Item = &ScanRow> {
        self.rows.iter().filter(|row| row.error.is_some())
    }

    /// Write the table to a `.npz` archive with one flat column per input
    /// parameter and outcome; failed rows carry NaN outcomes and `ok = false`.
    pub fn save_npz<P: AsRef<Path>>(&self, path: P)
        -> Result<(), ArchiveError>
    {
        let power: nd::Array1<f64>
            = self.rows.iter().map(|row| row.power).collect();
        let detuning: nd::Array1<f64>
            = self.rows.iter().map(|row| row.detuning).collect();
        let position: nd::Array1<f64>
            = self.rows.iter().map(|row| row.position).collect();
        let prob_intermediate: nd::Array1<f64>
            = self.rows.iter().map(|row| row.prob_intermediate).collect();
        let prob_final: nd::Array1<f64>
            = self.rows.iter().map(|row| row.prob_final).collect();
        let ok: nd::Array1<bool>
            = self.rows.iter().map(|row| row.error.is_none()).collect();
        let mut npz
            = ndarray_npy::NpzWriter::new(std::fs::File::create(path)?);
        npz.add_array("power", &power)?;
        npz.add_array("detuning", &detuning)?;
        npz.add_array("position", &position)?;
        npz.add_array("prob_intermediate", &prob_intermediate)?;
        npz.add_array("prob_final", &prob_final)?;
        npz.add_array("ok", &ok)?;
        npz.finish()?;
        Ok(())
    }
}

// everything shared (read-only) between workers
struct ScanContext<'a> {
    config: &'a ScanConfig,
    builder: HBuilderBeamline<'a>,
    v_initial: nd::Array1<C64>,
    v_intermediate: nd::Array1<C64>,
    v_target: nd::Array1<C64>,
    freq_ref: f64,
}

/// Run a full scan from a configuration.
///
/// The reference transition frequency is computed once from the Hamiltonian
/// at the trajectory start; grid detunings are relative to it.
pub fn run_scan(config: &ScanConfig) -> Result<ScanTable, ConfigError> {
    if config.grid.powers.is_empty() {
        return Err(ConfigError::EmptyAxis("powers"));
    }
    if config.grid.detunings.is_empty() {
        return Err(ConfigError::EmptyAxis("detunings"));
    }
    if config.grid.positions.is_empty() {
        return Err(ConfigError::EmptyAxis("positions"));
    }

    let basis: Basis<XState>
        = uncoupled_basis(config.basis.manifolds.iter().copied());
    let trajectory = Trajectory::new(
        config.trajectory.rini,
        config.trajectory.vini,
        config.trajectory.z_final,
    )?;
    let hyperfine = config.hyperfine
        .map(|hf| HyperfineParams { c1: hf.c1, c2: hf.c2, c4: hf.c4 })
        .unwrap_or_default();
    let builder = HBuilderBeamline::with_hyperfine(
        &basis,
        trajectory,
        VectorField::Uniform(config.fields.electric),
        VectorField::Uniform(config.fields.magnetic),
        hyperfine,
    );

    let state_vector = |state: &XState| {
        basis.get_vector(state)
            .ok_or_else(|| ConfigError::StateOutsideBasis(state.to_string()))
    };
    let v_initial = state_vector(&config.states.initial.0)?;
    let v_intermediate = state_vector(&config.states.intermediate.0)?;
    let v_target = state_vector(&config.states.target.0)?;

    let h_ref = builder.gen_at(0.0);
    let freq_ref = transition_frequency(&h_ref, &v_initial, &v_target)
        .map_err(ConfigError::Sim)?;

    let points: Vec<ScanPoint>
        = config.grid.powers.iter()
        .cartesian_product(config.grid.detunings.iter())
        .cartesian_product(config.grid.positions.iter())
        .map(|((&power, &detuning), &position)| {
            ScanPoint { power, detuning, position }
        })
        .collect();

    let context = ScanContext {
        config,
        builder,
        v_initial,
        v_intermediate,
        v_target,
        freq_ref,
    };
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .build()
        .map_err(|err| ConfigError::Pool(err.to_string()))?;
    let rows: Vec<ScanRow>
        = pool.install(|| {
            points.into_par_iter()
                .map(|point| run_point(&context, point))
                .collect()
        });
    Ok(ScanTable { rows })
}

// one grid point: fresh microwave objects, one simulation, two scalar
// outcomes
fn run_point(context: &ScanContext<'_>, point: ScanPoint) -> ScanRow {
    match try_run_point(context, point) {
        Ok(row) => row,
        Err(err) => ScanRow::failed(point, err.to_string()),
    }
}

fn try_run_point(context: &ScanContext<'_>, point: ScanPoint)
    -> Result<ScanRow, SimError>
{
    let mw_config = &context.config.microwave;
    let freq = context.freq_ref + TAU * point.detuning;

    let intensity = IntensityProfile::gaussian_beam(
        point.power,
        mw_config.sigma,
        mw_config.k,
        [0.0, 0.0, point.position],
    )?;
    let polarization = Polarization::new(
        mw_config.polarization.map(C64::from),
        mw_config.k,
        mw_config.f_long,
    )?;
    let mut fields: Vec<MicrowaveField> = vec![
        MicrowaveField::new(
            context.config.transition.j_g,
            context.config.transition.j_e,
            intensity,
            polarization,
            freq,
        )?,
    ];
    if mw_config.background_intensity > 0.0 {
        let background = IntensityProfile::uniform(
            mw_config.background_intensity,
            mw_config.background_range,
        )?;
        fields.push(
            MicrowaveField::new(
                context.config.transition.j_g,
                context.config.transition.j_e,
                background,
                polarization,
                freq,
            )?
        );
    }

    let simulator = Simulator::new(
        &context.builder,
        fields,
        vec![context.v_initial.clone()],
    )?;
    let result = simulator.run(context.config.n_steps)?;

    let p_int
        = result.get_state_probability(
            &context.v_intermediate, &context.v_initial);
    let p_fin
        = result.get_state_probability(
            &context.v_target, &context.v_initial);
    let nt = result.t.len();

    let mut row = ScanRow {
        power: point.power,
        detuning: point.detuning,
        position: point.position,
        prob_intermediate: p_int[nt - 1],
        prob_final: p_fin[nt - 1],
        archive: None,
        error: None,
    };
    if context.config.save_archives {
        let name = format!("run-{:08x}.npz", rand::random::<u32>());
        let path = context.config.outdir.join(name);
        match result.save_npz(&path) {
            Ok(()) => { row.archive = Some(path); },
            Err(err) => {
                row.error = Some(format!("archive write failed: {}", err));
            },
        }
    }
    Ok(row)
}
