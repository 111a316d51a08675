//! End-to-end transfer scenarios on an analytically solvable two-level
//! configuration: a uniform microwave region driving J = 0 -> J = 1 with the
//! hyperfine couplings switched off, where the pulse area is exact.

use std::f64::consts::{ PI, TAU };
use ndarray as nd;
use num_complex::Complex64 as C64;
use state_prep::{
    fields::VectorField,
    hamiltonian::{ HBuilderBeamline, HyperfineParams },
    hilbert::{ Basis, XState, uncoupled_basis },
    microwave::{
        IntensityProfile,
        MicrowaveField,
        Polarization,
        transition_frequency,
    },
    sim::{ Propagation, SimulationResult, Simulator },
    trajectory::Trajectory,
    units,
};

const VELOCITY: f64 = 200.0; // m/s
const Z_START: f64 = -0.02; // m
const Z_FINAL: f64 = 0.02; // m
const REGION: (f64, f64) = (-0.005, 0.005); // m
const N_STEPS: usize = 4001;

// pulse duration inside the uniform region
fn pulse_time() -> f64 { (REGION.1 - REGION.0) / VELOCITY }

// intensity giving a pi pulse on the |0,0> -> |1,0> z-polarized transition,
// whose dipole matrix element is 1/sqrt(3)
fn pi_pulse_intensity() -> f64 {
    let omega = PI * 3.0_f64.sqrt() / pulse_time();
    let e_amp = units::hbar * omega / units::D_TLF;
    units::c * units::e0 * e_amp.powi(2) / 2.0
}

fn bare_builder(basis: &Basis<XState>) -> HBuilderBeamline<'_> {
    let trajectory = Trajectory::new(
        [0.0, 0.0, Z_START], [0.0, 0.0, VELOCITY], Z_FINAL).unwrap();
    HBuilderBeamline::with_hyperfine(
        basis,
        trajectory,
        VectorField::Uniform([0.0; 3]),
        VectorField::Uniform([0.0; 3]),
        HyperfineParams::none(),
    )
}

fn run_two_level(
    basis: &Basis<XState>,
    intensity: f64,
    detuning_hz: f64,
    propagation: Propagation,
) -> SimulationResult
{
    let builder = bare_builder(basis);
    let g = basis.get_vector(&XState::new(0, 0, 1, 1).unwrap()).unwrap();
    let e = basis.get_vector(&XState::new(1, 0, 1, 1).unwrap()).unwrap();
    let freq0
        = transition_frequency(&builder.gen_at(0.0), &g, &e).unwrap();
    let profile = IntensityProfile::uniform(intensity, REGION).unwrap();
    let polarization
        = Polarization::linear([0.0, 0.0, 1.0], [1.0, 0.0, 0.0]).unwrap();
    let mw = MicrowaveField::new(
        0, 1, profile, polarization, freq0 + TAU * detuning_hz).unwrap();
    let simulator
        = Simulator::new(&builder, vec![mw], vec![g])
        .unwrap()
        .with_propagation(propagation);
    simulator.run(N_STEPS).unwrap()
}

fn final_probs(basis: &Basis<XState>, result: &SimulationResult)
    -> (f64, f64)
{
    let g = basis.get_vector(&XState::new(0, 0, 1, 1).unwrap()).unwrap();
    let e = basis.get_vector(&XState::new(1, 0, 1, 1).unwrap()).unwrap();
    let p_g = result.get_state_probability(&g, &g);
    let p_e = result.get_state_probability(&e, &g);
    (p_g[p_g.len() - 1], p_e[p_e.len() - 1])
}

#[test]
fn transition_frequency_matches_rotor_gap() {
    let basis = uncoupled_basis([0, 1]);
    let builder = bare_builder(&basis);
    let g = basis.get_vector(&XState::new(0, 0, 1, 1).unwrap()).unwrap();
    let e = basis.get_vector(&XState::new(1, 0, 1, 1).unwrap()).unwrap();
    let freq
        = transition_frequency(&builder.gen_at(0.0), &g, &e).unwrap();
    let expected = TAU * 2.0 * units::B_ROT;
    assert!((freq - expected).abs() < 1e-9 * expected);
}

#[test]
fn transition_frequency_matches_diagonalization() {
    use ndarray_linalg::{ Eigh, UPLO };
    // full hyperfine structure and a bias field; compare against a direct
    // diagonalization with hand-rolled overlap bookkeeping
    let basis = uncoupled_basis([0, 1]);
    let trajectory = Trajectory::new(
        [0.0, 0.0, Z_START], [0.0, 0.0, VELOCITY], Z_FINAL).unwrap();
    let builder = HBuilderBeamline::new(
        &basis,
        trajectory,
        VectorField::Uniform([0.0; 3]),
        VectorField::Uniform([0.0, 0.0, 1e-4]),
    );
    let g = basis.get_vector(&XState::new(0, 0, 1, 1).unwrap()).unwrap();
    let e = basis.get_vector(&XState::new(1, 0, 1, 1).unwrap()).unwrap();
    let h = builder.gen_at(0.0);
    let freq = transition_frequency(&h, &g, &e).unwrap();

    let (energies, v) = h.eigh(UPLO::Lower).unwrap();
    let overlap_idx = |vec: &nd::Array1<C64>| {
        v.columns().into_iter()
            .map(|col| {
                col.iter().zip(vec)
                    .map(|(a, b)| a.conj() * *b)
                    .sum::<C64>()
                    .norm_sqr()
            })
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .unwrap()
            .0
    };
    let expected = energies[overlap_idx(&e)] - energies[overlap_idx(&g)];
    assert!((freq - expected).abs() < 1e-9 * expected.abs());
    // stays within the hyperfine spread of the rotor gap
    assert!((freq - TAU * 2.0 * units::B_ROT).abs() < TAU * 1e6);
}

#[test]
fn zero_power_no_transfer() {
    let basis = uncoupled_basis([0, 1]);
    let result
        = run_two_level(&basis, 0.0, 0.0, Propagation::EigenStep);
    let (p_g, p_e) = final_probs(&basis, &result);
    assert!(p_e < 1e-9);
    assert!((p_g - 1.0).abs() < 1e-9);
}

#[test]
fn resonant_pi_pulse_transfers() {
    let basis = uncoupled_basis([0, 1]);
    let result = run_two_level(
        &basis, pi_pulse_intensity(), 0.0, Propagation::EigenStep);
    let (p_g, p_e) = final_probs(&basis, &result);
    assert!(p_e > 0.95, "final target population {p_e}");
    assert!(p_g < 0.05, "final initial population {p_g}");
}

#[test]
fn detuned_pulse_does_not_transfer() {
    let basis = uncoupled_basis([0, 1]);
    for detuning in [-2e6, 2e6] {
        let result = run_two_level(
            &basis, pi_pulse_intensity(), detuning, Propagation::EigenStep);
        let (_, p_e) = final_probs(&basis, &result);
        assert!(p_e < 0.1, "detuning {detuning}: target population {p_e}");
    }
}

#[test]
fn rk4_agrees_on_resonance() {
    let basis = uncoupled_basis([0, 1]);
    let result = run_two_level(
        &basis, pi_pulse_intensity(), 0.0, Propagation::RungeKutta);
    let (_, p_e) = final_probs(&basis, &result);
    assert!(p_e > 0.95, "final target population {p_e}");
}

#[test]
fn archive_round_trip() {
    let basis = uncoupled_basis([0, 1]);
    let result = run_two_level(
        &basis, pi_pulse_intensity(), 0.0, Propagation::EigenStep);
    let path
        = std::env::temp_dir()
        .join(format!("transfer-roundtrip-{}.npz", std::process::id()));
    result.save_npz(&path).unwrap();
    let loaded = state_prep::sim::SimulationResult::load_npz(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let g = basis.get_vector(&XState::new(0, 0, 1, 1).unwrap()).unwrap();
    let e = basis.get_vector(&XState::new(1, 0, 1, 1).unwrap()).unwrap();
    let before = result.get_state_probability(&e, &g);
    let after = loaded.get_state_probability(&e, &g);
    assert_eq!(before.len(), after.len());
    let max_diff
        = before.iter().zip(&after)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0_f64, f64::max);
    assert_eq!(max_diff, 0.0);
}
