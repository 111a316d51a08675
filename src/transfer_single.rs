#![allow(dead_code, non_snake_case, non_upper_case_globals)]

//! Single fully-configured run: J = 1 -> J = 2 transfer on the resonant
//! carrier, with the state trajectory written out for plotting.

use std::path::PathBuf;
use anyhow::{ Context, Result };
use ndarray as nd;
use num_complex::Complex64 as C64;
use state_prep::{
    mkdir,
    write_npz,
    println_flush,
    fields::VectorField,
    hamiltonian::HBuilderBeamline,
    hilbert::{ Basis, XState, dominant_components, uncoupled_basis },
    microwave::{
        IntensityProfile,
        MicrowaveField,
        Polarization,
        transition_frequency,
    },
    sim::{ SimulationResult, Simulator },
    trajectory::Trajectory,
    utils::FExtremum,
};

const VELOCITY: f64 = 184.0; // m/s
const SIGMA: f64 = 0.01; // m
const POWER: f64 = 9.3e-8; // W, near a pi-pulse for this sigma and velocity
const B_FIELD: f64 = 1e-6; // T, bias field along z
const N_STEPS: usize = 10_000;

fn doit(
    basis: &Basis<XState>,
    initial: &XState,
    target: &XState,
) -> Result<SimulationResult>
{
    let trajectory
        = Trajectory::new([0.0, 0.0, -0.05], [0.0, 0.0, VELOCITY], 0.05)?;
    let builder = HBuilderBeamline::new(
        basis,
        trajectory,
        VectorField::Uniform([0.0; 3]),
        VectorField::Uniform([0.0, 0.0, B_FIELD]),
    );

    let v_ini = basis.get_vector(initial)
        .context("initial state outside basis")?;
    let v_fin = basis.get_vector(target)
        .context("target state outside basis")?;
    let freq
        = transition_frequency(&builder.gen_at(0.0), &v_ini, &v_fin)?;
    println_flush!("carrier frequency: {:.6} GHz",
        freq / std::f64::consts::TAU / 1e9);

    let intensity = IntensityProfile::gaussian_beam(
        POWER, SIGMA, [1.0, 0.0, 0.0], [0.0; 3])?;
    let polarization
        = Polarization::linear([0.0, 0.0, 1.0], [1.0, 0.0, 0.0])?;
    let mw = MicrowaveField::new(1, 2, intensity, polarization, freq)?;

    let simulator = Simulator::new(&builder, vec![mw], vec![v_ini])?;
    Ok(simulator.run(N_STEPS)?)
}

fn main() -> Result<()> {
    let outdir = PathBuf::from("output");
    mkdir!(outdir);

    let basis = uncoupled_basis([0, 1, 2, 3]);
    let initial = XState::new(1, 0, 1, -1).context("bad initial state")?;
    let target = XState::new(2, 0, 1, -1).context("bad target state")?;

    let out = doit(&basis, &initial, &target)?;

    let v_ini = basis.get_vector(&initial).unwrap();
    let v_fin = basis.get_vector(&target).unwrap();
    let p_initial: nd::Array1<f64>
        = out.get_state_probability(&v_ini, &v_ini);
    let p_target: nd::Array1<f64>
        = out.get_state_probability(&v_fin, &v_ini);
    println_flush!("final population: initial {:.4}, target {:.4}",
        p_initial[p_initial.len() - 1],
        p_target[p_target.len() - 1],
    );
    println_flush!("peak target population: {:.4}",
        p_target.fmax().unwrap_or(f64::NAN));

    println_flush!("most-populated states:");
    for (mean, vec) in out.find_large_prob_states(&v_ini, 5) {
        let label: String
            = dominant_components(&vec, &basis, 0.1)
            .into_iter()
            .map(|(a, s): (C64, XState)| format!("{:+.2}{}", a.re, s))
            .collect::<Vec<String>>()
            .join(" ");
        println_flush!("  {:.4}  {}", mean, label);
    }

    write_npz!(
        outdir.join("transfer-single.npz"),
        arrays: {
            "t" => &out.t,
            "z" => &out.z,
            "p_initial" => &p_initial,
            "p_target" => &p_target,
        }
    );
    out.save_npz(outdir.join("transfer-single-full.npz"))?;

    println_flush!("done");
    Ok(())
}
