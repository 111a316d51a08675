//! Time evolution of the molecule through the beamline fields and the
//! post-processing of the resulting state trajectories.

use std::{ fs::File, path::Path };
use ndarray::{ self as nd, s };
use ndarray_linalg::{ Eigh, UPLO };
use ndarray_npy::{ NpzReader, NpzWriter };
use num_complex::Complex64 as C64;
use rustc_hash::FxHashSet as HashSet;
use crate::{
    error::{ ArchiveError, SimError },
    hamiltonian::HBuilderBeamline,
    hilbert::{ max_overlap_idx, reorder_evecs },
    microwave::MicrowaveField,
    propagate,
};

/// Propagation scheme used by [`Simulator::run`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Propagation {
    /// Per-step exact unitary from diagonalizing the instantaneous
    /// Hamiltonian in the rotating frame.
    #[default]
    EigenStep,
    /// Fourth-order Runge-Kutta over the rotating-frame Hamiltonian.
    RungeKutta,
}

/// Runs the time evolution of a set of initial states along the trajectory
/// configured in the Hamiltonian builder.
#[derive(Clone, Debug)]
pub struct Simulator<'a> {
    hamiltonian: &'a HBuilderBeamline<'a>,
    microwaves: Vec<MicrowaveField>,
    initial_states: Vec<nd::Array1<C64>>,
    propagation: Propagation,
}

impl<'a> Simulator<'a> {
    /// Create a new `Simulator`.
    ///
    /// `initial_states` are nominal state vectors over the builder's basis;
    /// each is resolved to the eigenstate of `H(0)` with maximal overlap at
    /// the start of a run. Coupling matrix elements for every microwave
    /// field are generated here.
    pub fn new(
        hamiltonian: &'a HBuilderBeamline<'a>,
        mut microwaves: Vec<MicrowaveField>,
        initial_states: Vec<nd::Array1<C64>>,
    ) -> Result<Self, SimError>
    {
        if initial_states.is_empty() {
            return Err(SimError::NoInitialStates);
        }
        let n = hamiltonian.basis().len();
        for state in initial_states.iter() {
            if state.len() != n {
                return Err(SimError::BadStateVector(state.len(), n));
            }
        }
        for mw in microwaves.iter_mut() {
            mw.generate_couplings(hamiltonian.basis());
        }
        Ok(Self {
            hamiltonian,
            microwaves,
            initial_states,
            propagation: Propagation::default(),
        })
    }

    /// Select the propagation scheme.
    pub fn with_propagation(mut self, propagation: Propagation) -> Self {
        self.propagation = propagation;
        self
    }

    // rotating-frame energy shifts accumulated over all configured carrier
    // frequencies; fields sharing a carrier are folded together, and chained
    // transitions pick up the running sum
    fn shift_diag(&self) -> Result<nd::Array1<f64>, SimError> {
        let basis = self.hamiltonian.basis();
        let mut d: nd::Array1<f64> = nd::Array1::zeros(basis.len());
        let mut omegas: Vec<f64> = Vec::new();
        let mut shifted: HashSet<u32> = HashSet::default();
        for mw in self.microwaves.iter() {
            let dup
                = omegas.iter()
                .any(|w| {
                    (w - mw.freq()).abs() <= 1e-6 * w.abs().max(1.0)
                });
            if dup { continue; }
            omegas.push(mw.freq());
            let omega_tot: f64 = omegas.iter().sum();
            if !shifted.insert(mw.j_e()) {
                return Err(SimError::RotatingFrame(mw.j_e()));
            }
            d += &mw.shift_diag(basis, omega_tot);
        }
        Ok(d)
    }

    fn h_mu_at(&self, r: [f64; 3]) -> Option<nd::Array2<C64>> {
        let mut fields = self.microwaves.iter();
        let first = fields.next()?;
        let mut h = first.gen_at(r);
        for mw in fields {
            h += &mw.gen_at(r);
        }
        Some(h)
    }

    /// Run the simulation, sampling the trajectory's transit interval with
    /// `n_steps` points.
    pub fn run(&self, n_steps: usize) -> Result<SimulationResult, SimError> {
        if n_steps < 2 {
            return Err(SimError::BadStepCount(n_steps));
        }
        let big_t = self.hamiltonian.trajectory.duration();
        let t: nd::Array1<f64> = nd::Array1::linspace(0.0, big_t, n_steps);
        let d_mu = self.shift_diag()?;

        let n = self.hamiltonian.basis().len();
        let n_ini = self.initial_states.len();
        let h_tini = self.hamiltonian.gen_at(t[0]);
        let (e_ini, v_ini) = h_tini.eigh(UPLO::Lower)?;

        // resolve nominal initial states against the eigenbasis at t = 0
        let mut psis: nd::Array2<C64> = nd::Array2::zeros((n_ini, n));
        for (nominal, mut row) in
            self.initial_states.iter().zip(psis.rows_mut())
        {
            let idx = max_overlap_idx(nominal, &v_ini);
            row.assign(&v_ini.slice(s![.., idx]));
        }
        let initial_states = psis.clone();

        let mut psis_t: nd::Array3<C64> = nd::Array3::zeros((n_steps, n_ini, n));
        let mut energies: nd::Array2<f64> = nd::Array2::zeros((n_steps, n));
        let mut probabilities: nd::Array3<f64>
            = nd::Array3::zeros((n_steps, n_ini, n));
        psis_t.slice_mut(s![0, .., ..]).assign(&psis);
        energies.slice_mut(s![0, ..]).assign(&e_ini);
        probabilities.slice_mut(s![0, .., ..])
            .assign(&calculate_probabilities(&psis, &v_ini));

        let v_fin = match self.propagation {
            Propagation::EigenStep => {
                self.evolve_eigenstep(
                    &t, &d_mu, &mut psis, &v_ini,
                    &mut psis_t, &mut energies, &mut probabilities,
                )?
            },
            Propagation::RungeKutta => {
                self.evolve_rk4(
                    &t, &d_mu, &psis, &v_ini,
                    &mut psis_t, &mut energies, &mut probabilities,
                )?
            },
        };

        let rini = self.hamiltonian.trajectory.rini();
        let vini = self.hamiltonian.trajectory.vini();
        let z: nd::Array1<f64> = t.mapv(|tk| rini[2] + vini[2] * tk);
        Ok(SimulationResult {
            t,
            z,
            psis: psis_t,
            energies,
            probabilities,
            v_ini,
            v_fin,
            initial_states,
        })
    }

    // original eigenstep scheme: diagonalize the slow Hamiltonian, transform
    // the total into its eigenbasis, apply the rotating-frame shifts there,
    // and exponentiate exactly over the step
    #[allow(clippy::too_many_arguments)]
    fn evolve_eigenstep(
        &self,
        t: &nd::Array1<f64>,
        d_mu: &nd::Array1<f64>,
        psis: &mut nd::Array2<C64>,
        v_ini: &nd::Array2<C64>,
        psis_t: &mut nd::Array3<C64>,
        energies: &mut nd::Array2<f64>,
        probabilities: &mut nd::Array3<f64>,
    ) -> Result<nd::Array2<C64>, SimError>
    {
        let n_steps = t.len();
        let mut v_ref: nd::Array2<C64> = v_ini.clone();
        for k in 0..n_steps - 1 {
            let dt = t[k + 1] - t[k];
            let r = self.hamiltonian.trajectory.position(t[k]);
            let h_slow = self.hamiltonian.gen_static_at(r);
            let (d, v) = h_slow.eigh(UPLO::Lower)?;

            let h_tot = match self.h_mu_at(r) {
                Some(h_mu) => &h_slow + &h_mu,
                None => h_slow,
            };
            let vd = dagger(&v);
            let mut h_rot = vd.dot(&h_tot).dot(&v);
            for (i, shift) in d_mu.iter().enumerate() {
                h_rot[[i, i]] += C64::from(*shift);
            }
            let (d_rot, v_rot) = h_rot.eigh(UPLO::Lower)?;

            let (es, evecs) = reorder_evecs(&v, &d, &v_ref);

            let a = v.dot(&v_rot);
            let phase: nd::Array1<C64>
                = d_rot.mapv(|e| (-C64::i() * e * dt).exp());
            let a_phase = &a * &phase;
            let u_dt = a_phase.dot(&dagger(&a));

            *psis = psis.dot(&u_dt.t());
            psis_t.slice_mut(s![k + 1, .., ..]).assign(psis);
            energies.slice_mut(s![k + 1, ..]).assign(&es);
            probabilities.slice_mut(s![k + 1, .., ..])
                .assign(&calculate_probabilities(psis, &evecs));
            v_ref = evecs;
        }
        Ok(v_ref)
    }

    // alternative integrator: RK4 over the full rotating-frame Hamiltonian,
    // then the same spectral bookkeeping pass
    #[allow(clippy::too_many_arguments)]
    fn evolve_rk4(
        &self,
        t: &nd::Array1<f64>,
        d_mu: &nd::Array1<f64>,
        psis: &nd::Array2<C64>,
        v_ini: &nd::Array2<C64>,
        psis_t: &mut nd::Array3<C64>,
        energies: &mut nd::Array2<f64>,
        probabilities: &mut nd::Array3<f64>,
    ) -> Result<nd::Array2<C64>, SimError>
    {
        let n_steps = t.len();
        let h_fn = |tk: f64| {
            let r = self.hamiltonian.trajectory.position(tk);
            let mut h = self.hamiltonian.gen_static_at(r);
            if let Some(h_mu) = self.h_mu_at(r) {
                h += &h_mu;
            }
            for (i, shift) in d_mu.iter().enumerate() {
                h[[i, i]] += C64::from(*shift);
            }
            h
        };
        for (i, psi0) in psis.rows().into_iter().enumerate() {
            let psi = propagate::evolve_fn(&psi0.to_owned(), h_fn, t);
            psis_t.slice_mut(s![.., i, ..]).assign(&psi.t());
        }
        let mut v_ref: nd::Array2<C64> = v_ini.clone();
        for k in 1..n_steps {
            let h_slow = self.hamiltonian.gen_at(t[k]);
            let (d, v) = h_slow.eigh(UPLO::Lower)?;
            let (es, evecs) = reorder_evecs(&v, &d, &v_ref);
            let psis_k: nd::Array2<C64>
                = psis_t.slice(s![k, .., ..]).to_owned();
            energies.slice_mut(s![k, ..]).assign(&es);
            probabilities.slice_mut(s![k, .., ..])
                .assign(&calculate_probabilities(&psis_k, &evecs));
            v_ref = evecs;
        }
        Ok(v_ref)
    }
}

// conjugate transpose
fn dagger(m: &nd::Array2<C64>) -> nd::Array2<C64> {
    m.t().mapv(|a| a.conj())
}

/// Given state vectors as rows of `psis`, return the probabilities of being
/// found in the states stored as columns of `v`.
pub fn calculate_probabilities(
    psis: &nd::Array2<C64>,
    v: &nd::Array2<C64>,
) -> nd::Array2<f64>
{
    psis.dot(&v.mapv(|a| a.conj())).mapv(|a| a.norm_sqr())
}

/// Stored output of one simulation run.
///
/// All derived quantities are computed from the stored arrays; nothing
/// triggers a re-run of the propagation. Axis order for the 3D arrays is
/// (time, initial state, basis index).
#[derive(Clone, Debug)]
pub struct SimulationResult {
    /// Sampling times (s).
    pub t: nd::Array1<f64>,
    /// z-positions (m) corresponding to `t`.
    pub z: nd::Array1<f64>,
    /// State vectors over time for each initial state.
    pub psis: nd::Array3<C64>,
    /// Adiabatically tracked eigenenergies over time (rad/s).
    pub energies: nd::Array2<f64>,
    /// Probabilities of occupying each tracked eigenstate over time.
    pub probabilities: nd::Array3<f64>,
    /// Eigenbasis of the Hamiltonian at the initial time; reference for
    /// state-index lookups.
    pub v_ini: nd::Array2<C64>,
    /// Tracked eigenbasis at the final time.
    pub v_fin: nd::Array2<C64>,
    /// Resolved initial state vectors, one per row.
    pub initial_states: nd::Array2<C64>,
}

impl SimulationResult {
    // row index of the stored initial state closest to a nominal vector
    fn index_of_initial(&self, nominal: &nd::Array1<C64>) -> usize {
        self.initial_states.rows().into_iter()
            .map(|row| {
                row.iter().zip(nominal)
                    .map(|(a, b)| a.conj() * *b)
                    .sum::<C64>()
                    .norm_sqr()
            })
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |(imax, omax), (i, o)| {
                if o > omax { (i, o) } else { (imax, omax) }
            })
            .0
    }

    /// Return the probability over time of being found in the adiabatically
    /// evolved eigenstate of maximal overlap with `target`, starting from the
    /// stored initial state of maximal overlap with `initial`.
    pub fn get_state_probability(
        &self,
        target: &nd::Array1<C64>,
        initial: &nd::Array1<C64>,
    ) -> nd::Array1<f64>
    {
        let i_ini = self.index_of_initial(initial);
        let i_state = max_overlap_idx(target, &self.v_ini);
        self.probabilities.slice(s![.., i_ini, i_state]).to_owned()
    }

    /// Return the adiabatically tracked eigenenergy (rad/s) over time of the
    /// eigenstate of maximal overlap with `target`.
    pub fn get_state_energy(&self, target: &nd::Array1<C64>)
        -> nd::Array1<f64>
    {
        let i_state = max_overlap_idx(target, &self.v_ini);
        self.energies.slice(s![.., i_state]).to_owned()
    }

    /// Return the `n` tracked eigenstates with the largest time-averaged
    /// population for a given initial state, as `(mean population, initial
    /// eigenvector)` pairs sorted by descending population.
    pub fn find_large_prob_states(
        &self,
        initial: &nd::Array1<C64>,
        n: usize,
    ) -> Vec<(f64, nd::Array1<C64>)>
    {
        let i_ini = self.index_of_initial(initial);
        let nt = self.t.len() as f64;
        let mut means: Vec<(usize, f64)>
            = self.probabilities.slice(s![.., i_ini, ..])
            .columns().into_iter()
            .map(|col| col.sum() / nt)
            .enumerate()
            .collect();
        means.sort_by(|(_, a), (_, b)| {
            b.partial_cmp(a)
                .expect("find_large_prob_states: non-comparable means")
        });
        means.into_iter()
            .take(n)
            .map(|(j, mean)| (mean, self.v_ini.slice(s![.., j]).to_owned()))
            .collect()
    }

    /// Write the result to a `.npz` archive.
    pub fn save_npz<P: AsRef<Path>>(&self, path: P)
        -> Result<(), ArchiveError>
    {
        let mut npz = NpzWriter::new(File::create(path)?);
        npz.add_array("t", &self.t)?;
        npz.add_array("z", &self.z)?;
        npz.add_array("psis_re", &self.psis.mapv(|a| a.re))?;
        npz.add_array("psis_im", &self.psis.mapv(|a| a.im))?;
        npz.add_array("energies", &self.energies)?;
        npz.add_array("probabilities", &self.probabilities)?;
        npz.add_array("v_ini_re", &self.v_ini.mapv(|a| a.re))?;
        npz.add_array("v_ini_im", &self.v_ini.mapv(|a| a.im))?;
        npz.add_array("v_fin_re", &self.v_fin.mapv(|a| a.re))?;
        npz.add_array("v_fin_im", &self.v_fin.mapv(|a| a.im))?;
        npz.add_array("initial_re", &self.initial_states.mapv(|a| a.re))?;
        npz.add_array("initial_im", &self.initial_states.mapv(|a| a.im))?;
        npz.finish()?;
        Ok(())
    }

    /// Read a result back from a `.npz` archive written by
    /// [`Self::save_npz`].
    pub fn load_npz<P: AsRef<Path>>(path: P) -> Result<Self, ArchiveError> {
        let mut npz = NpzReader::new(File::open(path)?)?;
        let t: nd::Array1<f64> = npz.by_name("t.npy")?;
        let z: nd::Array1<f64> = npz.by_name("z.npy")?;
        let psis_re: nd::Array3<f64> = npz.by_name("psis_re.npy")?;
        let psis_im: nd::Array3<f64> = npz.by_name("psis_im.npy")?;
        let energies: nd::Array2<f64> = npz.by_name("energies.npy")?;
        let probabilities: nd::Array3<f64>
            = npz.by_name("probabilities.npy")?;
        let v_ini_re: nd::Array2<f64> = npz.by_name("v_ini_re.npy")?;
        let v_ini_im: nd::Array2<f64> = npz.by_name("v_ini_im.npy")?;
        let v_fin_re: nd::Array2<f64> = npz.by_name("v_fin_re.npy")?;
        let v_fin_im: nd::Array2<f64> = npz.by_name("v_fin_im.npy")?;
        let initial_re: nd::Array2<f64> = npz.by_name("initial_re.npy")?;
        let initial_im: nd::Array2<f64> = npz.by_name("initial_im.npy")?;

        let nt = t.len();
        let shapes_ok
            = z.len() == nt
            && psis_re.raw_dim() == psis_im.raw_dim()
            && psis_re.shape()[0] == nt
            && probabilities.raw_dim() == psis_re.raw_dim()
            && energies.shape() == &[nt, psis_re.shape()[2]][..]
            && v_ini_re.raw_dim() == v_ini_im.raw_dim()
            && v_fin_re.raw_dim() == v_fin_im.raw_dim()
            && initial_re.raw_dim() == initial_im.raw_dim();
        if !shapes_ok {
            return Err(ArchiveError::Shape);
        }

        Ok(Self {
            t,
            z,
            psis: complex_join3(&psis_re, &psis_im),
            energies,
            probabilities,
            v_ini: complex_join2(&v_ini_re, &v_ini_im),
            v_fin: complex_join2(&v_fin_re, &v_fin_im),
            initial_states: complex_join2(&initial_re, &initial_im),
        })
    }
}

fn complex_join2(re: &nd::Array2<f64>, im: &nd::Array2<f64>)
    -> nd::Array2<C64>
{
    nd::Zip::from(re).and(im).map_collect(|a, b| C64::new(*a, *b))
}

fn complex_join3(re: &nd::Array3<f64>, im: &nd::Array3<f64>)
    -> nd::Array3<C64>
{
    nd::Zip::from(re).and(im).map_collect(|a, b| C64::new(*a, *b))
}
