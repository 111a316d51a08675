//! Molecular Hamiltonian operators over the uncoupled basis and their
//! composition with the beamline fields into a time-dependent system matrix.
//!
//! Every operator is computed once at construction; evaluating the
//! Hamiltonian along a trajectory is then a cheap linear combination per time
//! step.

use ndarray as nd;
use num_complex::Complex64 as C64;
use std::f64::consts::TAU;
use crate::{
    fields::{ ElectricField, MagneticField },
    hilbert::{ Basis, BasisState, XState, I_TL, I_F },
    spin::{ self, SpinProj, SpinTotal },
    trajectory::Trajectory,
    units,
};

/// Matrix element of the spherical direction-cosine operator
/// `<J2 mJ2| n_q |J1 mJ1>`, diagonal in the nuclear projections.
pub fn direction_cosine_element(bra: &XState, ket: &XState, q: i32) -> f64 {
    if bra.m1 != ket.m1 || bra.m2 != ket.m2 { return 0.0; }
    if !bra.couples_to(ket) { return 0.0; }
    let j1 = ket.j() as i32;
    let j2 = bra.j() as i32;
    let m1 = ket.mj();
    let m2 = bra.mj();
    if m2 != m1 + q { return 0.0; }
    let phase = if m2 % 2 == 0 { 1.0 } else { -1.0 };
    phase
        * (((2 * j1 + 1) * (2 * j2 + 1)) as f64).sqrt()
        * spin::w3j(
            (2 * j2 as u32, -2 * m2), (2_u32, 2 * q), (2 * j1 as u32, 2 * m1))
        * spin::w3j(
            (2 * j2 as u32, 0_i32), (2_u32, 0_i32), (2 * j1 as u32, 0_i32))
}

/// Cartesian direction-cosine operator matrices `[n_x, n_y, n_z]` over the
/// basis.
///
/// Assembled from the spherical components via `n_x = (n_-1 - n_+1)/√2`,
/// `n_y = i (n_-1 + n_+1)/√2`, `n_z = n_0`; each matrix is Hermitian.
pub fn direction_cosine_cart(basis: &Basis<XState>) -> [nd::Array2<C64>; 3] {
    let n = basis.len();
    let mut nsph: [nd::Array2<f64>; 3]
        = [nd::Array2::zeros((n, n)),
           nd::Array2::zeros((n, n)),
           nd::Array2::zeros((n, n))];
    for (i, si) in basis.keys().enumerate() {
        for (j, sj) in basis.keys().enumerate() {
            for (kq, q) in [-1_i32, 0, 1].into_iter().enumerate() {
                nsph[kq][[i, j]] = direction_cosine_element(si, sj, q);
            }
        }
    }
    let over_rt2 = std::f64::consts::FRAC_1_SQRT_2;
    let nx: nd::Array2<C64>
        = (&nsph[0] - &nsph[2]).mapv(|a| C64::from(a * over_rt2));
    let ny: nd::Array2<C64>
        = (&nsph[0] + &nsph[2]).mapv(|a| C64::i() * a * over_rt2);
    let nz: nd::Array2<C64> = nsph[1].mapv(C64::from);
    [nx, ny, nz]
}

// matrix of I1 . I2 over the nuclear projections (diagonal in rotation)
fn spin_spin_op(basis: &Basis<XState>) -> nd::Array2<C64> {
    let n = basis.len();
    let mut op: nd::Array2<C64> = nd::Array2::zeros((n, n));
    for (i, si) in basis.keys().enumerate() {
        for (j, sj) in basis.keys().enumerate() {
            if si.rot != sj.rot { continue; }
            let elem = dot_element(
                (I_TL, sj.m1, si.m1), (I_F, sj.m2, si.m2));
            op[[i, j]] += C64::from(elem);
        }
    }
    op
}

// matrix of I . J for one nucleus (diagonal in the other's projection)
fn spin_rotation_op<F>(basis: &Basis<XState>, inucl: SpinTotal, proj: F)
    -> nd::Array2<C64>
where F: Fn(&XState) -> (SpinProj, SpinProj)
{
    let n = basis.len();
    let mut op: nd::Array2<C64> = nd::Array2::zeros((n, n));
    for (i, si) in basis.keys().enumerate() {
        for (j, sj) in basis.keys().enumerate() {
            if si.rot.total() != sj.rot.total() { continue; }
            let (mi_nucl, mi_spec) = proj(si);
            let (mj_nucl, mj_spec) = proj(sj);
            if mi_spec != mj_spec { continue; }
            let elem = dot_element(
                (inucl, mj_nucl, mi_nucl),
                (sj.rot.total(), sj.rot.proj(), si.rot.proj()),
            );
            op[[i, j]] += C64::from(elem);
        }
    }
    op
}

// <m1' m2'| A . B |m1 m2> for two commuting angular momenta via
// Az Bz + (A+ B- + A- B+)/2; arguments are (total, m_ket, m_bra)
fn dot_element(
    a: (SpinTotal, SpinProj, SpinProj),
    b: (SpinTotal, SpinProj, SpinProj),
) -> f64
{
    let (ja, ma, ma2) = a;
    let (jb, mb, mb2) = b;
    let da = ma2.halves() - ma.halves();
    let db = mb2.halves() - mb.halves();
    match (da, db) {
        (0, 0) => ma.f() * mb.f(),
        (2, -2) => 0.5 * spin::ladder_plus(ja, ma) * spin::ladder_minus(jb, mb),
        (-2, 2) => 0.5 * spin::ladder_minus(ja, ma) * spin::ladder_plus(jb, mb),
        _ => 0.0,
    }
}

// nuclear spin operator matrices [Ix, Iy, Iz] for one nucleus
fn nuclear_spin_cart<F>(basis: &Basis<XState>, inucl: SpinTotal, proj: F)
    -> [nd::Array2<C64>; 3]
where F: Fn(&XState) -> (SpinProj, SpinProj)
{
    let n = basis.len();
    let mut ops: [nd::Array2<C64>; 3]
        = [nd::Array2::zeros((n, n)),
           nd::Array2::zeros((n, n)),
           nd::Array2::zeros((n, n))];
    for (i, si) in basis.keys().enumerate() {
        for (j, sj) in basis.keys().enumerate() {
            if si.rot != sj.rot { continue; }
            let (mi, mi_spec) = proj(si);
            let (mj, mj_spec) = proj(sj);
            if mi_spec != mj_spec { continue; }
            let d = mi.halves() - mj.halves();
            match d {
                0 => { ops[2][[i, j]] += C64::from(mj.f()); },
                2 => {
                    let lp = spin::ladder_plus(inucl, mj);
                    ops[0][[i, j]] += C64::from(0.5 * lp);
                    ops[1][[i, j]] += -C64::i() * 0.5 * lp;
                },
                -2 => {
                    let lm = spin::ladder_minus(inucl, mj);
                    ops[0][[i, j]] += C64::from(0.5 * lm);
                    ops[1][[i, j]] += C64::i() * 0.5 * lm;
                },
                _ => { },
            }
        }
    }
    ops
}

/// Hyperfine coupling constants (Hz).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HyperfineParams {
    /// Tl spin-rotation constant.
    pub c1: f64,
    /// F spin-rotation constant.
    pub c2: f64,
    /// Scalar Tl-F spin-spin constant.
    pub c4: f64,
}

impl Default for HyperfineParams {
    fn default() -> Self {
        Self { c1: units::C1_TL, c2: units::C2_F, c4: units::C4_SS }
    }
}

impl HyperfineParams {
    /// All couplings zero; useful for bare-rotor studies.
    pub fn none() -> Self { Self { c1: 0.0, c2: 0.0, c4: 0.0 } }
}

/// Hamiltonian builder for a molecule traversing the beamline's static
/// fields.
///
/// All operator matrices are precomputed at construction; [`Self::gen_at`]
/// performs no diagonalization and reloads no data. Energies are in units of
/// angular frequency.
#[derive(Clone, Debug)]
pub struct HBuilderBeamline<'a> {
    pub(crate) basis: &'a Basis<XState>,
    pub trajectory: Trajectory,
    pub electric: ElectricField,
    pub magnetic: MagneticField,
    h0: nd::Array2<C64>,
    ncart: [nd::Array2<C64>; 3],
    zeeman: [nd::Array2<C64>; 3],
}

impl<'a> HBuilderBeamline<'a> {
    /// Create a new `HBuilderBeamline` with the default TlF hyperfine
    /// constants.
    pub fn new(
        basis: &'a Basis<XState>,
        trajectory: Trajectory,
        electric: ElectricField,
        magnetic: MagneticField,
    ) -> Self
    {
        Self::with_hyperfine(
            basis, trajectory, electric, magnetic, HyperfineParams::default())
    }

    /// Create a new `HBuilderBeamline` with explicit hyperfine constants.
    pub fn with_hyperfine(
        basis: &'a Basis<XState>,
        trajectory: Trajectory,
        electric: ElectricField,
        magnetic: MagneticField,
        hyperfine: HyperfineParams,
    ) -> Self
    {
        let n = basis.len();
        let mut h0: nd::Array2<C64> = nd::Array2::zeros((n, n));
        let diag: nd::Array1<C64>
            = basis.values().map(|e| C64::from(*e)).collect();
        h0.diag_mut().assign(&diag);
        h0 += &(spin_rotation_op(basis, I_TL, |s| (s.m1, s.m2))
            * C64::from(TAU * hyperfine.c1));
        h0 += &(spin_rotation_op(basis, I_F, |s| (s.m2, s.m1))
            * C64::from(TAU * hyperfine.c2));
        h0 += &(spin_spin_op(basis) * C64::from(TAU * hyperfine.c4));

        let ncart = direction_cosine_cart(basis);

        let i1 = nuclear_spin_cart(basis, I_TL, |s| (s.m1, s.m2));
        let i2 = nuclear_spin_cart(basis, I_F, |s| (s.m2, s.m1));
        let zeeman: [nd::Array2<C64>; 3]
            = [0, 1, 2].map(|k| {
                &i1[k] * C64::from(TAU * units::MU_TL)
                    + &i2[k] * C64::from(TAU * units::MU_F)
            });

        Self { basis, trajectory, electric, magnetic, h0, ncart, zeeman }
    }

    /// Get a reference to the basis.
    pub fn basis(&self) -> &Basis<XState> { self.basis }

    /// Get the field-free Hamiltonian matrix.
    pub fn h0(&self) -> &nd::Array2<C64> { &self.h0 }

    /// Compute the Hamiltonian at a fixed position: field-free + Stark +
    /// Zeeman terms for the local static fields.
    pub fn gen_static_at(&self, r: [f64; 3]) -> nd::Array2<C64> {
        let efield = self.electric.at(r);
        let bfield = self.magnetic.at(r);
        let mut h = self.h0.clone();
        let stark = units::D_TLF / units::hbar;
        for k in 0..3 {
            if efield[k] != 0.0 {
                h -= &(&self.ncart[k] * C64::from(stark * efield[k]));
            }
            if bfield[k] != 0.0 {
                h -= &(&self.zeeman[k] * C64::from(bfield[k]));
            }
        }
        h
    }

    /// Compute the Hamiltonian at a given time along the trajectory.
    pub fn gen_at(&self, t: f64) -> nd::Array2<C64> {
        self.gen_static_at(self.trajectory.position(t))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hilbert::uncoupled_basis;

    #[test]
    fn dipole_me_j0_j1() {
        let g = XState::new(0, 0, 1, -1).unwrap();
        let e = XState::new(1, 0, 1, -1).unwrap();
        // <1 0| n_0 |0 0> = 1/sqrt(3)
        let me = direction_cosine_element(&e, &g, 0);
        assert!((me - 1.0 / 3.0_f64.sqrt()).abs() < 1e-12);
        // nuclear projections are spectators
        let e_flip = XState::new(1, 0, -1, -1).unwrap();
        assert_eq!(direction_cosine_element(&e_flip, &g, 0), 0.0);
    }

    #[test]
    fn operators_hermitian() {
        let basis = uncoupled_basis([0, 1, 2]);
        let ncart = direction_cosine_cart(&basis);
        for op in ncart.iter() {
            let diff
                = op.iter().zip(op.t().iter())
                .map(|(a, b)| (*a - b.conj()).norm())
                .fold(0.0_f64, f64::max);
            assert!(diff < 1e-12);
        }
    }

    #[test]
    fn h0_reduces_to_rotor() {
        let basis = uncoupled_basis([0, 1]);
        let traj
            = Trajectory::new([0.0; 3], [0.0, 0.0, 100.0], 0.1).unwrap();
        let builder = HBuilderBeamline::with_hyperfine(
            &basis,
            traj,
            ElectricField::Uniform([0.0; 3]),
            MagneticField::Uniform([0.0; 3]),
            HyperfineParams::none(),
        );
        let h = builder.gen_at(0.0);
        let e_j1 = TAU * units::B_ROT * 2.0;
        for (k, energy) in basis.values().enumerate() {
            assert!((h[[k, k]].re - energy).abs() < 1e-6 * e_j1);
        }
        let offdiag
            = h.indexed_iter()
            .filter(|((i, j), _)| i != j)
            .map(|(_, a)| a.norm())
            .fold(0.0_f64, f64::max);
        assert!(offdiag < 1e-12);
    }
}
