//! Definitions to describe basis states of the molecule and ordered bases
//! built from them.

use std::{ hash::Hash, ops::{ Deref, DerefMut } };
use ndarray as nd;
use indexmap::IndexMap;
use num_complex::Complex64 as C64;
use num_traits::{ Zero, One };
use crate::{
    spin::{ Spin, SpinProj, SpinTotal },
    units,
};

/* States *********************************************************************/

/// Nuclear spin of 205Tl.
pub const I_TL: SpinTotal = SpinTotal::new(1);

/// Nuclear spin of 19F.
pub const I_F: SpinTotal = SpinTotal::new(1);

/// A single basis state.
pub trait BasisState: Clone + Eq + Hash + std::fmt::Debug {
    /// Return `true` if two states can be coupled by a stimulated electric
    /// dipole transition.
    ///
    /// This method should be reflexive in its inputs.
    fn couples_to(&self, other: &Self) -> bool;
}

/// Uncoupled basis state of the TlF electronic/vibrational ground manifold,
/// `|J, mJ> ⊗ |m1> ⊗ |m2>` with `m1` (`m2`) the Tl (F) nuclear-spin
/// projection.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct XState {
    /// Rotational angular momentum and its projection.
    pub rot: Spin,
    /// Tl nuclear-spin projection.
    pub m1: SpinProj,
    /// F nuclear-spin projection.
    pub m2: SpinProj,
}

impl XState {
    /// Create a new state from true rotational quantum numbers `(j, mj)` and
    /// nuclear projections in halves.
    ///
    /// Returns `None` for invalid combinations.
    pub fn new(j: u32, mj: i32, m1: i32, m2: i32) -> Option<Self> {
        let rot = Spin::new(2 * j, 2 * mj)?;
        (m1.abs() == 1 && m2.abs() == 1)
            .then_some(
                Self { rot, m1: SpinProj::new(m1), m2: SpinProj::new(m2) }
            )
    }

    /// Return the rotational quantum number J.
    pub fn j(&self) -> u32 { self.rot.total().halves() / 2 }

    /// Return the rotational projection mJ.
    pub fn mj(&self) -> i32 { self.rot.proj().halves() / 2 }
}

impl std::fmt::Display for XState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn half(h: i32) -> String {
            if h % 2 == 0 {
                format!("{}", h / 2)
            } else {
                format!("{}/2", h)
            }
        }
        write!(f, "|{}, {}, {}, {}>",
            self.j(), self.mj(),
            half(self.m1.halves()), half(self.m2.halves()),
        )
    }
}

impl BasisState for XState {
    fn couples_to(&self, other: &Self) -> bool {
        let j1 = self.j() as i32;
        let j2 = other.j() as i32;
        (j1 - j2).abs() == 1
    }
}

/* Bases **********************************************************************/

/// A collection of unique [`BasisState`]s with associated field-free energies
/// in units of angular frequency.
///
/// Insertion order defines the canonical index order shared by every matrix
/// and state vector in the crate. The collection is backed by a single
/// [`IndexMap`], which can be accessed via [`AsRef`], [`AsMut`], [`Deref`],
/// and [`DerefMut`].
#[derive(Clone, Debug, PartialEq)]
pub struct Basis<S>
where S: Clone + Eq + Hash
{
    energies: IndexMap<S, f64>,
}

impl<S> AsRef<IndexMap<S, f64>> for Basis<S>
where S: Clone + Eq + Hash
{
    fn as_ref(&self) -> &IndexMap<S, f64> { &self.energies }
}

impl<S> AsMut<IndexMap<S, f64>> for Basis<S>
where S: Clone + Eq + Hash
{
    fn as_mut(&mut self) -> &mut IndexMap<S, f64> { &mut self.energies }
}

impl<S> Deref for Basis<S>
where S: Clone + Eq + Hash
{
    type Target = IndexMap<S, f64>;

    fn deref(&self) -> &Self::Target { &self.energies }
}

impl<S> DerefMut for Basis<S>
where S: Clone + Eq + Hash
{
    fn deref_mut(&mut self) -> &mut Self::Target { &mut self.energies }
}

impl<S> Default for Basis<S>
where S: Clone + Eq + Hash
{
    fn default() -> Self { Self { energies: IndexMap::default() } }
}

impl<S> FromIterator<(S, f64)> for Basis<S>
where S: Clone + Eq + Hash
{
    fn from_iter<I>(iter: I) -> Self
    where I: IntoIterator<Item = (S, f64)>
    {
        Self { energies: iter.into_iter().collect() }
    }
}

impl<S> Basis<S>
where S: Clone + Eq + Hash
{
    /// Create a new, empty basis.
    pub fn new() -> Self { Self::default() }

    /// Get the energy in units of angular frequency of a particular basis
    /// state.
    pub fn get_energy(&self, state: &S) -> Option<f64> {
        self.energies.get(state).copied()
    }

    /// Get an array representation of a particular basis state.
    ///
    /// The array is sized to match the number of states currently in `self`.
    pub fn get_vector(&self, state: &S) -> Option<nd::Array1<C64>> {
        self.energies.get_index_of(state)
            .map(|k| {
                let n = self.energies.len();
                (0..n).map(|j| if j == k { C64::one() } else { C64::zero() })
                    .collect()
            })
    }

    /// Get an array representation of a particular basis state by index.
    ///
    /// The array is sized to match the number of states currently in `self`.
    pub fn get_vector_index(&self, index: usize) -> Option<nd::Array1<C64>> {
        let n = self.energies.len();
        (index < n).then(|| {
            (0..n).map(|j| if j == index { C64::one() } else { C64::zero() })
                .collect()
        })
    }

    /// Get an array representation of a linear combination of basis states,
    /// with weights determined by a weighting function.
    ///
    /// The weighting function will be passed a state, its index, and its
    /// energy. The resulting vector is not normalized.
    pub fn get_vector_weighted<F>(&self, weights: F) -> nd::Array1<C64>
    where F: Fn(&S, usize, f64) -> C64
    {
        self.energies.iter().enumerate()
            .map(|(index, (state, energy))| weights(state, index, *energy))
            .collect()
    }
}

/// Construct the standard uncoupled basis over a set of rotational manifolds,
/// with rigid-rotor energies `2π B_rot J (J + 1)`.
///
/// States are ordered by ascending J, then mJ, then the Tl and F nuclear
/// projections. Ascending J keeps the bare index order aligned with the
/// energy-sorted eigenbases used for rotating-frame bookkeeping.
pub fn uncoupled_basis<I>(manifolds: I) -> Basis<XState>
where I: IntoIterator<Item = u32>
{
    use std::f64::consts::TAU;
    let mut js: Vec<u32> = manifolds.into_iter().collect();
    js.sort_unstable();
    js.dedup();
    let mut basis: Basis<XState> = Basis::new();
    for j in js {
        let energy: f64 = TAU * units::B_ROT * (j * (j + 1)) as f64;
        for mj in SpinTotal::new(2 * j).projections() {
            for m1 in I_TL.projections() {
                for m2 in I_F.projections() {
                    let state = XState {
                        rot: Spin::new(2 * j, mj.halves())
                            .expect("uncoupled_basis: invalid projection"),
                        m1,
                        m2,
                    };
                    basis.insert(state, energy);
                }
            }
        }
    }
    basis
}

/* Overlap utilities **********************************************************/

/// Return the index of the column of `v` with the largest squared overlap
/// with `vec`.
pub fn max_overlap_idx(vec: &nd::Array1<C64>, v: &nd::Array2<C64>) -> usize {
    v.columns().into_iter()
        .map(|col| {
            col.iter().zip(vec)
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

/// Reorder the columns of `v` (and the entries of `e`) so that the `k`-th
/// column has maximal overlap with the `k`-th column of `v_ref`.
///
/// This keeps adiabatically evolving eigenstates at fixed indices across
/// successive diagonalizations, including through avoided crossings where the
/// raw energy order swaps.
pub fn reorder_evecs(
    v: &nd::Array2<C64>,
    e: &nd::Array1<f64>,
    v_ref: &nd::Array2<C64>,
) -> (nd::Array1<f64>, nd::Array2<C64>)
{
    let n = e.len();
    let index: Vec<usize>
        = v_ref.columns().into_iter()
        .map(|refcol| max_overlap_idx(&refcol.to_owned(), v))
        .collect();
    let mut e_out: nd::Array1<f64> = nd::Array1::zeros(n);
    let mut v_out: nd::Array2<C64> = nd::Array2::zeros(v.raw_dim());
    for (k, &j) in index.iter().enumerate() {
        e_out[k] = e[j];
        v_out.column_mut(k).assign(&v.column(j));
    }
    (e_out, v_out)
}

/// Decompose a state vector into its dominant basis components, sorted by
/// descending weight.
///
/// Components with squared amplitude below `tol` are dropped.
pub fn dominant_components<S>(
    vec: &nd::Array1<C64>,
    basis: &Basis<S>,
    tol: f64,
) -> Vec<(C64, S)>
where S: Clone + Eq + Hash
{
    let mut components: Vec<(C64, S)>
        = vec.iter().zip(basis.keys())
        .filter(|(a, _)| a.norm_sqr() >= tol)
        .map(|(a, s)| (*a, s.clone()))
        .collect();
    components.sort_by(|(a, _), (b, _)| {
        b.norm_sqr().partial_cmp(&a.norm_sqr())
            .expect("dominant_components: non-comparable amplitudes")
    });
    components
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn basis_ordering() {
        let basis = uncoupled_basis([0, 1]);
        assert_eq!(basis.len(), 4 + 12);
        let (first, _) = basis.get_index(0).unwrap();
        assert_eq!(*first, XState::new(0, 0, -1, -1).unwrap());
        let (last, _) = basis.get_index(15).unwrap();
        assert_eq!(*last, XState::new(1, 1, 1, 1).unwrap());
    }

    #[test]
    fn overlap_picks_matching_column() {
        let v: nd::Array2<C64> = nd::Array2::eye(3);
        let vec: nd::Array1<C64>
            = nd::array![0.1.into(), 0.99.into(), 0.1.into()];
        assert_eq!(max_overlap_idx(&vec, &v), 1);
    }
}
