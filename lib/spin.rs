//! Angular momentum quantum numbers and the small amount of Wigner algebra
//! needed for dipole and hyperfine matrix elements.
//!
//! All types are backed by integer numbers of halves so that integer
//! (rotational) and half-integer (nuclear) momenta share one representation.

use wigner_symbols::Wigner3jm;

/// A single spin-projection quantum number, as a number of halves.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpinProj(i32);

impl SpinProj {
    /// Create a new spin projection from a number of halves.
    pub const fn new(m: i32) -> Self { Self(m) }

    /// Return `self` as a bare number of halves.
    pub fn halves(self) -> i32 { self.0 }

    /// Return `self` as an `f64`.
    ///
    /// This reflects the "true" value of the projection quantum number; i.e.
    /// there is a relative factor of 2 between this and [`Self::halves`].
    pub fn f(self) -> f64 { f64::from(self.0) / 2.0 }

    /// Return a reflected (sign-flipped) copy of `self`.
    pub fn reflected(self) -> Self { Self(-self.0) }
}

impl From<i32> for SpinProj {
    fn from(m: i32) -> Self { Self(m) }
}

/// A single total-spin quantum number, as a number of halves.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpinTotal(u32);

impl SpinTotal {
    /// Create a new total spin from a number of halves.
    pub const fn new(j: u32) -> Self { Self(j) }

    /// Return `self` as a bare number of halves.
    pub fn halves(self) -> u32 { self.0 }

    /// Return `self` as an `f64`.
    pub fn f(self) -> f64 { f64::from(self.0) / 2.0 }

    /// Return an iterator over available projections, ascending.
    pub fn projections(self) -> impl Iterator<Item = SpinProj> {
        let j = self.0 as i32;
        (-j..=j).step_by(2).map(SpinProj)
    }
}

impl From<u32> for SpinTotal {
    fn from(j: u32) -> Self { Self(j) }
}

/// A total-spin/projection pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Spin(SpinTotal, SpinProj);

impl Spin {
    /// Create a new spin, checking that the projection does not exceed the
    /// total in magnitude and that both have the same parity in halves.
    pub fn new(j: u32, m: i32) -> Option<Self> {
        let valid
            = m.unsigned_abs() <= j
            && (j as i32 - m) % 2 == 0;
        valid.then_some(Self(SpinTotal(j), SpinProj(m)))
    }

    /// Return the total-spin quantum number.
    pub fn total(self) -> SpinTotal { self.0 }

    /// Return the projection quantum number.
    pub fn proj(self) -> SpinProj { self.1 }

    /// Return `self` as a bare pair of halves.
    pub fn halves(self) -> (u32, i32) { (self.0.halves(), self.1.halves()) }

    /// Return `self` as a `(f64, f64)` of true quantum-number values.
    pub fn f(self) -> (f64, f64) { (self.0.f(), self.1.f()) }
}

impl<J, M> From<(J, M)> for Spin
where
    J: Into<SpinTotal>,
    M: Into<SpinProj>,
{
    fn from(jm: (J, M)) -> Self {
        let (j, m) = jm;
        Self::new(j.into().halves(), m.into().halves())
            .expect("Spin::from: invalid total-projection combination")
    }
}

/// Calculate the appropriate Wigner 3j symbol for columns (left to right)
/// `s1..s3`.
pub fn w3j<S1, S2, S3>(s1: S1, s2: S2, s3: S3) -> f64
where
    S1: Into<Spin>,
    S2: Into<Spin>,
    S3: Into<Spin>,
{
    let s1 = s1.into();
    let s2 = s2.into();
    let s3 = s3.into();
    Wigner3jm {
        tj1: s1.total().halves() as i32,
        tm1: s1.proj().halves(),
        tj2: s2.total().halves() as i32,
        tm2: s2.proj().halves(),
        tj3: s3.total().halves() as i32,
        tm3: s3.proj().halves(),
    }
    .value()
    .into()
}

/// Matrix element `<j, m+1| J+ |j, m>` of the raising operator, in units of
/// ħ.
pub fn ladder_plus(j: SpinTotal, m: SpinProj) -> f64 {
    let j = j.f();
    let m = m.f();
    (j * (j + 1.0) - m * (m + 1.0)).max(0.0).sqrt()
}

/// Matrix element `<j, m-1| J- |j, m>` of the lowering operator, in units of
/// ħ.
pub fn ladder_minus(j: SpinTotal, m: SpinProj) -> f64 {
    let j = j.f();
    let m = m.f();
    (j * (j + 1.0) - m * (m - 1.0)).max(0.0).sqrt()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn w3j_stretched() {
        // ( 1 1 0 ; 0 0 0 ) = -1/sqrt(3)
        let val = w3j((2_u32, 0_i32), (2_u32, 0_i32), (0_u32, 0_i32));
        assert!((val - (-1.0 / 3.0_f64.sqrt())).abs() < 1e-12);
    }

    #[test]
    fn projections_ascend() {
        let ms: Vec<i32>
            = SpinTotal::new(3).projections().map(SpinProj::halves).collect();
        assert_eq!(ms, vec![-3, -1, 1, 3]);
    }

    #[test]
    fn ladder_spin_half() {
        let i = SpinTotal::new(1);
        assert!((ladder_plus(i, SpinProj::new(-1)) - 1.0).abs() < 1e-12);
        assert_eq!(ladder_plus(i, SpinProj::new(1)), 0.0);
    }
}
