//! Microwave intensity profiles, polarization, and the coupling they induce
//! between rotational manifolds.
//!
//! Couplings are expressed in the frame co-rotating with each carrier: the
//! coupling matrices themselves are static, and the carrier phase appears as
//! a rotating-frame energy shift of `-ω` on the upper manifold (see
//! [`MicrowaveField::shift_diag`]).

use ndarray as nd;
use ndarray_linalg::{ Eigh, UPLO };
use num_complex::Complex64 as C64;
use crate::{
    error::{ FieldError, SimError },
    hamiltonian::direction_cosine_element,
    hilbert::{ Basis, XState, max_overlap_idx },
    units,
};

// relative cutoff below which coupling elements are dropped
const COUPLING_PRUNE: f64 = 1e-3;

/// Local microwave power density over position.
#[derive(Clone, Debug, PartialEq)]
pub enum IntensityProfile {
    /// Gaussian beam of total power `power` (W) and transverse width `sigma`
    /// (m), propagating along `k` through `r0`; the intensity depends only on
    /// the distance from the beam axis.
    GaussianBeam {
        power: f64,
        sigma: f64,
        k: [f64; 3],
        r0: [f64; 3],
    },
    /// Uniform background intensity (W/m²) over a bounded z-interval, zero
    /// outside.
    Uniform {
        intensity: f64,
        z_range: (f64, f64),
    },
}

impl IntensityProfile {
    /// Create a new Gaussian beam profile.
    ///
    /// Fails if `power` is negative, `sigma` is non-positive, or `k` is not
    /// unit-normalized.
    pub fn gaussian_beam(power: f64, sigma: f64, k: [f64; 3], r0: [f64; 3])
        -> Result<Self, FieldError>
    {
        FieldError::check_power(power)?;
        FieldError::check_width(sigma)?;
        let knorm = norm3(k);
        if (knorm - 1.0).abs() > 1e-6 {
            return Err(FieldError::BadKVector(knorm));
        }
        Ok(Self::GaussianBeam { power, sigma, k, r0 })
    }

    /// Create a new uniform background profile.
    ///
    /// Fails if `intensity` is negative.
    pub fn uniform(intensity: f64, z_range: (f64, f64))
        -> Result<Self, FieldError>
    {
        FieldError::check_intensity(intensity)?;
        Ok(Self::Uniform { intensity, z_range })
    }

    /// Local power density (W/m²) at a position.
    pub fn intensity_at(&self, r: [f64; 3]) -> f64 {
        match self {
            Self::GaussianBeam { power, sigma, k, r0 } => {
                let d = [r[0] - r0[0], r[1] - r0[1], r[2] - r0[2]];
                let along = d[0] * k[0] + d[1] * k[1] + d[2] * k[2];
                let rho_sq
                    = d.iter().zip(k)
                    .map(|(dk, kk)| (dk - along * kk).powi(2))
                    .sum::<f64>();
                *power / (2.0 * std::f64::consts::PI * sigma.powi(2))
                    * (-rho_sq / (2.0 * sigma.powi(2))).exp()
            },
            Self::Uniform { intensity, z_range } => {
                if r[2] >= z_range.0 && r[2] <= z_range.1 {
                    *intensity
                } else {
                    0.0
                }
            },
        }
    }

    /// Local electric-field amplitude (V/m), `E = sqrt(2 I / (c ε0))`.
    pub fn field_amplitude_at(&self, r: [f64; 3]) -> f64 {
        (2.0 * self.intensity_at(r) / (units::c * units::e0)).sqrt()
    }

    /// Reconfigure the driving strength: total power (W) for the Gaussian
    /// beam, intensity (W/m²) for the uniform background.
    pub fn set_power(&mut self, value: f64) {
        match self {
            Self::GaussianBeam { power, .. } => { *power = value; },
            Self::Uniform { intensity, .. } => { *intensity = value; },
        }
    }

    /// Reconfigure the profile center: the beam crossing point for the
    /// Gaussian beam, the center of the z-interval for the uniform
    /// background.
    pub fn set_position(&mut self, center: [f64; 3]) {
        match self {
            Self::GaussianBeam { r0, .. } => { *r0 = center; },
            Self::Uniform { z_range, .. } => {
                let half = (z_range.1 - z_range.0) / 2.0;
                *z_range = (center[2] - half, center[2] + half);
            },
        }
    }
}

/// Complex lab-frame polarization of a microwave field, resolved into
/// components transverse and longitudinal to the propagation vector.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Polarization {
    main: [C64; 3],
    k: [f64; 3],
    f_long: f64,
}

impl Polarization {
    /// Create a new polarization model.
    ///
    /// `main` is the transverse component (normalized on construction), `k`
    /// the unit propagation vector, and `f_long` the fraction of the
    /// polarization carried by the longitudinal component (relevant for
    /// near-field/background-scatter geometries; zero for a pure plane
    /// wave).
    pub fn new(main: [C64; 3], k: [f64; 3], f_long: f64)
        -> Result<Self, FieldError>
    {
        let knorm = norm3(k);
        if (knorm - 1.0).abs() > 1e-6 {
            return Err(FieldError::BadKVector(knorm));
        }
        let pnorm
            = main.iter().map(|p| p.norm_sqr()).sum::<f64>().sqrt();
        if pnorm <= 0.0 {
            return Err(FieldError::NullPolarization);
        }
        let main = [main[0] / pnorm, main[1] / pnorm, main[2] / pnorm];
        let dot
            = main.iter().zip(&k)
            .map(|(p, kk)| *p * *kk)
            .sum::<C64>()
            .norm();
        if dot > 1e-6 {
            return Err(FieldError::NonTransverse(dot));
        }
        if !(0.0..=1.0).contains(&f_long) {
            return Err(FieldError::BadLongFraction(f_long));
        }
        Ok(Self { main, k, f_long })
    }

    /// Pure transverse polarization along a real unit vector.
    pub fn linear(main: [f64; 3], k: [f64; 3]) -> Result<Self, FieldError> {
        Self::new(main.map(C64::from), k, 0.0)
    }

    /// Unit-normalized polarization vector at a position.
    ///
    /// The longitudinal component rides in quadrature with the transverse
    /// one, as for the near-field of an aperture.
    pub fn p_at(&self, _r: [f64; 3]) -> [C64; 3] {
        if self.f_long == 0.0 {
            return self.main;
        }
        let ct = (1.0 - self.f_long).sqrt();
        let cl = self.f_long.sqrt();
        [
            self.main[0] * ct + C64::i() * cl * self.k[0],
            self.main[1] * ct + C64::i() * cl * self.k[1],
            self.main[2] * ct + C64::i() * cl * self.k[2],
        ]
    }

    /// Return the longitudinal fraction.
    pub fn f_long(&self) -> f64 { self.f_long }
}

/// A microwave field driving one rotational transition.
///
/// Holds the (lower, upper) manifold pair, the intensity profile, the
/// polarization model, and the carrier frequency; computes its contribution
/// to the Hamiltonian at a given position. Coupling matrix elements are
/// precomputed per basis via [`Self::generate_couplings`].
#[derive(Clone, Debug)]
pub struct MicrowaveField {
    j_g: u32,
    j_e: u32,
    pub intensity: IntensityProfile,
    pub polarization: Polarization,
    freq: f64,
    dim: usize,
    // (upper index, lower index, cartesian dipole elements)
    couplings: Vec<(usize, usize, [C64; 3])>,
}

impl MicrowaveField {
    /// Create a new `MicrowaveField` for the `j_g -> j_e = j_g ± 1`
    /// transition with carrier frequency `freq` in units of angular
    /// frequency.
    pub fn new(
        j_g: u32,
        j_e: u32,
        intensity: IntensityProfile,
        polarization: Polarization,
        freq: f64,
    ) -> Result<Self, FieldError>
    {
        if j_e.abs_diff(j_g) != 1 {
            return Err(FieldError::BadTransition(j_g));
        }
        Ok(Self {
            j_g,
            j_e,
            intensity,
            polarization,
            freq,
            dim: 0,
            couplings: Vec::new(),
        })
    }

    /// Return the lower-manifold rotational quantum number.
    pub fn j_g(&self) -> u32 { self.j_g }

    /// Return the upper-manifold rotational quantum number.
    pub fn j_e(&self) -> u32 { self.j_e }

    /// Return the carrier frequency in units of angular frequency.
    pub fn freq(&self) -> f64 { self.freq }

    /// Reconfigure the carrier frequency (angular).
    pub fn set_frequency(&mut self, freq: f64) { self.freq = freq; }

    /// Reconfigure the driving strength; see
    /// [`IntensityProfile::set_power`].
    pub fn set_power(&mut self, value: f64) {
        self.intensity.set_power(value);
    }

    /// Reconfigure the profile center; see
    /// [`IntensityProfile::set_position`].
    pub fn set_position(&mut self, center: [f64; 3]) {
        self.intensity.set_position(center);
    }

    /// Precompute the dipole coupling elements between the two manifolds in
    /// the index order of `basis`.
    ///
    /// Elements smaller than `1e-3` of the largest are dropped.
    pub fn generate_couplings(&mut self, basis: &Basis<XState>) {
        let over_rt2 = std::f64::consts::FRAC_1_SQRT_2;
        let mut couplings: Vec<(usize, usize, [C64; 3])> = Vec::new();
        for (i, si) in basis.keys().enumerate() {
            if si.j() != self.j_e { continue; }
            for (j, sj) in basis.keys().enumerate() {
                if sj.j() != self.j_g { continue; }
                let nm1 = direction_cosine_element(si, sj, -1);
                let n0 = direction_cosine_element(si, sj, 0);
                let np1 = direction_cosine_element(si, sj, 1);
                let me = [
                    C64::from((nm1 - np1) * over_rt2),
                    C64::i() * (nm1 + np1) * over_rt2,
                    C64::from(n0),
                ];
                if me.iter().any(|a| a.norm() > 0.0) {
                    couplings.push((i, j, me));
                }
            }
        }
        let max_me: f64
            = couplings.iter()
            .flat_map(|(_, _, me)| me.iter().map(|a| a.norm()))
            .fold(0.0_f64, f64::max);
        couplings.iter_mut()
            .for_each(|(_, _, me)| {
                me.iter_mut()
                    .filter(|a| a.norm() < COUPLING_PRUNE * max_me)
                    .for_each(|a| { *a = C64::from(0.0); });
            });
        self.dim = basis.len();
        self.couplings = couplings;
    }

    /// Local Rabi frequency scale `d_TlF E(r) / ħ` in units of angular
    /// frequency.
    pub fn rabi_at(&self, r: [f64; 3]) -> f64 {
        units::D_TLF * self.intensity.field_amplitude_at(r) / units::hbar
    }

    /// Compute the coupling contribution to the Hamiltonian at a position, in
    /// the frame co-rotating with the carrier.
    ///
    /// *Panics* if couplings have not been generated.
    pub fn gen_at(&self, r: [f64; 3]) -> nd::Array2<C64> {
        if self.dim == 0 {
            panic!("MicrowaveField::gen_at: couplings not generated");
        }
        let mut h: nd::Array2<C64> = nd::Array2::zeros((self.dim, self.dim));
        let rabi = self.rabi_at(r);
        if rabi <= 0.0 { return h; }
        let p = self.polarization.p_at(r);
        for (i, j, me) in self.couplings.iter() {
            let drive: C64
                = 0.5 * rabi
                * (p[0] * me[0] + p[1] * me[1] + p[2] * me[2]);
            h[[*i, *j]] += drive;
            h[[*j, *i]] += drive.conj();
        }
        h
    }

    /// Rotating-frame energy shifts: `-omega` on every upper-manifold state,
    /// zero elsewhere, in the index order of `basis`.
    pub fn shift_diag(&self, basis: &Basis<XState>, omega: f64)
        -> nd::Array1<f64>
    {
        basis.keys()
            .map(|s| if s.j() == self.j_e { -omega } else { 0.0 })
            .collect()
    }
}

/// Compute the transition frequency between the eigenstates of `h_ref` of
/// maximal overlap with the nominal vectors `g` and `e`, in units of angular
/// frequency.
///
/// `h_ref` is typically the system Hamiltonian at a reference position, so
/// the result accounts for Stark/Zeeman dressing there; identification by
/// overlap keeps this well-defined for near-degenerate spectra.
pub fn transition_frequency(
    h_ref: &nd::Array2<C64>,
    g: &nd::Array1<C64>,
    e: &nd::Array1<C64>,
) -> Result<f64, SimError>
{
    let (energies, v) = h_ref.eigh(UPLO::Lower)?;
    let ig = max_overlap_idx(g, &v);
    let ie = max_overlap_idx(e, &v);
    Ok(energies[ie] - energies[ig])
}

fn norm3(v: [f64; 3]) -> f64 {
    v.iter().map(|vk| vk * vk).sum::<f64>().sqrt()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn uniform_region() {
        let profile
            = IntensityProfile::uniform(2.5, (0.0, 0.1)).unwrap();
        assert_eq!(profile.intensity_at([0.0, 0.0, 0.05]), 2.5);
        assert_eq!(profile.intensity_at([0.0, 0.0, 0.2]), 0.0);
    }

    #[test]
    fn polarization_validation() {
        assert!(matches!(
            Polarization::linear([0.0, 0.0, 1.0], [0.0, 0.0, 2.0]),
            Err(FieldError::BadKVector(_)),
        ));
        assert!(matches!(
            Polarization::linear([0.0, 0.0, 1.0], [0.0, 0.0, 1.0]),
            Err(FieldError::NonTransverse(_)),
        ));
        assert!(
            Polarization::linear([0.0, 0.0, 1.0], [1.0, 0.0, 0.0]).is_ok()
        );
    }

    #[test]
    fn reconfiguration() {
        let profile = IntensityProfile::gaussian_beam(
            1e-6, 0.01, [1.0, 0.0, 0.0], [0.0; 3]).unwrap();
        let pol
            = Polarization::linear([0.0, 0.0, 1.0], [1.0, 0.0, 0.0]).unwrap();
        let mut field
            = MicrowaveField::new(0, 1, profile, pol, 1e9).unwrap();

        let rabi0 = field.rabi_at([0.0; 3]);
        assert!(rabi0 > 0.0);
        field.set_power(0.0);
        assert_eq!(field.rabi_at([0.0; 3]), 0.0);

        field.set_power(1e-6);
        field.set_position([0.0, 0.0, 0.05]);
        assert!((field.rabi_at([0.0, 0.0, 0.05]) - rabi0).abs()
            < 1e-12 * rabi0);
        assert!(field.rabi_at([0.0; 3]) < rabi0);

        field.set_frequency(2e9);
        assert_eq!(field.freq(), 2e9);
    }

    #[test]
    fn bad_transition() {
        let profile = IntensityProfile::uniform(1.0, (0.0, 0.1)).unwrap();
        let pol
            = Polarization::linear([0.0, 0.0, 1.0], [1.0, 0.0, 0.0]).unwrap();
        assert!(matches!(
            MicrowaveField::new(1, 3, profile, pol, 0.0),
            Err(FieldError::BadTransition(1)),
        ));
    }
}
