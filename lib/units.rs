#![allow(non_upper_case_globals)]

//! Physical constants (SI) and molecular constants for the TlF electronic
//! ground state.
//!
//! Fundamental constants are taken from NIST; molecular constants from the
//! usual TlF spectroscopy literature. All frequencies exposed by this module
//! are ordinary frequencies (Hz); multiply by `TAU` where angular frequencies
//! are required.

use std::f64::consts::TAU;

/// Planck constant (kg m^2 s^-1)
pub const h: f64 = 6.62607015e-34;
//             +/- 0 (exact)

/// reduced Planck constant (kg m^2 s^-1)
pub const hbar: f64 = h / TAU;
//                +/- 0 (exact)

/// speed of light in vacuum (m s^-1)
pub const c: f64 = 2.99792458e8;
//             +/- 0 (exact)

/// electric permittivity in vacuum (F m^-1)
pub const e0: f64 = 8.8541878128e-12;
//              +/- 0.0000000013e-12

/// nuclear magneton (J T^-1)
pub const mu_N: f64 = 5.0507837461e-27;
//                +/- 0.0000000015e-27

/// TlF X(1Σ+), v = 0 rotational constant (Hz)
pub const B_ROT: f64 = 6.686667e9;

/// TlF permanent electric dipole moment (C m); 4.2282 D
pub const D_TLF: f64 = 4.2282 * 3.33564e-30;

/// Tl spin-rotation constant (Hz)
pub const C1_TL: f64 = 126.03e3;

/// F spin-rotation constant (Hz)
pub const C2_F: f64 = 17.89e3;

/// scalar Tl-F spin-spin constant (Hz)
pub const C4_SS: f64 = -13.30e3;

/// 205Tl nuclear moment over the nuclear spin, as a frequency (Hz T^-1)
pub const MU_TL: f64 = 2.0 * 1.63831 * mu_N / h;

/// 19F nuclear moment over the nuclear spin, as a frequency (Hz T^-1)
pub const MU_F: f64 = 2.0 * 2.62887 * mu_N / h;
