//! Numerical integration of the Schrödinger equation for pure states.
//!
//! The Hamiltonian should be in units of angular frequency; integration is
//! via fourth-order Runge-Kutta with per-step renormalization. Any routine
//! with the same signature (initial vector, `H(t)`, sampling grid in, sampled
//! state trajectory out) can stand in for these.

use ndarray::{ self as nd, s };
use num_complex::Complex64 as C64;

/// Compute a quadrature-sum norm, treating the array as a pure quantum state.
pub fn state_norm(psi: &nd::Array1<C64>) -> C64 {
    psi.mapv(|a| a * a.conj()).sum().sqrt()
}

fn rhs(h: &nd::Array2<C64>, psi: &nd::Array1<C64>) -> nd::Array1<C64> {
    -C64::i() * h.dot(psi)
}

fn array_diff(arr: &nd::Array1<f64>) -> nd::Array1<f64> {
    arr.iter().zip(arr.iter().skip(1))
        .map(|(ak, akp1)| *akp1 - *ak)
        .collect()
}

/// Numerically integrate the Schrödinger equation for a time-independent
/// Hamiltonian.
///
/// Returns the sampled state trajectory with the last axis corresponding to
/// time.
pub fn evolve(
    psi0: &nd::Array1<C64>,
    h: &nd::Array2<C64>,
    t: &nd::Array1<f64>,
) -> nd::Array2<C64>
{
    evolve_fn(psi0, |_| h.clone(), t)
}

/// Numerically integrate the Schrödinger equation for a time-dependent
/// Hamiltonian given by a function.
///
/// Returns the sampled state trajectory with the last axis corresponding to
/// time.
pub fn evolve_fn<H>(
    psi0: &nd::Array1<C64>,
    h: H,
    t: &nd::Array1<f64>,
) -> nd::Array2<C64>
where H: Fn(f64) -> nd::Array2<C64>
{
    let n = t.len();
    let dt = array_diff(t);
    let mut psi: nd::Array2<C64> = nd::Array2::zeros((psi0.len(), n));
    let mut psi_old: nd::Array1<C64> = psi0.clone();
    let mut hk: nd::Array2<C64>;
    let mut hkp1h: nd::Array2<C64>;
    let mut hkp1: nd::Array2<C64>;
    let mut k1: nd::Array1<C64>;
    let mut k2: nd::Array1<C64>;
    let mut k3: nd::Array1<C64>;
    let mut k4: nd::Array1<C64>;
    let mut psi_new: nd::Array1<C64>;
    let mut norm: C64;
    psi.slice_mut(s![.., 0]).assign(psi0);
    let iter = dt.iter().zip(t).enumerate();
    for (k, (&dtk, &tk)) in iter {
        hk = h(tk);
        hkp1h = h(tk + dtk / 2.0);
        hkp1 = h(tk + dtk);
        k1 = rhs(&hk, &psi_old);
        k2 = rhs(&hkp1h, &(&psi_old + &k1 * (dtk / 2.0)));
        k3 = rhs(&hkp1h, &(&psi_old + &k2 * (dtk / 2.0)));
        k4 = rhs(&hkp1, &(&psi_old + &k3 * dtk));
        psi_new = &psi_old + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dtk / 6.0);
        norm = state_norm(&psi_new);
        psi_old = psi_new / norm;
        psi_old.clone().move_into(psi.slice_mut(s![.., k + 1]));
    }
    psi
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn two_level_rabi() {
        // resonant two-level coupling W/2 sigma_x: P_1(t) = sin^2(W t / 2)
        let w: f64 = 1.0;
        let h: nd::Array2<C64>
            = nd::array![
                [C64::from(0.0), C64::from(w / 2.0)],
                [C64::from(w / 2.0), C64::from(0.0)],
            ];
        let psi0: nd::Array1<C64>
            = nd::array![C64::from(1.0), C64::from(0.0)];
        let t: nd::Array1<f64>
            = nd::Array1::linspace(0.0, std::f64::consts::PI / w, 1000);
        let psi = evolve(&psi0, &h, &t);
        let p1 = psi[[1, t.len() - 1]].norm_sqr();
        assert!((p1 - 1.0).abs() < 1e-6);
    }
}
