//! Field-model properties: shape invariance, beam normalization, and
//! polarization normalization.

use ndarray as nd;
use num_complex::Complex64 as C64;
use state_prep::{
    fields::VectorField,
    microwave::{ IntensityProfile, Polarization },
    units,
};

#[test]
fn uniform_field_shape_invariance() {
    let b = VectorField::Uniform([1e-6, -2e-6, 3e-6]);
    let single = b.at([0.1, -0.2, 0.3]);
    let batch: nd::Array2<f64>
        = b.at_many(&nd::array![
            [0.1, -0.2, 0.3],
            [0.0, 0.0, 0.0],
            [-5.0, 2.0, 7.5],
        ]);
    for row in batch.rows() {
        assert_eq!([row[0], row[1], row[2]], single);
    }
}

#[test]
fn gaussian_beam_integrates_to_power() {
    let power: f64 = 2.5e-6;
    let sigma: f64 = 0.01;
    let beam = IntensityProfile::gaussian_beam(
        power, sigma, [0.0, 0.0, 1.0], [0.0; 3]).unwrap();
    // transverse integral over +/- 8 sigma
    let half: f64 = 8.0 * sigma;
    let n: usize = 400;
    let step: f64 = 2.0 * half / n as f64;
    let mut integral: f64 = 0.0;
    for i in 0..n {
        for j in 0..n {
            let x = -half + (i as f64 + 0.5) * step;
            let y = -half + (j as f64 + 0.5) * step;
            integral += beam.intensity_at([x, y, 0.0]) * step * step;
        }
    }
    assert!((integral - power).abs() < 0.01 * power);
}

#[test]
fn gaussian_beam_transverse_only() {
    let beam = IntensityProfile::gaussian_beam(
        1e-6, 0.01, [0.0, 0.0, 1.0], [0.0; 3]).unwrap();
    // no variation along the propagation axis
    let i0 = beam.intensity_at([0.005, -0.002, 0.0]);
    let i1 = beam.intensity_at([0.005, -0.002, 17.3]);
    assert!((i0 - i1).abs() < 1e-15 * i0);
}

#[test]
fn amplitude_conversion() {
    let beam = IntensityProfile::uniform(3.7e-3, (-1.0, 1.0)).unwrap();
    let r = [0.0, 0.0, 0.5];
    let e_amp = beam.field_amplitude_at(r);
    let expected
        = 2.0 * beam.intensity_at(r) / (units::c * units::e0);
    assert!((e_amp.powi(2) - expected).abs() < 1e-12 * expected);
}

#[test]
fn polarization_unit_norm() {
    let pol
        = Polarization::linear([0.0, 0.0, 1.0], [1.0, 0.0, 0.0]).unwrap();
    let p = pol.p_at([0.0; 3]);
    let norm: f64 = p.iter().map(|pk| pk.norm_sqr()).sum();
    assert!((norm - 1.0).abs() < 1e-12);

    // the longitudinal component keeps the vector normalized
    let pol_long = Polarization::new(
        [C64::from(0.0), C64::from(0.0), C64::from(1.0)],
        [1.0, 0.0, 0.0],
        0.3,
    ).unwrap();
    let p_long = pol_long.p_at([0.0; 3]);
    let norm_long: f64 = p_long.iter().map(|pk| pk.norm_sqr()).sum();
    assert!((norm_long - 1.0).abs() < 1e-12);
    assert!(p_long[0].im.abs() > 0.0);
}
