//! Static electric- and magnetic-field models over the beamline.
//!
//! Field models are pure functions of position. Evaluation is
//! shape-polymorphic: a model queried with a batch of positions returns the
//! per-row values it would return for each position individually.

use std::sync::Arc;
use ndarray as nd;
use crate::error::FieldError;

/// Heap-allocated field model, usable from scan workers.
pub type FieldFn = Arc<dyn Fn([f64; 3]) -> [f64; 3] + Send + Sync>;

/// A static vector field over position.
#[derive(Clone)]
pub enum VectorField {
    /// Spatially uniform field.
    Uniform([f64; 3]),
    /// Tabulated axial profile: the field points along z with magnitude
    /// linearly interpolated from `(z, value)` tables, clamped to the end
    /// values outside the tabulated range.
    AxialProfile { z: nd::Array1<f64>, value: nd::Array1<f64> },
    /// Caller-supplied model.
    Function(FieldFn),
}

impl std::fmt::Debug for VectorField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uniform(v) => write!(f, "Uniform({:?})", v),
            Self::AxialProfile { z, .. }
                => write!(f, "AxialProfile({} points)", z.len()),
            Self::Function(_) => write!(f, "Function(...)"),
        }
    }
}

impl VectorField {
    /// Create a new tabulated axial profile.
    ///
    /// Fails unless the tables have equal lengths of at least 2 and the `z`
    /// table is sorted ascending.
    pub fn axial_profile(z: nd::Array1<f64>, value: nd::Array1<f64>)
        -> Result<Self, FieldError>
    {
        let sorted
            = z.iter().zip(z.iter().skip(1)).all(|(zk, zkp1)| zk < zkp1);
        if z.len() != value.len() || z.len() < 2 || !sorted {
            return Err(FieldError::BadProfile);
        }
        Ok(Self::AxialProfile { z, value })
    }

    /// Create a new caller-supplied model.
    pub fn function<F>(f: F) -> Self
    where F: Fn([f64; 3]) -> [f64; 3] + Send + Sync + 'static
    {
        Self::Function(Arc::new(f))
    }

    /// Evaluate at a single position.
    pub fn at(&self, r: [f64; 3]) -> [f64; 3] {
        match self {
            Self::Uniform(v) => *v,
            Self::AxialProfile { z, value } => {
                [0.0, 0.0, interp_clamped(z, value, r[2])]
            },
            Self::Function(f) => f(r),
        }
    }

    /// Evaluate at a batch of positions, one per row.
    pub fn at_many(&self, r: &nd::Array2<f64>) -> nd::Array2<f64> {
        let mut out: nd::Array2<f64> = nd::Array2::zeros(r.raw_dim());
        let iter = r.rows().into_iter().zip(out.rows_mut());
        for (rk, mut outk) in iter {
            let v = self.at([rk[0], rk[1], rk[2]]);
            outk[0] = v[0];
            outk[1] = v[1];
            outk[2] = v[2];
        }
        out
    }
}

/// Static electric field (V/m) over position.
pub type ElectricField = VectorField;

/// Static magnetic field (T) over position.
pub type MagneticField = VectorField;

// linear interpolation on a sorted table, clamped to end values
fn interp_clamped(x: &nd::Array1<f64>, y: &nd::Array1<f64>, x0: f64) -> f64 {
    let n = x.len();
    if x0 <= x[0] { return y[0]; }
    if x0 >= x[n - 1] { return y[n - 1]; }
    let k = x.iter().position(|xk| *xk > x0)
        .expect("interp_clamped: interior point not bracketed");
    let t = (x0 - x[k - 1]) / (x[k] - x[k - 1]);
    y[k - 1] + t * (y[k] - y[k - 1])
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn axial_interp() {
        let field
            = VectorField::axial_profile(
                nd::array![0.0, 1.0, 2.0],
                nd::array![0.0, 10.0, 0.0],
            )
            .unwrap();
        let v = field.at([5.0, -3.0, 0.5]);
        assert_eq!(v, [0.0, 0.0, 5.0]);
        // clamped outside the table
        assert_eq!(field.at([0.0, 0.0, -1.0]), [0.0, 0.0, 0.0]);
        assert_eq!(field.at([0.0, 0.0, 3.0]), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn function_model() {
        let field
            = VectorField::function(|r| [0.0, 0.0, 100.0 * r[2]]);
        assert_eq!(field.at([1.0, 2.0, 0.25]), [0.0, 0.0, 25.0]);
    }

    #[test]
    fn bad_profile() {
        assert!(matches!(
            VectorField::axial_profile(
                nd::array![0.0, 1.0],
                nd::array![0.0, 1.0, 2.0],
            ),
            Err(FieldError::BadProfile),
        ));
    }
}
