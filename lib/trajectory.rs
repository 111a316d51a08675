//! Straight-line motion of a molecule through the beamline.

use crate::error::TrajectoryError;

/// Straight-line trajectory `R(t) = R_ini + V_ini t`, terminated where the
/// molecule crosses a fixed z-plane.
///
/// Construction fails unless the termination plane is reached at a positive
/// time; `position` and `duration` are then total functions.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Trajectory {
    rini: [f64; 3],
    vini: [f64; 3],
    z_final: f64,
}

impl Trajectory {
    /// Create a new trajectory.
    ///
    /// Fails if the longitudinal velocity is zero or points away from the
    /// termination plane.
    pub fn new(rini: [f64; 3], vini: [f64; 3], z_final: f64)
        -> Result<Self, TrajectoryError>
    {
        if vini[2] == 0.0 {
            return Err(TrajectoryError::ZeroVelocity);
        }
        if (z_final - rini[2]) / vini[2] <= 0.0 {
            return Err(TrajectoryError::Unreachable {
                z0: rini[2], vz: vini[2], z_final,
            });
        }
        Ok(Self { rini, vini, z_final })
    }

    /// Return the initial position (m).
    pub fn rini(&self) -> [f64; 3] { self.rini }

    /// Return the velocity (m/s).
    pub fn vini(&self) -> [f64; 3] { self.vini }

    /// Return the position (m) at time `t` (s).
    pub fn position(&self, t: f64) -> [f64; 3] {
        [
            self.rini[0] + self.vini[0] * t,
            self.rini[1] + self.vini[1] * t,
            self.rini[2] + self.vini[2] * t,
        ]
    }

    /// Return the total transit time (s) to the termination plane.
    pub fn duration(&self) -> f64 {
        (self.z_final - self.rini[2]) / self.vini[2]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn transit() {
        let traj
            = Trajectory::new([0.0, 0.0, -0.01], [0.0, 0.0, 200.0], 0.03)
            .unwrap();
        assert!((traj.duration() - 2e-4).abs() < 1e-12);
        let r = traj.position(1e-4);
        assert!((r[2] - 0.01).abs() < 1e-12);
    }

    #[test]
    fn guards() {
        assert!(matches!(
            Trajectory::new([0.0; 3], [0.0, 0.0, 0.0], 0.1),
            Err(TrajectoryError::ZeroVelocity),
        ));
        assert!(matches!(
            Trajectory::new([0.0; 3], [0.0, 0.0, -100.0], 0.1),
            Err(TrajectoryError::Unreachable { .. }),
        ));
    }
}
