use std::f64::consts::TAU;

use nalgebra::{Matrix3, Vector3};

use crate::{
    constants::{EARTH_ANGULAR_VEL_RAD, EARTH_ROTATION_ANGLE_J2000_REV},
    prelude::Epoch,
    time::TimeTag,
};

#[cfg(feature = "serde")]
use serde::Deserialize;

/// Uniform rotation of a body fixed frame about the inertial Z axis.
/// This is what ground stations are attached to.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct BodyRotation {
    /// Reference [Epoch] of the rotation angle
    pub reference: Epoch,
    /// Rotation angle at reference [Epoch] (rad)
    pub angle_at_reference_rad: f64,
    /// Angular velocity (rad/s)
    pub rate_rad_s: f64,
}

impl Default for BodyRotation {
    fn default() -> Self {
        Self::earth()
    }
}

impl BodyRotation {
    /// Earth rotation, from the Earth Rotation Angle at J2000.
    pub fn earth() -> Self {
        Self {
            reference: Epoch::from_gregorian_utc_at_noon(2000, 1, 1),
            angle_at_reference_rad: EARTH_ROTATION_ANGLE_J2000_REV * TAU,
            rate_rad_s: EARTH_ANGULAR_VEL_RAD,
        }
    }

    /// Body frame that does not rotate with respect to the inertial frame
    /// (fixed angular offset only).
    pub fn fixed(angle_rad: f64) -> Self {
        Self {
            reference: Epoch::from_gregorian_utc_at_noon(2000, 1, 1),
            angle_at_reference_rad: angle_rad,
            rate_rad_s: 0.0,
        }
    }

    /// Rotation angle at this instant (rad), within [0, 2π[.
    pub fn angle_rad(&self, t: &TimeTag) -> f64 {
        let dt_s = t.seconds_since(&TimeTag::new(self.reference));
        (self.angle_at_reference_rad + self.rate_rad_s * dt_s).rem_euclid(TAU)
    }

    /// Body fixed to inertial rotation matrix and its time derivative.
    pub fn inertial_from_body(&self, t: &TimeTag) -> (Matrix3<f64>, Matrix3<f64>) {
        let theta = self.angle_rad(t);
        let (s, c) = theta.sin_cos();

        let rot = Matrix3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0);

        let w = self.rate_rad_s;
        let rot_dot = Matrix3::new(-s * w, -c * w, 0.0, c * w, -s * w, 0.0, 0.0, 0.0, 0.0);

        (rot, rot_dot)
    }

    /// Angular velocity vector, expressed in the inertial frame.
    pub fn angular_velocity(&self) -> Vector3<f64> {
        Vector3::new(0.0, 0.0, self.rate_rad_s)
    }
}
