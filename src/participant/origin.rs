use nalgebra::Vector6;

use crate::{participant::RawState, time::TimeTag};

/// Any ephemeris provider should implement the [OriginSource] trait
/// to locate coordinate origins (central bodies) in the common inertial frame.
///
/// Participants report their states relative to their own origin,
/// while propagators may integrate about another body (force origin).
/// Both are reconciled through this trait.
pub trait OriginSource {
    /// Provide the inertial state (km, km/s) of the named origin at requested instant.
    /// Returning None aborts the evaluation with [crate::prelude::Error::UnknownOrigin].
    fn origin_state(&self, origin: &str, t: &TimeTag) -> Option<Vector6<f64>>;
}

/// [OriginSource] where all origins coincide with the inertial origin.
/// This is the default of a [crate::prelude::StateAccessor].
#[derive(Debug, Default, Copy, Clone)]
pub struct CommonOrigin;

impl OriginSource for CommonOrigin {
    fn origin_state(&self, _: &str, _: &TimeTag) -> Option<Vector6<f64>> {
        Some(Vector6::zeros())
    }
}

/// Expresses a state integrated about the force origin,
/// relative to the participant's coordinate origin.
pub fn origin_correction(
    raw: &RawState,
    force_origin: &Vector6<f64>,
    coordinate_origin: &Vector6<f64>,
) -> RawState {
    let dx = force_origin - coordinate_origin;
    RawState {
        position: raw.position + dx.fixed_rows::<3>(0),
        velocity: raw.velocity + dx.fixed_rows::<3>(3),
        stm: raw.stm.clone(),
    }
}
