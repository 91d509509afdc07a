#![doc = include_str!("../README.md")]
#![cfg_attr(docrs, feature(doc_cfg))]

// private modules
mod cfg;
mod constants;
mod error;
mod frame;
mod media;
mod measurement;
mod partials;
mod participant;
mod signal;
mod time;

#[cfg(test)]
mod tests;

// prelude
pub mod prelude {
    pub use crate::cfg::{EpochTag, LightTimeOpts, MeasurementConfig, MeasurementKind, UplinkBand};
    pub use crate::constants::SPEED_OF_LIGHT_KM_S;
    pub use crate::error::Error;
    pub use crate::frame::{
        BodyRotation, FrameManager, LegEnd, ObservationFrame, ParticipantFrame, Rotation,
        RotationScope,
    };
    pub use crate::measurement::{
        AzEl, Doppler, DsnDoppler, DsnRange, Geometry, MeasurementRecord, Observable,
        ObservableModel, RaDec, Range, RangeRate, Sensitivity, TrackingMeasurement,
        INFEASIBLE_MEASUREMENT,
    };
    pub use crate::media::{
        IonosphereModel, MediaCorrection, MediaDelay, MediaModel, MediaRuntime, TroposphereModel,
    };
    pub use crate::partials::{DerivativeMatrix, SolveFor, SolveForKind};
    pub use crate::participant::{
        origin_correction, CommonOrigin, GroundStation, LayoutElement, OriginSource, Participant,
        ParticipantId, ParticipantKind, ParticipantState, Propagator, RawState, Spacecraft,
        StateAccessor, StateLayout, StmElement,
    };
    pub use crate::signal::{EndpointSelector, SignalLeg, SignalPath};
    pub use crate::time::TimeTag;
    // re-export
    pub use hifitime::{Duration, Epoch, TimeScale, Unit};
    pub use nalgebra::{DMatrix, DVector, Matrix3, Vector3, Vector6};
}

// pub export
pub use error::Error;
