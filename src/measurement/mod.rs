//! Tracking measurements
use std::sync::Arc;

use log::{debug, warn};

use crate::{
    cfg::{MeasurementConfig, MeasurementKind, UplinkBand},
    media::MediaCorrection,
    partials::{partials, DerivativeMatrix, SolveFor},
    participant::StateAccessor,
    prelude::{Epoch, Error},
    signal::SignalPath,
    time::TimeTag,
};

#[cfg(feature = "serde")]
use serde::Serialize;

mod angles;
mod observable;
mod range;
mod rate;

pub use angles::{AzEl, RaDec};
pub use observable::{Geometry, Observable, ObservableModel, Sensitivity};
pub use range::{DsnRange, Range};
pub use rate::{Doppler, DsnDoppler, RangeRate};

/// Value reported for measurements whose signal could not make it through.
pub const INFEASIBLE_MEASUREMENT: f64 = -1.0E12;

/// Evaluated measurement.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct MeasurementRecord {
    /// Measurement [Epoch]
    pub epoch: Epoch,
    pub kind: MeasurementKind,
    /// Participants, in signal order
    pub participants: Vec<String>,
    /// Observable value(s), or [INFEASIBLE_MEASUREMENT]
    pub values: Vec<f64>,
    pub feasible: bool,
    /// Elevation seen from the observing station (deg)
    pub feasibility_value: f64,
    /// Uplink band (DSN range & Doppler types)
    pub uplink_band: Option<UplinkBand>,
    /// Uplink frequency (Hz), Doppler types and DSN range
    pub uplink_frequency_hz: Option<f64>,
    /// DSN Doppler count interval (s)
    pub count_interval_s: Option<f64>,
    /// DSN range modulus (RU)
    pub range_modulus: Option<f64>,
}

/// [TrackingMeasurement] binds an [Observable] to the [SignalPath]
/// its signal follows.
#[derive(Debug, Clone)]
pub struct TrackingMeasurement {
    cfg: MeasurementConfig,
    observable: ObservableModel,
    path: SignalPath,
    /// Path ending at the start of the count interval
    start: Option<SignalPath>,
}

impl TrackingMeasurement {
    /// Builds a new [TrackingMeasurement]. Configuration errors
    /// are reported here, before any evaluation.
    pub fn new(accessor: &StateAccessor, cfg: &MeasurementConfig) -> Result<Self, Error> {
        let observable = ObservableModel::from_config(cfg)?;
        let path = SignalPath::from_config(accessor, cfg)?;

        if observable.kind().is_topocentric() && path.observing_end().is_none() {
            return Err(Error::NoTopocentricFrame);
        }

        let start = observable.count_interval_s().map(|_| path.clone());

        debug!("{} - new {} measurement", path, observable.kind());

        Ok(Self {
            cfg: cfg.clone(),
            observable,
            path,
            start,
        })
    }

    /// Copies and returns with this media correction service,
    /// replacing the configured [crate::prelude::MediaModel].
    pub fn with_media(mut self, media: Arc<dyn MediaCorrection>) -> Self {
        self.path = self.path.with_media(Arc::clone(&media));
        self.start = self.start.map(|start| start.with_media(media));
        self
    }

    pub fn kind(&self) -> MeasurementKind {
        self.observable.kind()
    }

    pub fn observable(&self) -> &ObservableModel {
        &self.observable
    }

    pub fn path(&self) -> &SignalPath {
        &self.path
    }

    /// Path ending at the start of the count interval (DSN Doppler only).
    pub fn start_path(&self) -> Option<&SignalPath> {
        self.start.as_ref()
    }

    /// Resolves the signal path(s) for this measurement instant.
    /// Does nothing if already resolved at this very instant.
    /// Both paths share the measurement instant as STM reference.
    pub fn resolve(&mut self, accessor: &mut StateAccessor, t: &TimeTag) -> Result<(), Error> {
        self.path.resolve(accessor, t)?;

        if let (Some(start), Some(interval_s)) =
            (self.start.as_mut(), self.observable.count_interval_s())
        {
            start.resolve_with_reference(accessor, &t.shifted(-interval_s), t)?;
        }

        Ok(())
    }

    fn is_feasible(&self) -> bool {
        self.path.is_feasible() && self.start.as_ref().map_or(true, |start| start.is_feasible())
    }

    fn geometry(&self) -> Geometry<'_> {
        Geometry {
            path: &self.path,
            start: self.start.as_ref(),
        }
    }

    /// Evaluates this measurement at this [Epoch].
    pub fn evaluate(
        &mut self,
        accessor: &mut StateAccessor,
        epoch: Epoch,
    ) -> Result<MeasurementRecord, Error> {
        self.evaluate_at(accessor, &TimeTag::new(epoch))
    }

    /// Evaluates this measurement at this precise instant.
    /// The signal path is resolved if need be.
    pub fn evaluate_at(
        &mut self,
        accessor: &mut StateAccessor,
        t: &TimeTag,
    ) -> Result<MeasurementRecord, Error> {
        self.resolve(accessor, t)?;

        let feasible = self.is_feasible();
        let dimension = self.observable.dimension();

        let values = if feasible {
            self.observable.evaluate(&self.geometry())?
        } else {
            warn!("{} - infeasible at {}", self.path, t);
            vec![INFEASIBLE_MEASUREMENT; dimension]
        };

        let kind = self.kind();

        let (uplink_band, uplink_frequency_hz) = match kind {
            MeasurementKind::Doppler | MeasurementKind::DsnRange | MeasurementKind::DsnDoppler => {
                (Some(self.cfg.uplink_band), Some(self.cfg.uplink_frequency_hz))
            },
            _ => (None, None),
        };

        Ok(MeasurementRecord {
            epoch: t.epoch(),
            kind,
            participants: self.cfg.participants.clone(),
            values,
            feasible,
            feasibility_value: self.path.feasibility_value(),
            uplink_band,
            uplink_frequency_hz,
            count_interval_s: self.observable.count_interval_s(),
            range_modulus: match kind {
                MeasurementKind::DsnRange => Some(self.cfg.range_modulus),
                _ => None,
            },
        })
    }

    /// Partial derivatives of this measurement at this [Epoch],
    /// with respect to this [SolveFor].
    pub fn partials(
        &mut self,
        accessor: &mut StateAccessor,
        epoch: Epoch,
        solve_for: &SolveFor,
    ) -> Result<DerivativeMatrix, Error> {
        self.partials_at(accessor, &TimeTag::new(epoch), solve_for)
    }

    /// Partial derivatives at this precise instant. This reuses
    /// the resolved geometry, if any.
    pub fn partials_at(
        &mut self,
        accessor: &mut StateAccessor,
        t: &TimeTag,
        solve_for: &SolveFor,
    ) -> Result<DerivativeMatrix, Error> {
        self.resolve(accessor, t)?;

        let geometry = self.geometry();
        let sensitivity = self.observable.sensitivity(&geometry)?;

        partials(
            geometry.path,
            geometry.start,
            &sensitivity,
            self.observable.dimension(),
            solve_for,
        )
    }
}
