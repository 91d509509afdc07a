use std::sync::Arc;

use itertools::Itertools;
use log::{debug, trace, warn};
use nalgebra::DMatrix;

use crate::{
    cfg::{EpochTag, LightTimeOpts, MeasurementConfig},
    frame::LegEnd,
    media::{MediaCorrection, MediaModel},
    participant::{ParticipantId, StateAccessor},
    prelude::{Epoch, Error},
    signal::{EndpointSelector, SignalLeg, NO_STATION_FEASIBILITY_DEG},
    time::TimeTag,
};

/// [SignalPath] is the ordered chain of [SignalLeg]s a signal
/// follows, from the first transmitter to the last receiver.
/// Resolving a path at an epoch solves the light time of every leg.
#[derive(Debug, Clone)]
pub struct SignalPath {
    legs: Vec<SignalLeg>,
    light_time: LightTimeOpts,
    epoch_tag: EpochTag,
    relative_stm: bool,
    central_body_radius_km: Option<f64>,
    media: Option<Arc<dyn MediaCorrection>>,
    frequency_hz: f64,
    resolved_at: Option<TimeTag>,
    reference_at: Option<TimeTag>,
}

impl std::fmt::Display for SignalPath {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if let Some(first) = self.legs.first() {
            write!(f, "{}", first.transmitter_name())?;
        }
        for leg in self.legs.iter() {
            write!(f, " -> {}", leg.receiver_name())?;
        }
        Ok(())
    }
}

impl SignalPath {
    /// Builds a new [SignalPath] through these participants (in signal order),
    /// with default options.
    pub fn new(accessor: &StateAccessor, participants: &[&str]) -> Result<Self, Error> {
        if participants.len() < 2 {
            return Err(Error::NotEnoughParticipants);
        }

        let ids = participants
            .iter()
            .map(|name| accessor.id(name))
            .collect::<Result<Vec<_>, _>>()?;

        let t = TimeTag::new(Epoch::from_tai_seconds(0.0));

        let legs = ids
            .iter()
            .tuple_windows()
            .enumerate()
            .map(|(index, (tx, rx))| SignalLeg::new(accessor, index, *tx, *rx, t))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            legs,
            light_time: LightTimeOpts::default(),
            epoch_tag: EpochTag::default(),
            relative_stm: false,
            central_body_radius_km: None,
            media: None,
            frequency_hz: 0.0,
            resolved_at: None,
            reference_at: None,
        })
    }

    /// Builds a new [SignalPath] from a [MeasurementConfig].
    pub fn from_config(accessor: &StateAccessor, cfg: &MeasurementConfig) -> Result<Self, Error> {
        cfg.validate()?;

        let participants = cfg
            .participants
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>();

        let mut path = Self::new(accessor, &participants)?;
        path.light_time = cfg.light_time;
        path.epoch_tag = cfg.epoch_tag;
        path.relative_stm = cfg.relative_stm;
        path.central_body_radius_km = cfg.central_body_radius_km;
        if cfg.media != MediaModel::None {
            let media: Arc<dyn MediaCorrection> = Arc::new(cfg.media);
            path.media = Some(media);
        }
        path.frequency_hz = cfg.uplink_frequency_hz;
        Ok(path)
    }

    /// Copies and returns with updated [LightTimeOpts].
    pub fn with_light_time(mut self, light_time: LightTimeOpts) -> Self {
        self.light_time = light_time;
        self.resolved_at = None;
        self
    }

    /// Copies and returns with updated [EpochTag].
    pub fn with_epoch_tag(mut self, tag: EpochTag) -> Self {
        self.epoch_tag = tag;
        self.resolved_at = None;
        self
    }

    /// Copies and returns with relative state transition matrices.
    pub fn with_relative_stm(mut self, relative: bool) -> Self {
        self.relative_stm = relative;
        self.resolved_at = None;
        self
    }

    /// Copies and returns with this media correction service.
    pub fn with_media(mut self, media: Arc<dyn MediaCorrection>) -> Self {
        self.media = Some(media);
        self.resolved_at = None;
        self
    }

    pub fn legs(&self) -> &[SignalLeg] {
        &self.legs
    }

    pub fn leg(&self, index: usize) -> Option<&SignalLeg> {
        self.legs.get(index)
    }

    /// Leg preceding this one.
    pub fn previous(&self, index: usize) -> Option<&SignalLeg> {
        self.legs.get(index.checked_sub(1)?)
    }

    /// Leg following this one.
    pub fn next(&self, index: usize) -> Option<&SignalLeg> {
        self.legs.get(index + 1)
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    pub fn epoch_tag(&self) -> EpochTag {
        self.epoch_tag
    }

    /// Epoch this path was last resolved at.
    pub fn resolved_at(&self) -> Option<TimeTag> {
        self.resolved_at
    }

    /// True when the signal starts and ends on the same participant.
    pub fn is_round_trip(&self) -> bool {
        match (self.legs.first(), self.legs.last()) {
            (Some(first), Some(last)) => self.legs.len() > 1 && first.transmitter == last.receiver,
            _ => false,
        }
    }

    /// All participants, in order of first appearance.
    pub fn participants(&self) -> Vec<ParticipantId> {
        self.legs
            .iter()
            .flat_map(|leg| [leg.transmitter, leg.receiver])
            .unique()
            .collect()
    }

    /// True when this participant takes part in the path.
    pub fn involves(&self, id: ParticipantId) -> bool {
        self.legs
            .iter()
            .any(|leg| leg.transmitter == id || leg.receiver == id)
    }

    /// Leg and end a ground station observes from: the final receiver,
    /// otherwise the first transmitter.
    pub fn observing_end(&self) -> Option<(usize, LegEnd)> {
        let last = self.legs.len().checked_sub(1)?;
        if self.legs[last].is_station(LegEnd::Receive) {
            Some((last, LegEnd::Receive))
        } else if self.legs[0].is_station(LegEnd::Transmit) {
            Some((0, LegEnd::Transmit))
        } else {
            None
        }
    }

    /// Forgets the last resolution.
    pub fn invalidate(&mut self) {
        self.resolved_at = None;
        self.reference_at = None;
        for leg in self.legs.iter_mut() {
            leg.invalidate();
        }
    }

    /// Moves selected end(s) of a leg to this instant.
    /// This invalidates any previous resolution.
    pub fn move_to_epoch(
        &mut self,
        accessor: &mut StateAccessor,
        leg: usize,
        t: &TimeTag,
        selector: EndpointSelector,
    ) -> Result<(), Error> {
        self.invalidate();
        match self.legs.get_mut(leg) {
            Some(leg) => leg.move_to_epoch(accessor, t, selector),
            None => Err(Error::InvalidLeg(leg)),
        }
    }

    /// Resolves every leg of this path, for this measurement epoch.
    /// Resolving twice at the same epoch is a no-op.
    pub fn resolve(&mut self, accessor: &mut StateAccessor, epoch: &TimeTag) -> Result<(), Error> {
        self.resolve_with_reference(accessor, epoch, epoch)
    }

    /// Resolves every leg of this path, for this measurement epoch.
    /// Relative state transition matrices, when enabled, are expressed
    /// with respect to `reference` instead of `epoch`.
    pub fn resolve_with_reference(
        &mut self,
        accessor: &mut StateAccessor,
        epoch: &TimeTag,
        reference: &TimeTag,
    ) -> Result<(), Error> {
        if self.resolved_at.as_ref() == Some(epoch) && self.reference_at.as_ref() == Some(reference)
        {
            trace!("{} - already resolved at {}", self, epoch);
            return Ok(());
        }

        self.invalidate();

        let inverses = if self.relative_stm {
            self.reference_stms(accessor, reference)?
        } else {
            Vec::new()
        };

        match self.epoch_tag {
            EpochTag::AtReceive => {
                let last = &self.legs[self.legs.len() - 1];
                let delay_s = accessor.participant(last.receiver)?.hardware_delay_s;
                let mut anchor = epoch.shifted(-delay_s);

                for leg in self.legs.iter_mut().rev() {
                    leg.solve_light_time(accessor, &anchor, LegEnd::Receive, &self.light_time)?;
                    let delay_s = accessor.participant(leg.transmitter)?.hardware_delay_s;
                    anchor = leg.transmit.t.shifted(-delay_s);
                }
            },
            EpochTag::AtTransmit => {
                let first = &self.legs[0];
                let delay_s = accessor.participant(first.transmitter)?.hardware_delay_s;
                let mut anchor = epoch.shifted(delay_s);

                for leg in self.legs.iter_mut() {
                    leg.solve_light_time(accessor, &anchor, LegEnd::Transmit, &self.light_time)?;
                    let delay_s = accessor.participant(leg.receiver)?.hardware_delay_s;
                    anchor = leg.receive.t.shifted(delay_s);
                }
            },
        }

        for leg in self.legs.iter_mut() {
            for end in [LegEnd::Transmit, LegEnd::Receive] {
                let id = leg.participant(end);
                if let Some((_, inverse)) = inverses.iter().find(|(ref_id, _)| *ref_id == id) {
                    let state = leg.state_mut(end);
                    if state.stm.ncols() != inverse.nrows() {
                        return Err(Error::StmDimension);
                    }
                    state.stm = &state.stm * inverse;
                }
            }

            leg.update_feasibility(accessor, self.central_body_radius_km)?;
            leg.update_media(self.media.as_deref(), self.frequency_hz);

            if !leg.feasible {
                warn!(
                    "leg #{} ({} -> {}) - signal blocked (elevation {:.3}°)",
                    leg.index, leg.transmitter_name, leg.receiver_name, leg.feasibility_value
                );
            }
        }

        debug!(
            "{} - resolved at {} (feasible: {})",
            self,
            epoch,
            self.is_feasible()
        );

        self.resolved_at = Some(*epoch);
        self.reference_at = Some(*reference);
        Ok(())
    }

    /// Inverse of each participant's STM at the reference epoch.
    fn reference_stms(
        &self,
        accessor: &mut StateAccessor,
        epoch: &TimeTag,
    ) -> Result<Vec<(ParticipantId, DMatrix<f64>)>, Error> {
        let mut reference = Vec::with_capacity(4);
        for id in self.participants() {
            let state = accessor.resolve(id, epoch)?;
            let inverse = state.stm.try_inverse().ok_or(Error::SingularStm)?;
            reference.push((id, inverse));
        }
        Ok(reference)
    }

    /// True when every leg is feasible.
    pub fn is_feasible(&self) -> bool {
        self.legs.iter().all(|leg| leg.feasible)
    }

    /// Elevation seen from the observing station (deg).
    pub fn feasibility_value(&self) -> f64 {
        match self.observing_end() {
            Some((index, _)) => self.legs[index].feasibility_value,
            None => self
                .legs
                .iter()
                .find(|leg| leg.station_end().is_some())
                .map(|leg| leg.feasibility_value)
                .unwrap_or(NO_STATION_FEASIBILITY_DEG),
        }
    }

    /// Elapsed time from first transmission to last reception (s).
    pub fn light_time_s(&self) -> f64 {
        match (self.legs.first(), self.legs.last()) {
            (Some(first), Some(last)) => last.receive.t.seconds_since(&first.transmit.t),
            _ => 0.0,
        }
    }
}
