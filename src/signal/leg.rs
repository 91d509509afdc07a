use log::{debug, error, trace};
use nalgebra::{DMatrix, Vector3, Vector6};

use crate::{
    cfg::LightTimeOpts,
    constants::{MIN_RANGE_KM, SPEED_OF_LIGHT_KM_S},
    frame::{FrameManager, LegEnd, ObservationFrame, RotationScope},
    media::{MediaCorrection, MediaDelay, MediaRuntime},
    participant::{ParticipantId, ParticipantState, StateAccessor},
    prelude::Error,
    time::TimeTag,
};

/// Selects which end(s) of a [SignalLeg] to move.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EndpointSelector {
    Transmit,
    Receive,
    Both,
}

impl EndpointSelector {
    fn includes(&self, end: LegEnd) -> bool {
        match self {
            Self::Both => true,
            Self::Transmit => end == LegEnd::Transmit,
            Self::Receive => end == LegEnd::Receive,
        }
    }
}

impl From<LegEnd> for EndpointSelector {
    fn from(end: LegEnd) -> Self {
        match end {
            LegEnd::Transmit => Self::Transmit,
            LegEnd::Receive => Self::Receive,
        }
    }
}

/// Feasibility value reported when no ground station is involved (deg).
pub const NO_STATION_FEASIBILITY_DEG: f64 = 90.0;

/// [SignalLeg] is a single transmitter to receiver hop.
#[derive(Debug, Clone)]
pub struct SignalLeg {
    /// Leg index, within its path
    pub index: usize,
    pub transmitter: ParticipantId,
    pub receiver: ParticipantId,
    pub(crate) transmitter_name: String,
    pub(crate) receiver_name: String,
    transmitter_is_station: bool,
    receiver_is_station: bool,
    /// Transmitter state, at transmission time
    pub transmit: ParticipantState,
    /// Receiver state, at reception time
    pub receive: ParticipantState,
    /// Inertial range vector, transmitter to receiver (km)
    pub range_km: Vector3<f64>,
    /// Inertial range rate vector (km/s)
    pub range_rate_km_s: Vector3<f64>,
    /// Range vector, in the observation frame (km)
    pub range_obs_km: Vector3<f64>,
    /// Range rate vector, in the observation frame (km/s)
    pub range_rate_obs_km_s: Vector3<f64>,
    /// True when the signal can make it through
    pub feasible: bool,
    /// Station elevation (deg)
    pub feasibility_value: f64,
    /// Propagation media delay
    pub media: MediaDelay,
    /// Light time iterations it took to converge
    pub iterations: usize,
    pub frames: FrameManager,
    resolved: bool,
}

fn empty_state(t: TimeTag) -> ParticipantState {
    ParticipantState {
        t,
        position: Vector3::zeros(),
        velocity: Vector3::zeros(),
        stm: DMatrix::identity(6, 6),
        origin: Vector6::zeros(),
    }
}

impl SignalLeg {
    /// Builds a new [SignalLeg] between two registered participants.
    /// The observation frame is the topocentric frame of the receiver
    /// if it is a ground station, otherwise that of the transmitter,
    /// otherwise the inertial frame.
    pub fn new(
        accessor: &StateAccessor,
        index: usize,
        transmitter: ParticipantId,
        receiver: ParticipantId,
        t: TimeTag,
    ) -> Result<Self, Error> {
        let tx = accessor.participant(transmitter)?;
        let rx = accessor.participant(receiver)?;

        if transmitter == receiver {
            return Err(Error::RepeatedParticipant(tx.name.clone()));
        }

        tx.check_configuration()?;
        rx.check_configuration()?;

        let observation = if let Some(station) = rx.as_ground_station() {
            ObservationFrame::topocentric(
                LegEnd::Receive,
                station.body,
                station.latitude_deg,
                station.longitude_deg,
            )
        } else if let Some(station) = tx.as_ground_station() {
            ObservationFrame::topocentric(
                LegEnd::Transmit,
                station.body,
                station.latitude_deg,
                station.longitude_deg,
            )
        } else {
            ObservationFrame::Inertial
        };

        Ok(Self {
            index,
            transmitter,
            receiver,
            transmitter_name: tx.name.clone(),
            receiver_name: rx.name.clone(),
            transmitter_is_station: tx.is_ground_station(),
            receiver_is_station: rx.is_ground_station(),
            transmit: empty_state(t),
            receive: empty_state(t),
            range_km: Vector3::zeros(),
            range_rate_km_s: Vector3::zeros(),
            range_obs_km: Vector3::zeros(),
            range_rate_obs_km_s: Vector3::zeros(),
            feasible: false,
            feasibility_value: 0.0,
            media: MediaDelay::default(),
            iterations: 0,
            frames: FrameManager::new(tx.frame(), rx.frame(), observation),
            resolved: false,
        })
    }

    pub fn transmitter_name(&self) -> &str {
        &self.transmitter_name
    }

    pub fn receiver_name(&self) -> &str {
        &self.receiver_name
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub(crate) fn invalidate(&mut self) {
        self.resolved = false;
    }

    /// Participant on this end.
    pub fn participant(&self, end: LegEnd) -> ParticipantId {
        match end {
            LegEnd::Transmit => self.transmitter,
            LegEnd::Receive => self.receiver,
        }
    }

    /// State on this end.
    pub fn state(&self, end: LegEnd) -> &ParticipantState {
        match end {
            LegEnd::Transmit => &self.transmit,
            LegEnd::Receive => &self.receive,
        }
    }

    pub(crate) fn state_mut(&mut self, end: LegEnd) -> &mut ParticipantState {
        match end {
            LegEnd::Transmit => &mut self.transmit,
            LegEnd::Receive => &mut self.receive,
        }
    }

    /// True when a ground station sits on this end.
    pub fn is_station(&self, end: LegEnd) -> bool {
        match end {
            LegEnd::Transmit => self.transmitter_is_station,
            LegEnd::Receive => self.receiver_is_station,
        }
    }

    /// Ground station end, if any. Receiver comes first.
    pub fn station_end(&self) -> Option<LegEnd> {
        self.frames.observation_frame().station_end()
    }

    /// Range (km)
    pub fn range(&self) -> f64 {
        self.range_km.norm()
    }

    /// Elapsed time between transmission and reception (s)
    pub fn light_time_s(&self) -> f64 {
        self.receive.t.seconds_since(&self.transmit.t)
    }

    /// Moves selected end(s) to this instant: the leg is no longer resolved.
    /// Geometry is refreshed accordingly.
    pub fn move_to_epoch(
        &mut self,
        accessor: &mut StateAccessor,
        t: &TimeTag,
        selector: EndpointSelector,
    ) -> Result<(), Error> {
        for end in [LegEnd::Transmit, LegEnd::Receive] {
            if selector.includes(end) {
                let id = self.participant(end);
                *self.state_mut(end) = accessor.resolve(id, t)?;
            }
        }
        self.resolved = false;
        self.update_geometry();
        Ok(())
    }

    /// Solves the light time, with `anchored` end held at `anchor`.
    pub fn solve_light_time(
        &mut self,
        accessor: &mut StateAccessor,
        anchor: &TimeTag,
        anchored: LegEnd,
        opts: &LightTimeOpts,
    ) -> Result<(), Error> {
        self.move_to_epoch(accessor, anchor, EndpointSelector::Both)?;
        self.iterations = 0;

        if !opts.enabled {
            self.resolved = true;
            return Ok(());
        }

        let free = match anchored {
            LegEnd::Receive => LegEnd::Transmit,
            LegEnd::Transmit => LegEnd::Receive,
        };

        let sign = match free {
            LegEnd::Transmit => -1.0,
            LegEnd::Receive => 1.0,
        };

        let mut dt_s = self.range() / SPEED_OF_LIGHT_KM_S;

        loop {
            let t = anchor.shifted(sign * dt_s);
            self.move_to_epoch(accessor, &t, free.into())?;
            self.iterations += 1;

            let light_time_s = self.range() / SPEED_OF_LIGHT_KM_S;
            let residual_s = (light_time_s - dt_s).abs();

            trace!(
                "leg #{} - iteration {}: dt={:.15E}s residual={:.3E}s",
                self.index,
                self.iterations,
                light_time_s,
                residual_s
            );

            if residual_s <= opts.tolerance_s {
                break;
            }

            if self.iterations >= opts.max_iterations {
                error!(
                    "leg #{} ({} -> {}) - light time did not converge (residual {:.3E}s)",
                    self.index, self.transmitter_name, self.receiver_name, residual_s
                );
                return Err(Error::LightTimeNonConvergence {
                    leg: self.index,
                    iterations: self.iterations,
                    residual_s,
                });
            }

            dt_s = light_time_s;
        }

        debug!(
            "leg #{} ({} -> {}) - light time {:.15E}s ({} iterations)",
            self.index,
            self.transmitter_name,
            self.receiver_name,
            self.light_time_s(),
            self.iterations
        );

        self.resolved = true;
        Ok(())
    }

    /// Refreshes frames, range and range rate vectors from both end states.
    pub(crate) fn update_geometry(&mut self) {
        let t_tx = self.transmit.t;
        let t_rx = self.receive.t;

        self.frames.refresh(&t_tx, RotationScope::TransmitInertial);
        self.frames.refresh(&t_rx, RotationScope::ReceiveInertial);

        let t_obs = match self.station_end() {
            Some(LegEnd::Transmit) => t_tx,
            _ => t_rx,
        };

        self.frames.refresh(&t_obs, RotationScope::ObservationInertial);
        self.frames.refresh(&t_obs, RotationScope::ObservationTransmit);
        self.frames.refresh(&t_obs, RotationScope::ObservationReceive);

        let separation = self.receive.origin - self.transmit.origin;

        self.range_km =
            self.receive.position + separation.fixed_rows::<3>(0) - self.transmit.position;

        self.range_rate_km_s =
            self.receive.velocity + separation.fixed_rows::<3>(3) - self.transmit.velocity;

        let obs = self.frames.observation_from_inertial();
        self.range_obs_km = obs.matrix * self.range_km;
        self.range_rate_obs_km_s = obs.rate * self.range_km + obs.matrix * self.range_rate_km_s;
    }

    /// Line of sight, from the ground station, in its topocentric frame.
    pub fn station_line_of_sight(&self) -> Option<Vector3<f64>> {
        match self.station_end()? {
            LegEnd::Transmit => Some(self.range_obs_km),
            LegEnd::Receive => Some(-self.range_obs_km),
        }
    }

    /// Elevation seen from the ground station (deg).
    pub fn station_elevation_deg(&self) -> Option<f64> {
        let los = self.station_line_of_sight()?;
        let norm = los.norm();
        if norm < MIN_RANGE_KM {
            return None;
        }
        Some((los.z / norm).clamp(-1.0, 1.0).asin().to_degrees())
    }

    /// Evaluates feasibility: minimal range, station elevation mask
    /// and optional central body occultation.
    pub(crate) fn update_feasibility(
        &mut self,
        accessor: &StateAccessor,
        central_body_radius_km: Option<f64>,
    ) -> Result<(), Error> {
        if self.range() < MIN_RANGE_KM {
            self.feasible = false;
            self.feasibility_value = 0.0;
            return Ok(());
        }

        self.feasible = true;
        self.feasibility_value = NO_STATION_FEASIBILITY_DEG;

        if let Some(end) = self.station_end() {
            let station = accessor
                .participant(self.participant(end))?
                .as_ground_station()
                .ok_or(Error::NoTopocentricFrame)?;

            let elevation_deg = self.station_elevation_deg().unwrap_or(0.0);
            self.feasibility_value = elevation_deg;
            // grazing lines of sight do not make it through
            self.feasible = elevation_deg > station.min_elevation_deg;
        }

        if let Some(radius_km) = central_body_radius_km {
            if self.is_occulted(radius_km) {
                trace!("leg #{} - occulted by central body", self.index);
                self.feasible = false;
            }
        }

        Ok(())
    }

    /// True when the straight line path crosses a sphere of this radius
    /// centered on the receiver's coordinate origin. Endpoints are not tested.
    pub fn is_occulted(&self, radius_km: f64) -> bool {
        let rx = self.receive.position;
        let tx = rx - self.range_km;

        let range2 = self.range_km.norm_squared();
        if range2 == 0.0 {
            return false;
        }

        let s = -tx.dot(&self.range_km) / range2;
        if s <= 0.0 || s >= 1.0 {
            return false;
        }

        let closest = tx + self.range_km * s;
        closest.norm() < radius_km
    }

    /// Evaluates the propagation media delay along this leg.
    pub(crate) fn update_media(
        &mut self,
        media: Option<&dyn MediaCorrection>,
        frequency_hz: f64,
    ) {
        self.media = match media {
            Some(media) => media.delay(&MediaRuntime {
                transmitter_km: self.receive.position - self.range_km,
                receiver_km: self.receive.position,
                t: self.receive.t,
                elevation_deg: self.station_elevation_deg(),
                frequency_hz,
            }),
            None => MediaDelay::default(),
        };
    }
}
