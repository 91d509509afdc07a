//! Rotations between the frames involved in a signal leg
use log::trace;
use nalgebra::Matrix3;

use crate::{prelude::Error, time::TimeTag};

mod rotation;
pub use rotation::BodyRotation;

/// One end of a signal leg.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LegEnd {
    Transmit,
    Receive,
}

impl std::fmt::Display for LegEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Transmit => write!(f, "transmit"),
            Self::Receive => write!(f, "receive"),
        }
    }
}

/// Frame a participant's coordinates are natively expressed in.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ParticipantFrame {
    /// Freely propagated body, coordinates are inertial.
    Inertial,
    /// Attached to a rotating body.
    BodyFixed(BodyRotation),
}

impl ParticipantFrame {
    /// Participant frame to inertial rotation, and its time derivative.
    pub fn inertial_from_frame(&self, t: &TimeTag) -> (Matrix3<f64>, Matrix3<f64>) {
        match self {
            Self::Inertial => (Matrix3::identity(), Matrix3::zeros()),
            Self::BodyFixed(body) => body.inertial_from_body(t),
        }
    }
}

/// Frame an observable is naturally defined in.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ObservationFrame {
    /// No ground station on this leg
    Inertial,
    /// South-East-Zenith frame of the ground station on `end`.
    Topocentric {
        end: LegEnd,
        body: BodyRotation,
        sez_from_body: Matrix3<f64>,
    },
}

impl ObservationFrame {
    /// Builds the SEZ frame of a station located at geodetic
    /// latitude and longitude (both in degrees).
    pub fn topocentric(end: LegEnd, body: BodyRotation, lat_deg: f64, long_deg: f64) -> Self {
        let (sin_lat, cos_lat) = lat_deg.to_radians().sin_cos();
        let (sin_lon, cos_lon) = long_deg.to_radians().sin_cos();

        #[rustfmt::skip]
        let sez_from_body = Matrix3::new(
            sin_lat * cos_lon, sin_lat * sin_lon, -cos_lat,
            -sin_lon,          cos_lon,           0.0,
            cos_lat * cos_lon, cos_lat * sin_lon, sin_lat,
        );

        Self::Topocentric {
            end,
            body,
            sez_from_body,
        }
    }

    /// Inertial to observation frame rotation, and its time derivative.
    pub fn observation_from_inertial(&self, t: &TimeTag) -> (Matrix3<f64>, Matrix3<f64>) {
        match self {
            Self::Inertial => (Matrix3::identity(), Matrix3::zeros()),
            Self::Topocentric {
                body,
                sez_from_body,
                ..
            } => {
                let (rot, rot_dot) = body.inertial_from_body(t);
                (
                    sez_from_body * rot.transpose(),
                    sez_from_body * rot_dot.transpose(),
                )
            },
        }
    }

    /// Station end, for topocentric frames.
    pub fn station_end(&self) -> Option<LegEnd> {
        match self {
            Self::Inertial => None,
            Self::Topocentric { end, .. } => Some(*end),
        }
    }
}

/// Set of rotations to refresh.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RotationScope {
    All,
    ReceiveInertial,
    TransmitInertial,
    ObservationReceive,
    ObservationTransmit,
    ObservationInertial,
}

impl std::str::FromStr for RotationScope {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "receive-inertial" | "j2k_2" => Ok(Self::ReceiveInertial),
            "transmit-inertial" | "j2k_1" => Ok(Self::TransmitInertial),
            "observation-receive" | "o_2" => Ok(Self::ObservationReceive),
            "observation-transmit" | "o_1" => Ok(Self::ObservationTransmit),
            "observation-inertial" | "o_j2k" => Ok(Self::ObservationInertial),
            _ => Err(Error::UnknownRotationScope(s.to_string())),
        }
    }
}

/// A cached rotation matrix, its time derivative and the instant
/// it was computed at.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rotation {
    pub matrix: Matrix3<f64>,
    pub rate: Matrix3<f64>,
    pub t: Option<TimeTag>,
}

impl Default for Rotation {
    fn default() -> Self {
        Self {
            matrix: Matrix3::identity(),
            rate: Matrix3::zeros(),
            t: None,
        }
    }
}

impl Rotation {
    fn at(t: &TimeTag, (matrix, rate): (Matrix3<f64>, Matrix3<f64>)) -> Self {
        Self {
            matrix,
            rate,
            t: Some(*t),
        }
    }

    /// True if this rotation was last computed at this instant.
    pub fn is_current(&self, t: &TimeTag) -> bool {
        self.t.as_ref() == Some(t)
    }
}

/// [FrameManager] holds the rotations between the transmit frame,
/// the receive frame, the observation frame and the inertial frame
/// of a single leg. Rotations are only ever refreshed explicitly.
/// Participant to observation rotations compose the observation frame
/// at the refresh instant with the participant rotation of that end,
/// which should be refreshed first, at that end's own instant.
#[derive(Debug, Clone)]
pub struct FrameManager {
    transmit: ParticipantFrame,
    receive: ParticipantFrame,
    observation: ObservationFrame,
    inertial_from_transmit: Rotation,
    inertial_from_receive: Rotation,
    observation_from_transmit: Rotation,
    observation_from_receive: Rotation,
    observation_from_inertial: Rotation,
}

impl FrameManager {
    pub fn new(
        transmit: ParticipantFrame,
        receive: ParticipantFrame,
        observation: ObservationFrame,
    ) -> Self {
        Self {
            transmit,
            receive,
            observation,
            inertial_from_transmit: Default::default(),
            inertial_from_receive: Default::default(),
            observation_from_transmit: Default::default(),
            observation_from_receive: Default::default(),
            observation_from_inertial: Default::default(),
        }
    }

    /// True when no rotating frame is involved on this leg.
    pub fn is_inertial(&self) -> bool {
        self.transmit == ParticipantFrame::Inertial
            && self.receive == ParticipantFrame::Inertial
            && self.observation == ObservationFrame::Inertial
    }

    pub fn observation_frame(&self) -> &ObservationFrame {
        &self.observation
    }

    /// Recomputes the rotations designated by [RotationScope], at this instant.
    pub fn refresh(&mut self, t: &TimeTag, scope: RotationScope) {
        trace!("refreshing {:?} rotations at {}", scope, t);

        if self.is_inertial() {
            // all frames are inertial: identity & zero rates
            let inertial = Rotation {
                t: Some(*t),
                ..Default::default()
            };
            self.inertial_from_transmit = inertial;
            self.inertial_from_receive = inertial;
            self.observation_from_transmit = inertial;
            self.observation_from_receive = inertial;
            self.observation_from_inertial = inertial;
            return;
        }

        let all = scope == RotationScope::All;

        if all || scope == RotationScope::TransmitInertial {
            self.inertial_from_transmit = Rotation::at(t, self.transmit.inertial_from_frame(t));
        }
        if all || scope == RotationScope::ReceiveInertial {
            self.inertial_from_receive = Rotation::at(t, self.receive.inertial_from_frame(t));
        }
        if all || scope == RotationScope::ObservationInertial {
            self.observation_from_inertial =
                Rotation::at(t, self.observation.observation_from_inertial(t));
        }
        if all || scope == RotationScope::ObservationTransmit {
            self.observation_from_transmit = Rotation::at(t, self.compose(t, LegEnd::Transmit));
        }
        if all || scope == RotationScope::ObservationReceive {
            self.observation_from_receive = Rotation::at(t, self.compose(t, LegEnd::Receive));
        }
    }

    /// Same as [Self::refresh], for configuration driven scopes.
    pub fn refresh_named(&mut self, t: &TimeTag, scope: &str) -> Result<(), Error> {
        let scope = scope.parse::<RotationScope>()?;
        self.refresh(t, scope);
        Ok(())
    }

    /// Observation frame at `t`, composed with the participant rotation of
    /// this end as last refreshed (at that end's own instant).
    fn compose(&self, t: &TimeTag, end: LegEnd) -> (Matrix3<f64>, Matrix3<f64>) {
        let (r_oi, r_oi_dot) = self.observation.observation_from_inertial(t);

        let cached = self.inertial_from(end);
        let (r_ip, r_ip_dot) = match (cached.t, end) {
            (Some(_), _) => (cached.matrix, cached.rate),
            (None, LegEnd::Transmit) => self.transmit.inertial_from_frame(t),
            (None, LegEnd::Receive) => self.receive.inertial_from_frame(t),
        };

        (r_oi * r_ip, r_oi_dot * r_ip + r_oi * r_ip_dot)
    }

    /// Participant frame to inertial rotation, for this end.
    pub fn inertial_from(&self, end: LegEnd) -> &Rotation {
        match end {
            LegEnd::Transmit => &self.inertial_from_transmit,
            LegEnd::Receive => &self.inertial_from_receive,
        }
    }

    /// Participant frame to observation frame rotation, for this end.
    pub fn observation_from(&self, end: LegEnd) -> &Rotation {
        match end {
            LegEnd::Transmit => &self.observation_from_transmit,
            LegEnd::Receive => &self.observation_from_receive,
        }
    }

    pub fn observation_from_inertial(&self) -> &Rotation {
        &self.observation_from_inertial
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::prelude::Epoch;
    use std::str::FromStr;

    fn t0() -> TimeTag {
        TimeTag::new(Epoch::from_str("2021-01-01T00:00:00 UTC").unwrap())
    }

    #[test]
    fn inertial_short_circuit() {
        let mut frames = FrameManager::new(
            ParticipantFrame::Inertial,
            ParticipantFrame::Inertial,
            ObservationFrame::Inertial,
        );

        assert!(frames.is_inertial());
        frames.refresh(&t0(), RotationScope::All);

        for end in [LegEnd::Transmit, LegEnd::Receive] {
            assert_eq!(frames.inertial_from(end).matrix, Matrix3::identity());
            assert_eq!(frames.inertial_from(end).rate, Matrix3::zeros());
            assert_eq!(frames.observation_from(end).matrix, Matrix3::identity());
            assert_eq!(frames.observation_from(end).rate, Matrix3::zeros());
            assert!(frames.inertial_from(end).is_current(&t0()));
        }

        assert_eq!(frames.observation_from_inertial().matrix, Matrix3::identity());
        assert_eq!(frames.observation_from_inertial().rate, Matrix3::zeros());
    }

    #[test]
    fn scoped_refresh() {
        let earth = BodyRotation::earth();
        let mut frames = FrameManager::new(
            ParticipantFrame::BodyFixed(earth),
            ParticipantFrame::Inertial,
            ObservationFrame::topocentric(LegEnd::Transmit, earth, 40.0, -4.0),
        );

        let t = t0();
        frames.refresh(&t, RotationScope::TransmitInertial);

        assert!(frames.inertial_from(LegEnd::Transmit).is_current(&t));
        assert!(!frames.inertial_from(LegEnd::Receive).is_current(&t));
        assert!(!frames.observation_from_inertial().is_current(&t));

        frames.refresh(&t, RotationScope::All);

        // station frame to SEZ frame does not depend on time
        let obs_tx = frames.observation_from(LegEnd::Transmit);
        for i in 0..3 {
            for j in 0..3 {
                assert!(obs_tx.rate[(i, j)].abs() < 1.0E-15);
            }
        }

        // zenith of a station on the equator & greenwich meridian
        let frame = ObservationFrame::topocentric(LegEnd::Transmit, earth, 0.0, 0.0);
        if let ObservationFrame::Topocentric { sez_from_body, .. } = frame {
            let zenith = sez_from_body * nalgebra::Vector3::new(1.0, 0.0, 0.0);
            assert!((zenith - nalgebra::Vector3::new(0.0, 0.0, 1.0)).norm() < 1.0E-15);
        } else {
            panic!("topocentric frame expected");
        }
    }

    #[test]
    fn named_scopes() {
        let mut frames = FrameManager::new(
            ParticipantFrame::Inertial,
            ParticipantFrame::Inertial,
            ObservationFrame::Inertial,
        );

        assert!(frames.refresh_named(&t0(), "all").is_ok());
        assert!(frames.refresh_named(&t0(), "o_j2k").is_ok());
        assert_eq!(
            frames.refresh_named(&t0(), "j2k_3"),
            Err(Error::UnknownRotationScope("j2k_3".to_string()))
        );
    }

    #[test]
    fn rotations_at_each_end() {
        let earth = BodyRotation::earth();
        let mut frames = FrameManager::new(
            ParticipantFrame::BodyFixed(earth),
            ParticipantFrame::BodyFixed(earth),
            ObservationFrame::topocentric(LegEnd::Receive, earth, 40.0, -4.0),
        );

        let t_rx = t0();
        let t_tx = t_rx.shifted(-60.0);

        frames.refresh(&t_tx, RotationScope::TransmitInertial);
        frames.refresh(&t_rx, RotationScope::ReceiveInertial);
        frames.refresh(&t_rx, RotationScope::ObservationInertial);
        frames.refresh(&t_rx, RotationScope::ObservationTransmit);
        frames.refresh(&t_rx, RotationScope::ObservationReceive);

        let (r_oi, _) = frames.observation_frame().observation_from_inertial(&t_rx);
        let (r_tx, _) = earth.inertial_from_body(&t_tx);
        let (r_rx, _) = earth.inertial_from_body(&t_rx);

        let obs_tx = frames.observation_from(LegEnd::Transmit).matrix;
        let obs_rx = frames.observation_from(LegEnd::Receive).matrix;

        assert!((obs_tx - r_oi * r_tx).norm() < 1.0E-12);
        assert!((obs_rx - r_oi * r_rx).norm() < 1.0E-12);

        // one minute of earth rotation apart
        assert!((obs_tx - obs_rx).norm() > 1.0E-3);
    }
}
