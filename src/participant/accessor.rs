use log::{error, trace};
use nalgebra::{DMatrix, DVector, Vector3, Vector6};

use crate::{
    participant::{
        origin_correction, CommonOrigin, LayoutElement, OriginSource, Participant, ParticipantId,
        ParticipantKind, StateLayout,
    },
    prelude::Error,
    time::TimeTag,
};

/// State of a participant, in its own frame, prior to any origin reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawState {
    /// Position (km)
    pub position: Vector3<f64>,
    /// Velocity (km/s)
    pub velocity: Vector3<f64>,
    /// State transition matrix
    pub stm: DMatrix<f64>,
}

/// Resolved [Participant] state at a given instant.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantState {
    /// Instant of resolution
    pub t: TimeTag,
    /// Inertial position (km), relative to the coordinate origin
    pub position: Vector3<f64>,
    /// Inertial velocity (km/s), relative to the coordinate origin
    pub velocity: Vector3<f64>,
    /// State transition matrix
    pub stm: DMatrix<f64>,
    /// Inertial state of the coordinate origin
    pub origin: Vector6<f64>,
}

/// [StateAccessor] owns all participants and resolves
/// their state on request.
pub struct StateAccessor {
    participants: Vec<Participant>,
    origins: Box<dyn OriginSource>,
}

impl Default for StateAccessor {
    fn default() -> Self {
        Self::new()
    }
}

impl StateAccessor {
    /// Builds a new [StateAccessor] where all coordinate origins coincide.
    pub fn new() -> Self {
        Self {
            participants: Vec::with_capacity(4),
            origins: Box::new(CommonOrigin),
        }
    }

    /// Copies and returns with a custom [OriginSource].
    pub fn with_origin_source(mut self, origins: Box<dyn OriginSource>) -> Self {
        self.origins = origins;
        self
    }

    /// Registers a new [Participant].
    pub fn add(&mut self, participant: Participant) -> Result<ParticipantId, Error> {
        if self.id(&participant.name).is_ok() {
            return Err(Error::DuplicateParticipant(participant.name));
        }
        self.participants.push(participant);
        Ok(ParticipantId(self.participants.len() - 1))
    }

    /// Identifies a [Participant] by name.
    pub fn id(&self, name: &str) -> Result<ParticipantId, Error> {
        self.participants
            .iter()
            .position(|p| p.name == name)
            .map(ParticipantId)
            .ok_or(Error::UnknownParticipant(name.to_string()))
    }

    pub fn participant(&self, id: ParticipantId) -> Result<&Participant, Error> {
        self.participants
            .get(id.0)
            .ok_or(Error::UnknownParticipant(id.to_string()))
    }

    pub fn participant_mut(&mut self, id: ParticipantId) -> Result<&mut Participant, Error> {
        self.participants
            .get_mut(id.0)
            .ok_or(Error::UnknownParticipant(id.to_string()))
    }

    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter()
    }

    /// Inertial state of this coordinate origin.
    pub fn origin_state(&self, origin: &str, t: &TimeTag) -> Result<Vector6<f64>, Error> {
        self.origins
            .origin_state(origin, t)
            .ok_or(Error::UnknownOrigin(origin.to_string()))
    }

    /// Resolves this [Participant] at requested instant.
    /// Spacecraft are propagated (unless already sitting at that instant),
    /// ground stations are resolved analytically.
    pub fn resolve(&mut self, id: ParticipantId, t: &TimeTag) -> Result<ParticipantState, Error> {
        let (raw, force_origin, origin) = self.raw_state(id, t)?;

        let coordinate_origin = self.origin_state(&origin, t)?;

        let raw = match force_origin {
            Some(force_origin) if force_origin != origin => {
                let force_origin = self.origin_state(&force_origin, t)?;
                origin_correction(&raw, &force_origin, &coordinate_origin)
            },
            _ => raw,
        };

        Ok(ParticipantState {
            t: *t,
            position: raw.position,
            velocity: raw.velocity,
            stm: raw.stm,
            origin: coordinate_origin,
        })
    }

    /// Propagation (or analytical) step. Returns the [RawState],
    /// the force origin (spacecraft only) and the coordinate origin.
    fn raw_state(
        &mut self,
        id: ParticipantId,
        t: &TimeTag,
    ) -> Result<(RawState, Option<String>, String), Error> {
        let participant = self.participant_mut(id)?;
        let name = participant.name.clone();

        match &mut participant.kind {
            ParticipantKind::GroundStation(station) => {
                let (rot, rot_dot) = station.body.inertial_from_body(t);
                let r_body = station.position_body_km();

                let raw = RawState {
                    position: rot * r_body,
                    velocity: rot_dot * r_body,
                    stm: DMatrix::identity(6, 6),
                };

                Ok((raw, None, station.origin.clone()))
            },
            ParticipantKind::Spacecraft(spacecraft) => {
                let size = spacecraft.stm_dimension();
                let origin = spacecraft.origin.clone();

                let cached = spacecraft.t == *t;
                let dt_s = t.seconds_since(&spacecraft.t);

                let propagator = spacecraft
                    .propagator_mut()
                    .ok_or(Error::MissingPropagator(name.clone()))?;

                // cached instant only moves forward on success
                let state = if cached {
                    propagator.state()
                } else {
                    trace!("{} - propagating by {:.6E}s", name, dt_s);
                    propagator.advance_by(dt_s).map_err(|reason| {
                        error!("{} - propagation failed: {}", name, reason);
                        Error::Propagation {
                            participant: name.clone(),
                            reason,
                        }
                    })?
                };

                let raw = read_state(&name, &state, propagator.layout(), size)?;
                let force_origin = propagator.force_origin().to_string();

                spacecraft.t = *t;

                Ok((raw, Some(force_origin), origin))
            },
        }
    }
}

/// Reads position, velocity and STM out of a propagator state vector.
fn read_state(
    name: &str,
    state: &DVector<f64>,
    layout: &StateLayout,
    size: usize,
) -> Result<RawState, Error> {
    let missing = |element: LayoutElement| Error::MissingStmElement {
        participant: name.to_string(),
        element: format!("{:?}", element),
    };

    let cs = layout
        .start(name, LayoutElement::CartesianState)
        .ok_or_else(|| missing(LayoutElement::CartesianState))?;

    let stm = layout
        .start(name, LayoutElement::Stm)
        .ok_or_else(|| missing(LayoutElement::Stm))?;

    if state.len() < cs + 6 || state.len() < stm + size * size {
        return Err(Error::StmDimension);
    }

    Ok(RawState {
        position: Vector3::new(state[cs], state[cs + 1], state[cs + 2]),
        velocity: Vector3::new(state[cs + 3], state[cs + 4], state[cs + 5]),
        stm: DMatrix::from_fn(size, size, |i, j| state[stm + i * size + j]),
    })
}
