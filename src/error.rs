use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A signal path refers to a participant that was never registered.
    #[error("unknown participant \"{0}\"")]
    UnknownParticipant(String),

    /// Participant names are unique.
    #[error("participant \"{0}\" is already registered")]
    DuplicateParticipant(String),

    /// A signal path needs at least one transmitter and one receiver.
    #[error("signal path requires at least 2 participants")]
    NotEnoughParticipants,

    #[error("no signal leg #{0}")]
    InvalidLeg(usize),

    /// Same participant on both ends of a single leg.
    #[error("participant \"{0}\" cannot transmit to itself")]
    RepeatedParticipant(String),

    /// Propagated participants must be assigned a [Propagator] before
    /// any evaluation may proceed.
    #[error("no propagator assigned to \"{0}\"")]
    MissingPropagator(String),

    /// Measurement definition without any measurement model.
    #[error("missing measurement model")]
    MissingMeasurementModel,

    #[error("unknown measurement type \"{0}\"")]
    UnknownMeasurementType(String),

    #[error("unknown epoch tag \"{0}\"")]
    UnknownEpochTag(String),

    /// Rotation scopes are a closed set: asking for anything else
    /// is a programming error.
    #[error("unknown rotation scope \"{0}\"")]
    UnknownRotationScope(String),

    #[error("unknown uplink band \"{0}\"")]
    UnknownUplinkBand(String),

    #[error("unknown solve-for parameter \"{0}\"")]
    UnknownSolveFor(String),

    /// Requested element is not part of this participant's state transition matrix.
    #[error("\"{participant}\" does not estimate {element}")]
    MissingStmElement {
        participant: String,
        element: String,
    },

    /// Derivatives were requested for a participant this measurement does not involve.
    #[error("\"{0}\" does not participate in this measurement")]
    NotAParticipant(String),

    /// Angular observables require a ground station on the observing end.
    #[error("no topocentric frame: no ground station on the observing end")]
    NoTopocentricFrame,

    #[error("doppler count interval must be strictly positive")]
    InvalidCountInterval,

    #[error("range modulus must be strictly positive")]
    InvalidRangeModulus,

    /// The light time iteration did not converge within the iteration cap.
    /// This is a modeling problem, not a geometric outcome.
    #[error("leg #{leg}: light time did not converge after {iterations} iterations (residual {residual_s:.3E}s)")]
    LightTimeNonConvergence {
        leg: usize,
        iterations: usize,
        residual_s: f64,
    },

    /// Relative state transition matrix requires the reference STM inverse.
    #[error("failed to invert state transition matrix")]
    SingularStm,

    /// State transition matrix does not have the expected layout.
    #[error("state transition matrix dimension mismatch")]
    StmDimension,

    /// Observable is undefined for this geometry (e.g. azimuth at zenith).
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(&'static str),

    /// Propagator rejected the step: the evaluation is aborted.
    #[error("failed to propagate \"{participant}\": {reason}")]
    Propagation { participant: String, reason: String },

    /// [OriginSource] could not provide this coordinate origin.
    #[error("unknown coordinate origin \"{0}\"")]
    UnknownOrigin(String),
}
