//! Tracking participants: ground stations and spacecraft
use nalgebra::Vector3;

use crate::{
    constants::{EARTH_FLATTENING_WGS84, EARTH_SEMI_MAJOR_AXIS_WGS84_KM},
    frame::{BodyRotation, ParticipantFrame},
    prelude::Error,
    time::TimeTag,
};

mod accessor;
mod origin;
mod propagator;

pub use accessor::{ParticipantState, RawState, StateAccessor};
pub use origin::{origin_correction, CommonOrigin, OriginSource};
pub use propagator::{LayoutElement, Propagator, StateLayout};

/// Index of a [Participant] within the [StateAccessor].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantId(pub(crate) usize);

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Elements a participant's state transition matrix is made of,
/// in the order they appear.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StmElement {
    /// Position and velocity (6 columns)
    CartesianState,
    /// Solar radiation pressure reflectivity coefficient
    ReflectivityCoefficient,
    /// Atmospheric drag coefficient
    DragCoefficient,
}

impl StmElement {
    /// Number of STM columns this element spans.
    pub fn size(&self) -> usize {
        match self {
            Self::CartesianState => 6,
            Self::ReflectivityCoefficient | Self::DragCoefficient => 1,
        }
    }
}

impl std::fmt::Display for StmElement {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::CartesianState => write!(f, "CartesianState"),
            Self::ReflectivityCoefficient => write!(f, "Cr"),
            Self::DragCoefficient => write!(f, "Cd"),
        }
    }
}

/// Ground station, fixed on a rotating body.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundStation {
    /// Geodetic latitude (deg)
    pub latitude_deg: f64,
    /// Longitude (deg)
    pub longitude_deg: f64,
    /// Altitude above the ellipsoid (km)
    pub altitude_km: f64,
    /// Minimal elevation for a signal to be feasible (deg)
    pub min_elevation_deg: f64,
    /// Rotation of the body this station is attached to
    pub body: BodyRotation,
    /// Name of the body, which is also the station's coordinate origin
    pub origin: String,
}

impl GroundStation {
    /// Builds a [GroundStation] on Earth (WGS84 ellipsoid).
    pub fn from_geodetic(latitude_deg: f64, longitude_deg: f64, altitude_km: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            altitude_km,
            min_elevation_deg: 0.0,
            body: BodyRotation::earth(),
            origin: "Earth".to_string(),
        }
    }

    /// Copies and returns with updated elevation mask.
    pub fn with_min_elevation_deg(&self, mask_deg: f64) -> Self {
        let mut s = self.clone();
        s.min_elevation_deg = mask_deg;
        s
    }

    /// Copies and returns with updated body rotation.
    pub fn with_body_rotation(&self, body: BodyRotation) -> Self {
        let mut s = self.clone();
        s.body = body;
        s
    }

    /// Body fixed position (km)
    pub fn position_body_km(&self) -> Vector3<f64> {
        let a = EARTH_SEMI_MAJOR_AXIS_WGS84_KM;
        let e2 = EARTH_FLATTENING_WGS84 * (2.0 - EARTH_FLATTENING_WGS84);

        let (sin_lat, cos_lat) = self.latitude_deg.to_radians().sin_cos();
        let (sin_lon, cos_lon) = self.longitude_deg.to_radians().sin_cos();

        let n = a / (1.0 - e2 * sin_lat.powi(2)).sqrt();

        Vector3::new(
            (n + self.altitude_km) * cos_lat * cos_lon,
            (n + self.altitude_km) * cos_lat * sin_lon,
            (n * (1.0 - e2) + self.altitude_km) * sin_lat,
        )
    }
}

/// Freely propagated participant.
pub struct Spacecraft {
    /// Origin of the coordinate system states are reported in
    pub origin: String,
    /// State transition matrix layout
    pub estimated: Vec<StmElement>,
    /// Instant the propagator currently sits at
    pub(crate) t: TimeTag,
    propagator: Option<Box<dyn Propagator>>,
}

impl std::fmt::Debug for Spacecraft {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Spacecraft")
            .field("origin", &self.origin)
            .field("estimated", &self.estimated)
            .field("t", &self.t)
            .field("propagator", &self.propagator.is_some())
            .finish()
    }
}

impl Spacecraft {
    /// Builds a new [Spacecraft] whose [Propagator] sits at `t`,
    /// estimating its cartesian state only.
    pub fn new(t: TimeTag, propagator: Box<dyn Propagator>) -> Self {
        Self {
            t,
            origin: "Earth".to_string(),
            estimated: vec![StmElement::CartesianState],
            propagator: Some(propagator),
        }
    }

    /// [Spacecraft] without any [Propagator] assigned yet.
    pub fn unassigned(t: TimeTag) -> Self {
        Self {
            t,
            origin: "Earth".to_string(),
            estimated: vec![StmElement::CartesianState],
            propagator: None,
        }
    }

    /// Copies and returns with updated coordinate origin.
    pub fn with_origin(mut self, origin: &str) -> Self {
        self.origin = origin.to_string();
        self
    }

    /// Copies and returns with an additional estimated element.
    pub fn with_estimated(mut self, element: StmElement) -> Self {
        if !self.estimated.contains(&element) {
            self.estimated.push(element);
        }
        self
    }

    /// Assigns a [Propagator], which must sit at the current instant.
    pub fn assign_propagator(&mut self, propagator: Box<dyn Propagator>) {
        self.propagator = Some(propagator);
    }

    pub(crate) fn propagator_mut(&mut self) -> Option<&mut Box<dyn Propagator>> {
        self.propagator.as_mut()
    }

    pub fn has_propagator(&self) -> bool {
        self.propagator.is_some()
    }

    /// Size of the (square) state transition matrix.
    pub fn stm_dimension(&self) -> usize {
        self.estimated.iter().map(|e| e.size()).sum()
    }
}

#[derive(Debug)]
pub enum ParticipantKind {
    GroundStation(GroundStation),
    Spacecraft(Spacecraft),
}

/// [Participant] to a signal path.
#[derive(Debug)]
pub struct Participant {
    /// Name, unique within a [StateAccessor]
    pub name: String,
    /// Hardware (or transponder) delay, in seconds
    pub hardware_delay_s: f64,
    pub kind: ParticipantKind,
}

impl Participant {
    pub fn ground_station(name: &str, station: GroundStation) -> Self {
        Self {
            name: name.to_string(),
            hardware_delay_s: 0.0,
            kind: ParticipantKind::GroundStation(station),
        }
    }

    pub fn spacecraft(name: &str, spacecraft: Spacecraft) -> Self {
        Self {
            name: name.to_string(),
            hardware_delay_s: 0.0,
            kind: ParticipantKind::Spacecraft(spacecraft),
        }
    }

    /// Copies and returns with updated hardware delay.
    pub fn with_hardware_delay_s(mut self, delay_s: f64) -> Self {
        self.hardware_delay_s = delay_s;
        self
    }

    pub fn is_ground_station(&self) -> bool {
        matches!(self.kind, ParticipantKind::GroundStation(_))
    }

    pub fn as_ground_station(&self) -> Option<&GroundStation> {
        match &self.kind {
            ParticipantKind::GroundStation(station) => Some(station),
            _ => None,
        }
    }

    /// Frame this participant's coordinates are expressed in.
    pub fn frame(&self) -> ParticipantFrame {
        match &self.kind {
            ParticipantKind::GroundStation(station) => ParticipantFrame::BodyFixed(station.body),
            ParticipantKind::Spacecraft(_) => ParticipantFrame::Inertial,
        }
    }

    /// Coordinate system origin.
    pub fn origin(&self) -> &str {
        match &self.kind {
            ParticipantKind::GroundStation(station) => &station.origin,
            ParticipantKind::Spacecraft(spacecraft) => &spacecraft.origin,
        }
    }

    /// Estimated elements, as they appear in the state transition matrix.
    pub fn estimated(&self) -> &[StmElement] {
        match &self.kind {
            ParticipantKind::GroundStation(_) => &[StmElement::CartesianState],
            ParticipantKind::Spacecraft(spacecraft) => &spacecraft.estimated,
        }
    }

    /// State transition matrix columns of this element.
    pub fn stm_columns(&self, element: StmElement) -> Result<std::ops::Range<usize>, Error> {
        let mut start = 0;
        for estimated in self.estimated() {
            if *estimated == element {
                return Ok(start..start + element.size());
            }
            start += estimated.size();
        }
        Err(Error::MissingStmElement {
            participant: self.name.clone(),
            element: element.to_string(),
        })
    }

    /// Verifies this participant can be resolved at all.
    pub fn check_configuration(&self) -> Result<(), Error> {
        match &self.kind {
            ParticipantKind::Spacecraft(spacecraft) if !spacecraft.has_propagator() => {
                Err(Error::MissingPropagator(self.name.clone()))
            },
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn station_on_ellipsoid() {
        let station = GroundStation::from_geodetic(0.0, 0.0, 0.0);
        let r = station.position_body_km();
        assert!((r.x - EARTH_SEMI_MAJOR_AXIS_WGS84_KM).abs() < 1.0E-9);
        assert!(r.y.abs() < 1.0E-9);
        assert!(r.z.abs() < 1.0E-9);

        let pole = GroundStation::from_geodetic(90.0, 0.0, 0.0);
        let r = pole.position_body_km();
        let b = EARTH_SEMI_MAJOR_AXIS_WGS84_KM * (1.0 - EARTH_FLATTENING_WGS84);
        assert!((r.z - b).abs() < 1.0E-6);
    }

    #[test]
    fn stm_columns() {
        let sc = Spacecraft::unassigned(TimeTag::new(crate::prelude::Epoch::from_tai_seconds(0.0)))
            .with_estimated(StmElement::ReflectivityCoefficient)
            .with_estimated(StmElement::DragCoefficient);

        assert_eq!(sc.stm_dimension(), 8);

        let participant = Participant::spacecraft("sat", sc);

        assert_eq!(participant.stm_columns(StmElement::CartesianState), Ok(0..6));
        assert_eq!(
            participant.stm_columns(StmElement::ReflectivityCoefficient),
            Ok(6..7)
        );
        assert_eq!(participant.stm_columns(StmElement::DragCoefficient), Ok(7..8));

        assert_eq!(
            participant.check_configuration(),
            Err(Error::MissingPropagator("sat".to_string()))
        );

        let station = Participant::ground_station("gs", GroundStation::from_geodetic(0.0, 0.0, 0.0));
        assert!(station.stm_columns(StmElement::DragCoefficient).is_err());
        assert!(station.check_configuration().is_ok());
    }
}
