use crate::{
    constants::{EARTH_ANGULAR_VEL_RAD, EARTH_SEMI_MAJOR_AXIS_WGS84_KM},
    prelude::{
        Error, GroundStation, MeasurementConfig, MeasurementKind, OriginSource, Participant,
        Spacecraft, StateAccessor, TimeTag, TrackingMeasurement, Vector3, Vector6,
    },
    tests::{add_spacecraft, init_logger, reference_epoch, ConstantVelocity},
};

const EARTH_MOON_KM: f64 = 384400.0;

/// Static Earth-Moon system
struct EarthMoon;

impl OriginSource for EarthMoon {
    fn origin_state(&self, origin: &str, _: &TimeTag) -> Option<Vector6<f64>> {
        match origin {
            "Earth" => Some(Vector6::zeros()),
            "Moon" => Some(Vector6::new(EARTH_MOON_KM, 0.0, 0.0, 0.0, 1.0, 0.0)),
            _ => None,
        }
    }
}

/// Lunar orbiter: Moon centered coordinates, Moon centered dynamics.
fn add_lunar_orbiter(accessor: &mut StateAccessor, name: &str, origin: &str) {
    let propagator = ConstantVelocity::new(name, Vector3::new(1000.0, 0.0, 0.0), Vector3::zeros())
        .with_force_origin("Moon");

    accessor
        .add(Participant::spacecraft(
            name,
            Spacecraft::new(TimeTag::new(reference_epoch()), Box::new(propagator))
                .with_origin(origin),
        ))
        .unwrap();
}

#[test]
fn distinct_coordinate_origins() {
    init_logger();

    let mut accessor = StateAccessor::new().with_origin_source(Box::new(EarthMoon));

    add_spacecraft(
        &mut accessor,
        "earth-orbiter",
        Vector3::new(7000.0, 0.0, 0.0),
        Vector3::zeros(),
    );

    add_lunar_orbiter(&mut accessor, "lunar-orbiter", "Moon");

    let cfg =
        MeasurementConfig::new(MeasurementKind::Range, &["earth-orbiter", "lunar-orbiter"])
            .without_light_time();

    let mut measurement = TrackingMeasurement::new(&accessor, &cfg).unwrap();
    let record = measurement.evaluate(&mut accessor, reference_epoch()).unwrap();

    let expected_km = EARTH_MOON_KM + 1000.0 - 7000.0;
    assert!((record.values[0] - expected_km).abs() < 1.0E-9);

    let leg = &measurement.path().legs()[0];
    assert_eq!(leg.range_km, Vector3::new(expected_km, 0.0, 0.0));

    // origin velocity shows up in the range rate
    assert_eq!(leg.range_rate_km_s, Vector3::new(0.0, 1.0, 0.0));
}

#[test]
fn force_origin_correction() {
    init_logger();

    let mut accessor = StateAccessor::new().with_origin_source(Box::new(EarthMoon));

    // Moon centered dynamics, reported in Earth centered coordinates
    add_lunar_orbiter(&mut accessor, "orbiter", "Earth");
    let id = accessor.id("orbiter").unwrap();

    let state = accessor
        .resolve(id, &TimeTag::new(reference_epoch()))
        .unwrap();

    assert_eq!(state.position, Vector3::new(EARTH_MOON_KM + 1000.0, 0.0, 0.0));
    assert_eq!(state.velocity, Vector3::new(0.0, 1.0, 0.0));
    assert_eq!(state.origin, Vector6::zeros());
}

#[test]
fn unknown_origin() {
    init_logger();

    let mut accessor = StateAccessor::new().with_origin_source(Box::new(EarthMoon));

    add_spacecraft(
        &mut accessor,
        "earth-orbiter",
        Vector3::new(7000.0, 0.0, 0.0),
        Vector3::zeros(),
    );

    add_lunar_orbiter(&mut accessor, "mars-orbiter", "Mars");

    let cfg = MeasurementConfig::new(MeasurementKind::Range, &["earth-orbiter", "mars-orbiter"]);
    let mut measurement = TrackingMeasurement::new(&accessor, &cfg).unwrap();

    assert_eq!(
        measurement.evaluate(&mut accessor, reference_epoch()).err(),
        Some(Error::UnknownOrigin("Mars".to_string()))
    );
}

#[test]
fn rotating_station_state() {
    init_logger();

    let mut accessor = StateAccessor::new();

    let id = accessor
        .add(Participant::ground_station(
            "gs",
            GroundStation::from_geodetic(0.0, 45.0, 0.0),
        ))
        .unwrap();

    let t = TimeTag::new(reference_epoch());
    let state = accessor.resolve(id, &t).unwrap();

    assert!((state.position.norm() - EARTH_SEMI_MAJOR_AXIS_WGS84_KM).abs() < 1.0E-9);
    assert!(state.position.z.abs() < 1.0E-9);

    let expected_km_s = EARTH_ANGULAR_VEL_RAD * EARTH_SEMI_MAJOR_AXIS_WGS84_KM;
    assert!((state.velocity.norm() - expected_km_s).abs() < 1.0E-12);
    assert!(state.position.dot(&state.velocity).abs() < 1.0E-9);

    // ground stations do not carry any dynamics
    assert_eq!(state.stm, crate::prelude::DMatrix::identity(6, 6));

    // names are unique
    assert_eq!(
        accessor
            .add(Participant::ground_station(
                "gs",
                GroundStation::from_geodetic(0.0, 0.0, 0.0),
            ))
            .err(),
        Some(Error::DuplicateParticipant("gs".to_string()))
    );
}
