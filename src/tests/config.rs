use std::str::FromStr;

use crate::{
    prelude::{
        EpochTag, MeasurementConfig, MeasurementKind, SolveForKind, TrackingMeasurement,
        UplinkBand,
    },
    tests::{init_logger, reference_epoch, station_and_spacecraft},
};

use nalgebra::Vector3;

/// Measurement definitions, as they would be read from a tracking setup.
const DEFINITIONS: [(&str, &str, &str); 4] = [
    ("range", "gs,sat,gs", "receive"),
    ("doppler", "gs,sat,gs", "receive"),
    ("azel", "sat,gs", "transmit"),
    ("dsn_range", "gs,sat,gs", "rx"),
];

#[test]
fn text_definitions() {
    init_logger();

    let mut accessor = station_and_spacecraft(Vector3::new(1000.0, 1000.0, 0.0));

    for (kind, participants, tag) in DEFINITIONS {
        let participants = participants.split(',').collect::<Vec<_>>();

        let cfg = MeasurementConfig::new(MeasurementKind::from_str(kind).unwrap(), &participants)
            .with_epoch_tag(EpochTag::from_str(tag).unwrap())
            .with_uplink(7.2E9, UplinkBand::from_str("x").unwrap());

        let mut measurement = TrackingMeasurement::new(&accessor, &cfg).unwrap();
        let record = measurement.evaluate(&mut accessor, reference_epoch()).unwrap();

        assert!(record.feasible, "{} should be feasible", kind);
        assert_eq!(record.values.len(), record.kind.dimension());
    }

    assert!(SolveForKind::from_str("drag").is_ok());
    assert!(MeasurementKind::from_str("phase").is_err());
}

#[cfg(feature = "serde")]
mod serdes {
    use crate::{
        prelude::{
            EpochTag, MeasurementConfig, MeasurementKind, MediaModel, TrackingMeasurement,
            UplinkBand,
        },
        tests::{init_logger, reference_epoch, station_and_spacecraft},
    };

    use nalgebra::Vector3;

    #[test]
    fn json_definition() {
        init_logger();

        let content = r#"
        {
            "kind": "DsnDoppler",
            "participants": ["gs", "sat", "gs"],
            "epoch_tag": "AtReceive",
            "uplink_frequency_hz": 7.2e9,
            "uplink_band": "X",
            "doppler_count_interval_s": 10.0,
            "light_time": {
                "tolerance_s": 1e-11
            },
            "media": {
                "Troposphere": {
                    "zenith_delay_km": 2.3e-3
                }
            }
        }"#;

        let cfg: MeasurementConfig = serde_json::from_str(content).unwrap();

        assert_eq!(cfg.kind, Some(MeasurementKind::DsnDoppler));
        assert_eq!(cfg.epoch_tag, EpochTag::AtReceive);
        assert_eq!(cfg.uplink_band, UplinkBand::X);
        assert_eq!(cfg.doppler_count_interval_s, 10.0);
        assert!(cfg.light_time.enabled);
        assert_eq!(cfg.light_time.tolerance_s, 1.0E-11);
        assert_eq!(cfg.light_time.max_iterations, 10);
        assert_eq!(cfg.turnaround_ratio, 240.0 / 221.0);
        assert!(matches!(cfg.media, MediaModel::Troposphere(_)));
        assert!(cfg.is_round_trip());

        let defaults: MeasurementConfig =
            serde_json::from_str(r#"{ "kind": "Range", "participants": ["gs", "sat"] }"#).unwrap();

        assert_eq!(
            defaults,
            MeasurementConfig::new(MeasurementKind::Range, &["gs", "sat"])
        );
    }

    #[test]
    fn record_serialization() {
        init_logger();

        let mut accessor = station_and_spacecraft(Vector3::new(1000.0, 1000.0, 0.0));
        let cfg = MeasurementConfig::new(MeasurementKind::AzEl, &["sat", "gs"]);

        let mut measurement = TrackingMeasurement::new(&accessor, &cfg).unwrap();
        let record = measurement.evaluate(&mut accessor, reference_epoch()).unwrap();

        let content = serde_json::to_string(&record).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert_eq!(value["kind"], "AzEl");
        assert_eq!(value["feasible"], true);
        assert_eq!(value["participants"][1], "gs");
        assert_eq!(value["values"].as_array().map(|v| v.len()), Some(2));
    }
}
