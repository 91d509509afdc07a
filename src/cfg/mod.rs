#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use itertools::Itertools;

use crate::{constants::DSN_S_BAND_FACTOR, media::MediaModel, prelude::Error};

mod kind;
pub use kind::MeasurementKind;

/// Which end of the signal path the measurement epoch refers to.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EpochTag {
    /// Measurement epoch is the reception time at the final receiver.
    /// Legs are solved backwards from the last one.
    #[default]
    AtReceive,
    /// Measurement epoch is the transmission time at the first transmitter.
    /// Legs are solved forward from the first one.
    AtTransmit,
}

impl std::fmt::Display for EpochTag {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::AtReceive => write!(f, "receive"),
            Self::AtTransmit => write!(f, "transmit"),
        }
    }
}

impl std::str::FromStr for EpochTag {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "receive" | "rx" | "at_receive" | "atreceive" => Ok(Self::AtReceive),
            "transmit" | "tx" | "at_transmit" | "attransmit" => Ok(Self::AtTransmit),
            _ => Err(Error::UnknownEpochTag(s.to_string())),
        }
    }
}

/// Uplink frequency band, which defines the DSN range unit conversion.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UplinkBand {
    #[default]
    S,
    X,
}

impl UplinkBand {
    /// Range unit conversion factor.
    pub fn range_unit_factor(&self) -> f64 {
        match self {
            Self::S => DSN_S_BAND_FACTOR,
            Self::X => crate::constants::DSN_X_BAND_FACTOR,
        }
    }
}

impl std::fmt::Display for UplinkBand {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::S => write!(f, "S"),
            Self::X => write!(f, "X"),
        }
    }
}

impl std::str::FromStr for UplinkBand {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "s" | "1" => Ok(Self::S),
            "x" | "2" => Ok(Self::X),
            _ => Err(Error::UnknownUplinkBand(s.to_string())),
        }
    }
}

fn default_light_time() -> bool {
    true
}

fn default_light_time_tolerance() -> f64 {
    1.0E-12
}

fn default_light_time_iterations() -> usize {
    10
}

fn default_uplink_frequency() -> f64 {
    2.1E9
}

fn default_turnaround_ratio() -> f64 {
    240.0 / 221.0
}

fn default_count_interval() -> f64 {
    1.0
}

fn default_range_modulus() -> f64 {
    1.0E18
}

fn default_light_time_opts() -> LightTimeOpts {
    LightTimeOpts::default()
}

/// Light time iteration options
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct LightTimeOpts {
    /// Solve for the light time. When disabled, both ends of
    /// a leg share the same epoch.
    #[cfg_attr(feature = "serde", serde(default = "default_light_time"))]
    pub enabled: bool,
    /// Convergence tolerance (s)
    #[cfg_attr(feature = "serde", serde(default = "default_light_time_tolerance"))]
    pub tolerance_s: f64,
    /// Maximal number of iterations
    #[cfg_attr(feature = "serde", serde(default = "default_light_time_iterations"))]
    pub max_iterations: usize,
}

impl Default for LightTimeOpts {
    fn default() -> Self {
        Self {
            enabled: default_light_time(),
            tolerance_s: default_light_time_tolerance(),
            max_iterations: default_light_time_iterations(),
        }
    }
}

/// Measurement definition
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct MeasurementConfig {
    /// Measurement model
    #[cfg_attr(feature = "serde", serde(default))]
    pub kind: Option<MeasurementKind>,
    /// Participants, in signal order: first one transmits,
    /// last one receives, any other one relays.
    pub participants: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default = "default_light_time_opts"))]
    pub light_time: LightTimeOpts,
    #[cfg_attr(feature = "serde", serde(default))]
    pub epoch_tag: EpochTag,
    /// Express state transition matrices relative to the measurement epoch
    #[cfg_attr(feature = "serde", serde(default))]
    pub relative_stm: bool,
    /// Uplink carrier frequency (Hz)
    #[cfg_attr(feature = "serde", serde(default = "default_uplink_frequency"))]
    pub uplink_frequency_hz: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub uplink_band: UplinkBand,
    /// Transponder turnaround ratio
    #[cfg_attr(feature = "serde", serde(default = "default_turnaround_ratio"))]
    pub turnaround_ratio: f64,
    /// DSN Doppler count interval (s)
    #[cfg_attr(feature = "serde", serde(default = "default_count_interval"))]
    pub doppler_count_interval_s: f64,
    /// DSN range modulus (RU)
    #[cfg_attr(feature = "serde", serde(default = "default_range_modulus"))]
    pub range_modulus: f64,
    /// Radius of the occulting central body (km). None disables occultation.
    #[cfg_attr(feature = "serde", serde(default))]
    pub central_body_radius_km: Option<f64>,
    /// Overrides the default range multiplier
    #[cfg_attr(feature = "serde", serde(default))]
    pub range_multiplier: Option<f64>,
    /// Signal propagation media
    #[cfg_attr(feature = "serde", serde(default))]
    pub media: MediaModel,
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            kind: None,
            participants: Vec::new(),
            light_time: LightTimeOpts::default(),
            epoch_tag: EpochTag::default(),
            relative_stm: false,
            uplink_frequency_hz: default_uplink_frequency(),
            uplink_band: UplinkBand::default(),
            turnaround_ratio: default_turnaround_ratio(),
            doppler_count_interval_s: default_count_interval(),
            range_modulus: default_range_modulus(),
            central_body_radius_km: None,
            range_multiplier: None,
            media: MediaModel::default(),
        }
    }
}

impl MeasurementConfig {
    /// Builds a new [MeasurementConfig] with default options.
    pub fn new(kind: MeasurementKind, participants: &[&str]) -> Self {
        Self {
            kind: Some(kind),
            participants: participants.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Copies and returns with updated [LightTimeOpts].
    pub fn with_light_time(&self, light_time: LightTimeOpts) -> Self {
        let mut s = self.clone();
        s.light_time = light_time;
        s
    }

    /// Copies and returns without light time solving.
    pub fn without_light_time(&self) -> Self {
        let mut s = self.clone();
        s.light_time.enabled = false;
        s
    }

    /// Copies and returns with updated [EpochTag].
    pub fn with_epoch_tag(&self, tag: EpochTag) -> Self {
        let mut s = self.clone();
        s.epoch_tag = tag;
        s
    }

    /// Copies and returns with relative state transition matrices.
    pub fn with_relative_stm(&self, relative: bool) -> Self {
        let mut s = self.clone();
        s.relative_stm = relative;
        s
    }

    /// Copies and returns with updated uplink carrier.
    pub fn with_uplink(&self, frequency_hz: f64, band: UplinkBand) -> Self {
        let mut s = self.clone();
        s.uplink_frequency_hz = frequency_hz;
        s.uplink_band = band;
        s
    }

    /// Copies and returns with updated Doppler count interval.
    pub fn with_count_interval_s(&self, interval_s: f64) -> Self {
        let mut s = self.clone();
        s.doppler_count_interval_s = interval_s;
        s
    }

    /// Copies and returns with updated DSN range modulus.
    pub fn with_range_modulus(&self, modulus: f64) -> Self {
        let mut s = self.clone();
        s.range_modulus = modulus;
        s
    }

    /// Copies and returns with central body occultation.
    pub fn with_central_body_radius_km(&self, radius_km: f64) -> Self {
        let mut s = self.clone();
        s.central_body_radius_km = Some(radius_km);
        s
    }

    /// Copies and returns with custom range multiplier.
    pub fn with_range_multiplier(&self, multiplier: f64) -> Self {
        let mut s = self.clone();
        s.range_multiplier = Some(multiplier);
        s
    }

    /// Copies and returns with updated [MediaModel].
    pub fn with_media(&self, media: MediaModel) -> Self {
        let mut s = self.clone();
        s.media = media;
        s
    }

    /// True when the signal returns to its emitter.
    pub fn is_round_trip(&self) -> bool {
        self.participants.len() > 2 && self.participants.first() == self.participants.last()
    }

    /// Verifies this definition is usable.
    pub fn validate(&self) -> Result<MeasurementKind, Error> {
        let kind = self.kind.ok_or(Error::MissingMeasurementModel)?;

        if self.participants.len() < 2 {
            return Err(Error::NotEnoughParticipants);
        }

        if let Some((repeated, _)) = self
            .participants
            .iter()
            .tuple_windows()
            .find(|(tx, rx)| tx == rx)
        {
            return Err(Error::RepeatedParticipant(repeated.clone()));
        }

        if kind == MeasurementKind::DsnDoppler && self.doppler_count_interval_s <= 0.0 {
            return Err(Error::InvalidCountInterval);
        }

        if kind == MeasurementKind::DsnRange && self.range_modulus <= 0.0 {
            return Err(Error::InvalidRangeModulus);
        }

        Ok(kind)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn default_options() {
        let cfg = MeasurementConfig::new(MeasurementKind::Range, &["gs", "sat", "gs"]);
        assert!(cfg.light_time.enabled);
        assert_eq!(cfg.light_time.tolerance_s, 1.0E-12);
        assert_eq!(cfg.light_time.max_iterations, 10);
        assert_eq!(cfg.epoch_tag, EpochTag::AtReceive);
        assert!(!cfg.relative_stm);
        assert!(cfg.is_round_trip());
        assert_eq!(cfg.validate(), Ok(MeasurementKind::Range));
    }

    #[test]
    fn invalid_definitions() {
        let cfg = MeasurementConfig {
            participants: vec!["gs".to_string(), "sat".to_string()],
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(Error::MissingMeasurementModel));

        let cfg = MeasurementConfig::new(MeasurementKind::Range, &["gs"]);
        assert_eq!(cfg.validate(), Err(Error::NotEnoughParticipants));

        let cfg = MeasurementConfig::new(MeasurementKind::Range, &["gs", "sat", "sat"]);
        assert_eq!(
            cfg.validate(),
            Err(Error::RepeatedParticipant("sat".to_string()))
        );

        let cfg = MeasurementConfig::new(MeasurementKind::DsnDoppler, &["gs", "sat", "gs"])
            .with_count_interval_s(0.0);
        assert_eq!(cfg.validate(), Err(Error::InvalidCountInterval));

        let cfg = MeasurementConfig::new(MeasurementKind::DsnRange, &["gs", "sat", "gs"])
            .with_range_modulus(-1.0);
        assert_eq!(cfg.validate(), Err(Error::InvalidRangeModulus));
    }

    #[test]
    fn options_parsing() {
        assert_eq!(EpochTag::from_str("Receive").unwrap(), EpochTag::AtReceive);
        assert_eq!(EpochTag::from_str("tx").unwrap(), EpochTag::AtTransmit);
        assert!(EpochTag::from_str("middle").is_err());

        assert_eq!(UplinkBand::from_str("x").unwrap(), UplinkBand::X);
        assert_eq!(UplinkBand::from_str("1").unwrap(), UplinkBand::S);
        assert!(UplinkBand::from_str("ka").is_err());
        assert_eq!(UplinkBand::S.range_unit_factor(), 0.5);
    }
}
