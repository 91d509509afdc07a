use crate::prelude::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Measurement types we support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MeasurementKind {
    /// Geometric range (km). Round trip paths report the one way equivalent.
    Range,
    /// Geometric range rate (km/s)
    RangeRate,
    /// Azimuth and elevation, seen from a ground station (deg)
    AzEl,
    /// Right ascension and declination of the line of sight (deg)
    RaDec,
    /// Instantaneous Doppler shift (Hz)
    Doppler,
    /// DSN sequential range, modulo the range modulus (RU)
    DsnRange,
    /// DSN integrated Doppler, over the count interval (Hz)
    DsnDoppler,
}

impl MeasurementKind {
    /// Number of values one measurement of this kind produces.
    pub fn dimension(&self) -> usize {
        match self {
            Self::AzEl | Self::RaDec => 2,
            _ => 1,
        }
    }

    /// True when this kind requires a ground station on the observing end.
    pub fn is_topocentric(&self) -> bool {
        matches!(self, Self::AzEl)
    }
}

impl std::fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Range => write!(f, "Range"),
            Self::RangeRate => write!(f, "RangeRate"),
            Self::AzEl => write!(f, "AzEl"),
            Self::RaDec => write!(f, "RaDec"),
            Self::Doppler => write!(f, "Doppler"),
            Self::DsnRange => write!(f, "DSN_Range"),
            Self::DsnDoppler => write!(f, "DSN_Doppler"),
        }
    }
}

impl std::str::FromStr for MeasurementKind {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "range" => Ok(Self::Range),
            "rangerate" | "range_rate" => Ok(Self::RangeRate),
            "azel" | "az_el" => Ok(Self::AzEl),
            "radec" | "ra_dec" => Ok(Self::RaDec),
            "doppler" => Ok(Self::Doppler),
            "dsn_range" | "dsnrange" => Ok(Self::DsnRange),
            "dsn_doppler" | "dsndoppler" => Ok(Self::DsnDoppler),
            _ => Err(Error::UnknownMeasurementType(s.to_string())),
        }
    }
}
