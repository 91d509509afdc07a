//! Signal propagation media (troposphere, ionosphere)
use std::ops::Add;

use num_traits::Zero;

use nalgebra::Vector3;

use crate::{
    constants::{EARTH_EQUATORIAL_RADIUS_KM, SPEED_OF_LIGHT_KM_S},
    time::TimeTag,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Delay picked up by a signal crossing propagation media.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MediaDelay {
    /// Additional range (km)
    pub range_km: f64,
    /// Apparent elevation bending (rad)
    pub angle_rad: f64,
    /// Additional propagation time (s)
    pub time_s: f64,
}

impl Add for MediaDelay {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            range_km: self.range_km + rhs.range_km,
            angle_rad: self.angle_rad + rhs.angle_rad,
            time_s: self.time_s + rhs.time_s,
        }
    }
}

impl Zero for MediaDelay {
    fn zero() -> Self {
        Self::default()
    }
    fn is_zero(&self) -> bool {
        self.range_km == 0.0 && self.angle_rad == 0.0 && self.time_s == 0.0
    }
}

impl MediaDelay {
    /// Builds a [MediaDelay] from a range delay only.
    pub fn from_range_km(range_km: f64) -> Self {
        Self {
            range_km,
            angle_rad: 0.0,
            time_s: range_km / SPEED_OF_LIGHT_KM_S,
        }
    }
}

/// Ray path a media correction is evaluated on.
#[derive(Debug, Copy, Clone)]
pub struct MediaRuntime {
    /// Transmitter position, at transmission (km).
    /// Relative to the receiver's coordinate origin.
    pub transmitter_km: Vector3<f64>,
    /// Receiver position, at reception (km)
    pub receiver_km: Vector3<f64>,
    /// Reception instant
    pub t: TimeTag,
    /// Elevation of the line of sight, when a ground station
    /// sits on either end (deg)
    pub elevation_deg: Option<f64>,
    /// Signal frequency (Hz)
    pub frequency_hz: f64,
}

/// Media correction service. Implement [MediaCorrection] to provide
/// your own delays to the signal paths.
pub trait MediaCorrection: std::fmt::Debug {
    /// Delay picked up along this ray path.
    fn delay(&self, rtm: &MediaRuntime) -> MediaDelay;
}

/// Tropospheric delay, mapped from zenith with the
/// elevation mapping function of RTCA DO-229.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct TroposphereModel {
    /// Total (wet + dry) zenith delay (km)
    pub zenith_delay_km: f64,
}

impl Default for TroposphereModel {
    fn default() -> Self {
        Self {
            zenith_delay_km: 2.4E-3,
        }
    }
}

impl MediaCorrection for TroposphereModel {
    fn delay(&self, rtm: &MediaRuntime) -> MediaDelay {
        let Some(elevation_deg) = rtm.elevation_deg else {
            return MediaDelay::zero();
        };

        let sin_el = elevation_deg.to_radians().sin();
        let mapping = 1.001 / (0.002001 + sin_el.powi(2)).sqrt();
        MediaDelay::from_range_km(self.zenith_delay_km * mapping)
    }
}

/// First order ionospheric delay.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct IonosphereModel {
    /// Vertical total electron content (TECu)
    pub vertical_tec: f64,
    /// Thin shell altitude (km)
    pub shell_height_km: f64,
}

impl Default for IonosphereModel {
    fn default() -> Self {
        Self {
            vertical_tec: 10.0,
            shell_height_km: 350.0,
        }
    }
}

impl MediaCorrection for IonosphereModel {
    fn delay(&self, rtm: &MediaRuntime) -> MediaDelay {
        const K_IONO: f64 = 40.3E16;

        let elevation_deg = match rtm.elevation_deg {
            Some(elevation_deg) if rtm.frequency_hz > 0.0 => elevation_deg,
            _ => return MediaDelay::zero(),
        };

        let cos_el = elevation_deg.to_radians().cos();
        let sin_z = EARTH_EQUATORIAL_RADIUS_KM
            / (EARTH_EQUATORIAL_RADIUS_KM + self.shell_height_km)
            * cos_el;
        let obliquity = 1.0 / (1.0 - sin_z.powi(2)).sqrt();

        let delay_m = K_IONO * self.vertical_tec / rtm.frequency_hz.powi(2) * obliquity;
        MediaDelay::from_range_km(delay_m * 1.0E-3)
    }
}

/// Media models we propose, selected by configuration.
/// Troposphere and ionosphere only apply to ground station legs.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub enum MediaModel {
    /// No correction
    #[default]
    None,
    Troposphere(TroposphereModel),
    Ionosphere(IonosphereModel),
    /// Both troposphere and ionosphere
    Combined(TroposphereModel, IonosphereModel),
    /// Constant delay, whatever the geometry
    Constant(MediaDelay),
}

impl MediaCorrection for MediaModel {
    fn delay(&self, rtm: &MediaRuntime) -> MediaDelay {
        match self {
            Self::None => MediaDelay::zero(),
            Self::Troposphere(tropo) => tropo.delay(rtm),
            Self::Ionosphere(iono) => iono.delay(rtm),
            Self::Combined(tropo, iono) => tropo.delay(rtm) + iono.delay(rtm),
            Self::Constant(delay) => *delay,
        }
    }
}
