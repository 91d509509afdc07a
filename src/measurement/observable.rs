use nalgebra::{DMatrix, RowVector3};

use crate::{
    cfg::{MeasurementConfig, MeasurementKind},
    constants::MIN_RANGE_KM,
    measurement::{
        angles::{AzEl, RaDec},
        range::{DsnRange, Range},
        rate::{Doppler, DsnDoppler, RangeRate},
    },
    prelude::Error,
    signal::{SignalLeg, SignalPath},
};

/// Resolved signal paths an [Observable] is evaluated from.
#[derive(Debug, Copy, Clone)]
pub struct Geometry<'a> {
    /// Path ending at the measurement epoch
    pub path: &'a SignalPath,
    /// Path ending at the start of the count interval (integrated observables only)
    pub start: Option<&'a SignalPath>,
}

impl<'a> Geometry<'a> {
    pub(crate) fn start_path(&self) -> Result<&'a SignalPath, Error> {
        self.start.ok_or(Error::InvalidCountInterval)
    }
}

/// Sensitivity of an [Observable] to the range and range rate vectors
/// of each leg: one (dimension x 6) matrix per leg, `[∂/∂ρ, ∂/∂ρ']`,
/// both expressed in the inertial frame.
#[derive(Debug, Clone, Default)]
pub struct Sensitivity {
    pub path: Vec<DMatrix<f64>>,
    pub start: Vec<DMatrix<f64>>,
}

impl Sensitivity {
    /// Null sensitivity for every leg.
    pub(crate) fn zeros(geometry: &Geometry, rows: usize) -> Self {
        Self {
            path: vec![DMatrix::zeros(rows, 6); geometry.path.len()],
            start: match geometry.start {
                Some(start) => vec![DMatrix::zeros(rows, 6); start.len()],
                None => Vec::new(),
            },
        }
    }
}

/// Any observable implements [Observable].
pub trait Observable {
    /// Type of measurement.
    fn kind(&self) -> MeasurementKind;

    /// Observable value(s), from resolved and feasible geometry.
    fn evaluate(&self, geometry: &Geometry) -> Result<Vec<f64>, Error>;

    /// Sensitivity to the range vectors of each leg.
    fn sensitivity(&self, geometry: &Geometry) -> Result<Sensitivity, Error>;

    /// Number of values.
    fn dimension(&self) -> usize {
        self.kind().dimension()
    }
}

/// Observables we support.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObservableModel {
    Range(Range),
    RangeRate(RangeRate),
    AzEl(AzEl),
    RaDec(RaDec),
    Doppler(Doppler),
    DsnRange(DsnRange),
    DsnDoppler(DsnDoppler),
}

impl ObservableModel {
    /// Builds the [ObservableModel] this [MeasurementConfig] describes.
    pub fn from_config(cfg: &MeasurementConfig) -> Result<Self, Error> {
        let kind = cfg.validate()?;

        let round_trip = cfg.is_round_trip();

        let multiplier = cfg
            .range_multiplier
            .unwrap_or(if round_trip { 0.5 } else { 1.0 });

        let turnaround = if round_trip {
            cfg.turnaround_ratio
        } else {
            1.0
        };

        Ok(match kind {
            MeasurementKind::Range => Self::Range(Range { multiplier }),
            MeasurementKind::RangeRate => Self::RangeRate(RangeRate { multiplier }),
            MeasurementKind::AzEl => Self::AzEl(AzEl),
            MeasurementKind::RaDec => Self::RaDec(RaDec),
            MeasurementKind::Doppler => Self::Doppler(Doppler {
                frequency_hz: cfg.uplink_frequency_hz,
                turnaround,
            }),
            MeasurementKind::DsnRange => Self::DsnRange(DsnRange {
                frequency_hz: cfg.uplink_frequency_hz,
                factor: cfg.uplink_band.range_unit_factor(),
                modulus: cfg.range_modulus,
            }),
            MeasurementKind::DsnDoppler => Self::DsnDoppler(DsnDoppler {
                frequency_hz: cfg.uplink_frequency_hz,
                turnaround,
                interval_s: cfg.doppler_count_interval_s,
            }),
        })
    }

    /// DSN Doppler count interval, for observables integrated over time.
    pub fn count_interval_s(&self) -> Option<f64> {
        match self {
            Self::DsnDoppler(doppler) => Some(doppler.interval_s),
            _ => None,
        }
    }
}

impl Observable for ObservableModel {
    fn kind(&self) -> MeasurementKind {
        match self {
            Self::Range(range) => range.kind(),
            Self::RangeRate(rate) => rate.kind(),
            Self::AzEl(azel) => azel.kind(),
            Self::RaDec(radec) => radec.kind(),
            Self::Doppler(doppler) => doppler.kind(),
            Self::DsnRange(range) => range.kind(),
            Self::DsnDoppler(doppler) => doppler.kind(),
        }
    }

    fn evaluate(&self, geometry: &Geometry) -> Result<Vec<f64>, Error> {
        match self {
            Self::Range(range) => range.evaluate(geometry),
            Self::RangeRate(rate) => rate.evaluate(geometry),
            Self::AzEl(azel) => azel.evaluate(geometry),
            Self::RaDec(radec) => radec.evaluate(geometry),
            Self::Doppler(doppler) => doppler.evaluate(geometry),
            Self::DsnRange(range) => range.evaluate(geometry),
            Self::DsnDoppler(doppler) => doppler.evaluate(geometry),
        }
    }

    fn sensitivity(&self, geometry: &Geometry) -> Result<Sensitivity, Error> {
        match self {
            Self::Range(range) => range.sensitivity(geometry),
            Self::RangeRate(rate) => rate.sensitivity(geometry),
            Self::AzEl(azel) => azel.sensitivity(geometry),
            Self::RaDec(radec) => radec.sensitivity(geometry),
            Self::Doppler(doppler) => doppler.sensitivity(geometry),
            Self::DsnRange(range) => range.sensitivity(geometry),
            Self::DsnDoppler(doppler) => doppler.sensitivity(geometry),
        }
    }
}

/// Unit range vector (inertial).
pub(crate) fn unit_range(leg: &SignalLeg) -> Result<RowVector3<f64>, Error> {
    let range = leg.range();
    if range < MIN_RANGE_KM {
        return Err(Error::DegenerateGeometry("null range"));
    }
    Ok(leg.range_km.transpose() / range)
}

/// Range (km) including media delay.
pub(crate) fn leg_range_km(leg: &SignalLeg) -> f64 {
    leg.range_obs_km.norm() + leg.media.range_km
}

/// Range rate (km/s): projection of the range rate vector
/// on the unit range vector, in the observation frame.
pub(crate) fn leg_range_rate_km_s(leg: &SignalLeg) -> Result<f64, Error> {
    let range = leg.range_obs_km.norm();
    if range < MIN_RANGE_KM {
        return Err(Error::DegenerateGeometry("null range"));
    }
    Ok(leg.range_obs_km.dot(&leg.range_rate_obs_km_s) / range)
}

/// Total path length (km), media included.
pub(crate) fn path_range_km(path: &SignalPath) -> f64 {
    path.legs().iter().map(leg_range_km).sum()
}

/// `[ûᵀ, 0]` scaled by `scale`.
pub(crate) fn range_sensitivity(leg: &SignalLeg, scale: f64) -> Result<DMatrix<f64>, Error> {
    let u = unit_range(leg)? * scale;
    let mut sens = DMatrix::zeros(1, 6);
    sens.view_mut((0, 0), (1, 3)).copy_from(&u);
    Ok(sens)
}

/// `[(ρ' - (û.ρ')û)ᵀ/ρ, ûᵀ]` scaled by `scale`.
pub(crate) fn range_rate_sensitivity(leg: &SignalLeg, scale: f64) -> Result<DMatrix<f64>, Error> {
    let u = unit_range(leg)?;
    let rate = leg.range_rate_km_s.transpose();
    let projected = u.dot(&rate);

    let d_range = (rate - u * projected) / leg.range() * scale;
    let d_rate = u * scale;

    let mut sens = DMatrix::zeros(1, 6);
    sens.view_mut((0, 0), (1, 3)).copy_from(&d_range);
    sens.view_mut((0, 3), (1, 3)).copy_from(&d_rate);
    Ok(sens)
}
