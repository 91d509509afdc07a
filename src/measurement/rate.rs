use crate::{
    cfg::MeasurementKind,
    constants::SPEED_OF_LIGHT_KM_S,
    measurement::observable::{
        leg_range_rate_km_s, path_range_km, range_rate_sensitivity, range_sensitivity, Geometry,
        Observable, Sensitivity,
    },
    prelude::Error,
    signal::SignalPath,
};

/// Sum of every leg's range rate (km/s), scaled by the range multiplier.
/// Positive when participants move apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeRate {
    pub multiplier: f64,
}

fn path_range_rate_km_s(path: &SignalPath) -> Result<f64, Error> {
    path.legs().iter().map(leg_range_rate_km_s).sum()
}

impl Observable for RangeRate {
    fn kind(&self) -> MeasurementKind {
        MeasurementKind::RangeRate
    }

    fn evaluate(&self, geometry: &Geometry) -> Result<Vec<f64>, Error> {
        Ok(vec![self.multiplier * path_range_rate_km_s(geometry.path)?])
    }

    fn sensitivity(&self, geometry: &Geometry) -> Result<Sensitivity, Error> {
        let path = geometry
            .path
            .legs()
            .iter()
            .map(|leg| range_rate_sensitivity(leg, self.multiplier))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Sensitivity {
            path,
            start: Vec::new(),
        })
    }
}

/// Instantaneous Doppler shift (Hz) of the received carrier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Doppler {
    /// Uplink frequency (Hz)
    pub frequency_hz: f64,
    /// Transponder turnaround ratio (one way: 1)
    pub turnaround: f64,
}

impl Doppler {
    fn scale(&self) -> f64 {
        -self.turnaround * self.frequency_hz / SPEED_OF_LIGHT_KM_S
    }
}

impl Observable for Doppler {
    fn kind(&self) -> MeasurementKind {
        MeasurementKind::Doppler
    }

    fn evaluate(&self, geometry: &Geometry) -> Result<Vec<f64>, Error> {
        Ok(vec![self.scale() * path_range_rate_km_s(geometry.path)?])
    }

    fn sensitivity(&self, geometry: &Geometry) -> Result<Sensitivity, Error> {
        let path = geometry
            .path
            .legs()
            .iter()
            .map(|leg| range_rate_sensitivity(leg, self.scale()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Sensitivity {
            path,
            start: Vec::new(),
        })
    }
}

/// DSN integrated Doppler (Hz): path length variation over the count interval.
/// Evaluated from a pair of paths, ending at the start and at the end
/// of the count interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DsnDoppler {
    /// Uplink frequency (Hz)
    pub frequency_hz: f64,
    /// Transponder turnaround ratio (one way: 1)
    pub turnaround: f64,
    /// Count interval (s)
    pub interval_s: f64,
}

impl DsnDoppler {
    fn scale(&self) -> Result<f64, Error> {
        if self.interval_s <= 0.0 {
            return Err(Error::InvalidCountInterval);
        }
        Ok(-self.turnaround * self.frequency_hz / (SPEED_OF_LIGHT_KM_S * self.interval_s))
    }
}

impl Observable for DsnDoppler {
    fn kind(&self) -> MeasurementKind {
        MeasurementKind::DsnDoppler
    }

    fn evaluate(&self, geometry: &Geometry) -> Result<Vec<f64>, Error> {
        let start = geometry.start_path()?;
        let delta_km = path_range_km(geometry.path) - path_range_km(start);
        Ok(vec![self.scale()? * delta_km])
    }

    fn sensitivity(&self, geometry: &Geometry) -> Result<Sensitivity, Error> {
        let scale = self.scale()?;

        let path = geometry
            .path
            .legs()
            .iter()
            .map(|leg| range_sensitivity(leg, scale))
            .collect::<Result<Vec<_>, _>>()?;

        let start = geometry
            .start_path()?
            .legs()
            .iter()
            .map(|leg| range_sensitivity(leg, -scale))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Sensitivity { path, start })
    }
}
