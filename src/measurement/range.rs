use crate::{
    cfg::MeasurementKind,
    constants::SPEED_OF_LIGHT_KM_S,
    measurement::observable::{
        path_range_km, range_sensitivity, Geometry, Observable, Sensitivity,
    },
    prelude::Error,
};

/// Geometric range (km): sum of every leg's range, scaled by the range multiplier
/// (one half for round trips, so the one way range is reported).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub multiplier: f64,
}

impl Observable for Range {
    fn kind(&self) -> MeasurementKind {
        MeasurementKind::Range
    }

    fn evaluate(&self, geometry: &Geometry) -> Result<Vec<f64>, Error> {
        Ok(vec![self.multiplier * path_range_km(geometry.path)])
    }

    fn sensitivity(&self, geometry: &Geometry) -> Result<Sensitivity, Error> {
        let path = geometry
            .path
            .legs()
            .iter()
            .map(|leg| range_sensitivity(leg, self.multiplier))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Sensitivity {
            path,
            start: Vec::new(),
        })
    }
}

/// DSN sequential range (RU), modulo the range modulus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DsnRange {
    /// Uplink frequency (Hz)
    pub frequency_hz: f64,
    /// Range unit conversion factor
    pub factor: f64,
    /// Range modulus (RU)
    pub modulus: f64,
}

impl DsnRange {
    /// Range units per km of path length.
    fn range_units_per_km(&self) -> f64 {
        self.factor * self.frequency_hz / SPEED_OF_LIGHT_KM_S
    }
}

impl Observable for DsnRange {
    fn kind(&self) -> MeasurementKind {
        MeasurementKind::DsnRange
    }

    fn evaluate(&self, geometry: &Geometry) -> Result<Vec<f64>, Error> {
        if self.modulus <= 0.0 {
            return Err(Error::InvalidRangeModulus);
        }
        let range_units = self.range_units_per_km() * path_range_km(geometry.path);
        Ok(vec![range_units.rem_euclid(self.modulus)])
    }

    fn sensitivity(&self, geometry: &Geometry) -> Result<Sensitivity, Error> {
        let scale = self.range_units_per_km();

        let path = geometry
            .path
            .legs()
            .iter()
            .map(|leg| range_sensitivity(leg, scale))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Sensitivity {
            path,
            start: Vec::new(),
        })
    }
}
