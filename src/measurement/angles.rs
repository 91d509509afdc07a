use nalgebra::{RowVector3, Vector3};

use crate::{
    cfg::MeasurementKind,
    constants::{MIN_HORIZONTAL_RATIO, MIN_RANGE_KM},
    frame::LegEnd,
    measurement::observable::{Geometry, Observable, Sensitivity},
    prelude::Error,
    signal::{SignalLeg, SignalPath},
};

/// Observing leg and line of sight orientation:
/// +1 when the station transmits, -1 when it receives.
fn observing_leg(path: &SignalPath) -> Result<(usize, &SignalLeg, f64), Error> {
    let (index, end) = path.observing_end().ok_or(Error::NoTopocentricFrame)?;
    let leg = path.leg(index).ok_or(Error::InvalidLeg(index))?;

    if leg.station_end() != Some(end) {
        return Err(Error::NoTopocentricFrame);
    }

    let sign = match end {
        LegEnd::Transmit => 1.0,
        LegEnd::Receive => -1.0,
    };

    Ok((index, leg, sign))
}

/// Horizontal norm and norm of this line of sight,
/// rejecting vertical (or null) lines of sight.
fn spherical_norms(los: &Vector3<f64>) -> Result<(f64, f64), Error> {
    let range = los.norm();
    if range < MIN_RANGE_KM {
        return Err(Error::DegenerateGeometry("null range"));
    }

    let horizontal = (los.x.powi(2) + los.y.powi(2)).sqrt();
    if horizontal / range < MIN_HORIZONTAL_RATIO {
        return Err(Error::DegenerateGeometry(
            "azimuth is undefined at +/-90° elevation",
        ));
    }

    Ok((horizontal, range))
}

/// Partial derivative of the polar angle (elevation or declination)
/// with respect to the line of sight (rad/km).
fn polar_angle_gradient(los: &Vector3<f64>, horizontal: f64, range: f64) -> RowVector3<f64> {
    RowVector3::new(
        -los.x * los.z,
        -los.y * los.z,
        horizontal.powi(2),
    ) / (range.powi(2) * horizontal)
}

/// Azimuth (from North, towards East) and elevation of the line of sight,
/// seen from the ground station, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AzEl;

impl Observable for AzEl {
    fn kind(&self) -> MeasurementKind {
        MeasurementKind::AzEl
    }

    fn evaluate(&self, geometry: &Geometry) -> Result<Vec<f64>, Error> {
        let (_, leg, sign) = observing_leg(geometry.path)?;

        // SEZ coordinates
        let los = leg.range_obs_km * sign;
        let (_, range) = spherical_norms(&los)?;

        let elevation = (los.z / range).asin() + leg.media.angle_rad;
        let azimuth = los.y.atan2(-los.x);

        Ok(vec![
            azimuth.to_degrees().rem_euclid(360.0),
            elevation.to_degrees(),
        ])
    }

    fn sensitivity(&self, geometry: &Geometry) -> Result<Sensitivity, Error> {
        let (index, leg, sign) = observing_leg(geometry.path)?;

        let los = leg.range_obs_km * sign;
        let (horizontal, range) = spherical_norms(&los)?;

        let d_az = RowVector3::new(los.y, -los.x, 0.0) / horizontal.powi(2);
        let d_el = polar_angle_gradient(&los, horizontal, range);

        let obs_from_inertial = leg.frames.observation_from_inertial().matrix * sign;

        let d_az = (d_az * obs_from_inertial).map(f64::to_degrees);
        let d_el = (d_el * obs_from_inertial).map(f64::to_degrees);

        let mut sensitivity = Sensitivity::zeros(geometry, 2);
        let sens = &mut sensitivity.path[index];
        sens.view_mut((0, 0), (1, 3)).copy_from(&d_az);
        sens.view_mut((1, 0), (1, 3)).copy_from(&d_el);

        Ok(sensitivity)
    }
}

/// Right ascension and declination of the line of sight (deg),
/// in the inertial frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaDec;

impl RaDec {
    /// Line of sight: from the observing ground station if any,
    /// otherwise from the first transmitter.
    fn line_of_sight(path: &SignalPath) -> Result<(usize, Vector3<f64>, f64), Error> {
        match observing_leg(path) {
            Ok((index, leg, sign)) => Ok((index, leg.range_km * sign, sign)),
            Err(_) => {
                let leg = path.leg(0).ok_or(Error::InvalidLeg(0))?;
                Ok((0, leg.range_km, 1.0))
            },
        }
    }
}

impl Observable for RaDec {
    fn kind(&self) -> MeasurementKind {
        MeasurementKind::RaDec
    }

    fn evaluate(&self, geometry: &Geometry) -> Result<Vec<f64>, Error> {
        let (_, los, _) = Self::line_of_sight(geometry.path)?;
        let (_, range) = spherical_norms(&los)?;

        let declination = (los.z / range).asin();
        let right_ascension = los.y.atan2(los.x);

        Ok(vec![
            right_ascension.to_degrees().rem_euclid(360.0),
            declination.to_degrees(),
        ])
    }

    fn sensitivity(&self, geometry: &Geometry) -> Result<Sensitivity, Error> {
        let (index, los, sign) = Self::line_of_sight(geometry.path)?;
        let (horizontal, range) = spherical_norms(&los)?;

        let d_ra = RowVector3::new(-los.y, los.x, 0.0) / horizontal.powi(2) * sign;
        let d_dec = polar_angle_gradient(&los, horizontal, range) * sign;

        let mut sensitivity = Sensitivity::zeros(geometry, 2);
        let sens = &mut sensitivity.path[index];
        sens.view_mut((0, 0), (1, 3))
            .copy_from(&d_ra.map(f64::to_degrees));
        sens.view_mut((1, 0), (1, 3))
            .copy_from(&d_dec.map(f64::to_degrees));

        Ok(sensitivity)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn vertical_line_of_sight() {
        let los = Vector3::new(0.0, 0.0, 1000.0);
        assert!(matches!(
            spherical_norms(&los),
            Err(Error::DegenerateGeometry(_))
        ));

        let los = Vector3::new(1.0E-12, 0.0, 1000.0);
        assert!(spherical_norms(&los).is_err());

        let los = Vector3::new(100.0, 0.0, 1000.0);
        assert!(spherical_norms(&los).is_ok());
    }

    #[test]
    fn polar_gradient() {
        let los = Vector3::new(300.0, -400.0, 1200.0);
        let (horizontal, range) = spherical_norms(&los).unwrap();
        let gradient = polar_angle_gradient(&los, horizontal, range);

        let angle = |v: &Vector3<f64>| (v.z / v.norm()).asin();

        let h = 1.0E-4;
        for i in 0..3 {
            let mut plus = los;
            plus[i] += h;
            let mut minus = los;
            minus[i] -= h;
            let numerical = (angle(&plus) - angle(&minus)) / (2.0 * h);
            assert!((numerical - gradient[i]).abs() < 1.0E-10);
        }
    }
}
