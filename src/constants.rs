pub use anise::constants::SPEED_OF_LIGHT_KM_S;

/// Earth angular velocity, in WGS84 frame rad/s
pub const EARTH_ANGULAR_VEL_RAD: f64 = 7.2921151467E-5;

/// Earth equatorial radius (kilometers)
pub const EARTH_EQUATORIAL_RADIUS_KM: f64 = 6378.1366;

/// WGS84 Earth Frame Ellipsoid semi-major axis (kilometers)
pub const EARTH_SEMI_MAJOR_AXIS_WGS84_KM: f64 = 6378.137;

/// WGS84 Earth Frame Ellipsoid flattening
pub const EARTH_FLATTENING_WGS84: f64 = 1.0 / 298.257223563;

/// Earth Rotation Angle at J2000 (revolutions), IERS 2010 conventions
pub const EARTH_ROTATION_ANGLE_J2000_REV: f64 = 0.7790572732640;

/// Geometry below this range (kilometers) is considered degenerate
pub const MIN_RANGE_KM: f64 = 1.0E-8;

/// Horizontal to slant range ratio under which angles are undefined
pub const MIN_HORIZONTAL_RATIO: f64 = 1.0E-10;

/// DSN X-band uplink frequency factor (221/749 turnaround, halved)
pub const DSN_X_BAND_FACTOR: f64 = 221.0 / (749.0 * 2.0);

/// DSN S-band uplink frequency factor
pub const DSN_S_BAND_FACTOR: f64 = 0.5;
