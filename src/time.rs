use crate::prelude::{Duration, Epoch};

/// [TimeTag] is an [Epoch] on the nanosecond grid, refined by a sub-grid
/// offset expressed in seconds. Light time tolerances are far below one
/// nanosecond, so every instant manipulated by the solver is a [TimeTag].
/// The offset is always kept within [0, 1ns[.
#[derive(Debug, Copy, Clone)]
pub struct TimeTag {
    /// Coarse [Epoch]
    epoch: Epoch,
    /// Offset to coarse [Epoch], in seconds
    offset_s: f64,
}

impl PartialEq for TimeTag {
    fn eq(&self, rhs: &Self) -> bool {
        self.seconds_since(rhs) == 0.0
    }
}

impl std::fmt::Display for TimeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} (+{:.3E}s)", self.epoch, self.offset_s)
    }
}

impl From<Epoch> for TimeTag {
    fn from(epoch: Epoch) -> Self {
        Self::new(epoch)
    }
}

impl TimeTag {
    /// Builds a new [TimeTag] exactly at this [Epoch].
    pub fn new(epoch: Epoch) -> Self {
        Self {
            epoch,
            offset_s: 0.0,
        }
    }

    /// Coarse [Epoch] (sub-nanosecond offset discarded).
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Sub-nanosecond offset, in seconds.
    pub fn offset_s(&self) -> f64 {
        self.offset_s
    }

    /// Returns a new [TimeTag] shifted by `dt_s` seconds.
    pub fn shifted(&self, dt_s: f64) -> Self {
        let total_s = self.offset_s + dt_s;
        let whole_ns = (total_s * 1.0E9).floor();
        let mut offset_s = total_s - whole_ns * 1.0E-9;

        let mut epoch = self.epoch + Duration::from_total_nanoseconds(whole_ns as i128);

        // floor() rounding on large shifts
        if offset_s < 0.0 {
            epoch = epoch - Duration::from_total_nanoseconds(1);
            offset_s += 1.0E-9;
        } else if offset_s >= 1.0E-9 {
            epoch = epoch + Duration::from_total_nanoseconds(1);
            offset_s -= 1.0E-9;
        }

        Self { epoch, offset_s }
    }

    /// Elapsed time from `rhs` to `self`, in seconds.
    pub fn seconds_since(&self, rhs: &Self) -> f64 {
        (self.epoch - rhs.epoch).to_seconds() + (self.offset_s - rhs.offset_s)
    }
}

#[cfg(test)]
mod test {
    use super::TimeTag;
    use crate::prelude::Epoch;
    use std::str::FromStr;

    #[test]
    fn sub_nanosecond_shifts() {
        let t0 = Epoch::from_str("2020-06-25T00:00:00 UTC").unwrap();
        let tag = TimeTag::new(t0);

        let light_time_s = 1000.0 / 299792.458;
        let shifted = tag.shifted(light_time_s);

        assert!((shifted.seconds_since(&tag) - light_time_s).abs() < 1.0E-15);
        assert!(shifted.offset_s() >= 0.0 && shifted.offset_s() < 1.0E-9);

        let back = shifted.shifted(-light_time_s);
        assert!(back.seconds_since(&tag).abs() < 1.0E-15);
    }

    #[test]
    fn negative_shifts() {
        let t0 = Epoch::from_str("2020-06-25T00:00:00 UTC").unwrap();
        let tag = TimeTag::new(t0).shifted(-2.5E-10);

        assert!(tag.offset_s() >= 0.0);
        assert!((tag.seconds_since(&TimeTag::new(t0)) + 2.5E-10).abs() < 1.0E-18);
    }

    #[test]
    fn equality() {
        let t0 = Epoch::from_str("2020-06-25T00:00:00 UTC").unwrap();
        let tag = TimeTag::new(t0);
        assert_eq!(tag, TimeTag::from(t0));
        assert_ne!(tag, tag.shifted(1.0E-12));
        assert_eq!(tag.shifted(60.0).shifted(-60.0).epoch(), t0);
    }
}
