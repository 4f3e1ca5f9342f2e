use std::fmt;

pub const MICROS_PER_SEC: u32 = 1_000_000;

/// Capture timestamp with microsecond resolution, as stored in pcap files.
///
/// Partial reimplementation of std::time types, panic-free and matching
/// our needs:
///   - use micros instead of nanos, avoid casts
///   - expose fields
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct Timestamp {
    pub secs: u32,
    pub micros: u32,
}

impl Timestamp {
    /// Build Timestamp from secs and micros
    pub fn new(secs: u32, micros: u32) -> Timestamp {
        Timestamp { secs, micros }
    }

    /// Signed difference `self - earlier` in microseconds.
    ///
    /// Negative when `self` precedes `earlier` (out-of-order capture).
    /// Computed in i64, so any pair of 32-bit timestamps is representable.
    #[inline]
    pub fn delta_micros(self, earlier: Timestamp) -> i64 {
        (i64::from(self.secs) - i64::from(earlier.secs)) * i64::from(MICROS_PER_SEC)
            + (i64::from(self.micros) - i64::from(earlier.micros))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.secs, self.micros)
    }
}

#[cfg(test)]
mod tests {
    use super::Timestamp;

    #[test]
    fn delta_same_second() {
        let t1 = Timestamp::new(1234, 5678);
        let t2 = Timestamp::new(1234, 6789);
        assert_eq!(t2.delta_micros(t1), 1111);
    }

    #[test]
    fn delta_micro_borrow() {
        let t1 = Timestamp::new(1, 500_000);
        let t2 = Timestamp::new(2, 100_000);
        assert_eq!(t2.delta_micros(t1), 600_000);
    }

    #[test]
    fn delta_negative() {
        let t1 = Timestamp::new(10, 0);
        let t2 = Timestamp::new(9, 999_999);
        assert_eq!(t2.delta_micros(t1), -1);
    }

    #[test]
    fn delta_identical() {
        let t = Timestamp::new(42, 42);
        assert_eq!(t.delta_micros(t), 0);
    }
}
