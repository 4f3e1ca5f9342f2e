use std::time::Duration;

use log::warn;

use libreplay_tools::Timestamp;

/// Reproduces the original inter-arrival timing between replayed records.
///
/// Holds the previous record's capture timestamp; the first record of a
/// session is never delayed, even if its timestamp is non-zero.
#[derive(Debug, Default)]
pub struct Pacer {
    previous: Option<Timestamp>,
}

impl Pacer {
    pub fn new() -> Self {
        Pacer::default()
    }

    /// Delay to apply before sending the record captured at `ts`.
    ///
    /// An out-of-order timestamp yields a negative delta; that is clamped to
    /// zero rather than interpreted as a huge unsigned sleep.
    pub fn next_delay(&self, ts: Timestamp) -> Duration {
        let Some(previous) = self.previous else {
            return Duration::ZERO;
        };
        let delta = ts.delta_micros(previous);
        if delta < 0 {
            warn!("non-monotonic capture timestamps ({previous} then {ts}), not delaying");
            Duration::ZERO
        } else {
            Duration::from_micros(delta as u64)
        }
    }

    /// Record `ts` as the reference point for the next delay computation.
    /// Must be called exactly once per record, after the delay has elapsed.
    pub fn advance(&mut self, ts: Timestamp) {
        self.previous = Some(ts);
    }
}
