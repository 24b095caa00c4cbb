use std::fmt;

use chrono::{DateTime, TimeZone, Utc};

/// Source of "now" for everything time-dependent in a session: identity
/// defaults, save ids and creation timestamps.  Injected so independent
/// sessions and tests control time explicitly.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// System clock backed by the real wall clock.  The default for production
/// use.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a fixed instant, for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        FixedClock { instant }
    }

    /// Clock pinned to the given Unix timestamp in milliseconds.
    pub fn at_millis(millis: i64) -> Self {
        FixedClock {
            instant: Utc.timestamp_millis_opt(millis).single().unwrap_or_default(),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_is_pinned() {
        let clock = FixedClock::at_millis(1_714_140_000_000);
        assert_eq!(clock.now().timestamp_millis(), 1_714_140_000_000);
        assert_eq!(clock.now(), clock.now());
    }
}
