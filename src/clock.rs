//! Time source abstraction.
//!
//! Temporal trigger evaluation and every audit timestamp flow through a
//! [`Clock`] so tests can pin "now" to a fixed instant.

use jiff::civil::DateTime;

/// Supplies the current wall-clock date and time.
///
/// The core works in civil (zone-less) time; resolving the venue's time
/// zone is the caller's concern.
pub trait Clock: Send + Sync {
    /// Returns the current date and time.
    fn now(&self) -> DateTime;
}

/// Clock backed by the system time zone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime {
        jiff::Zoned::now().datetime()
    }
}

/// Clock pinned to a fixed instant, for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime);

impl Clock for FixedClock {
    fn now(&self) -> DateTime {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    #[test]
    fn fixed_clock_returns_pinned_instant() {
        let instant = date(2026, 3, 14).at(12, 30, 0, 0);
        let clock = FixedClock(instant);

        assert_eq!(clock.now(), instant);
        assert_eq!(clock.now(), instant);
    }
}
