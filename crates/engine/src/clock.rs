//! Wall-clock source for loan timestamps.

use chrono::{Local, NaiveDateTime, Timelike};

/// Source of "now" for borrow timestamps.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Session-local wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock frozen at a given instant (tests, replays).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Drop seconds and sub-second precision.
pub fn truncate_to_minute(at: NaiveDateTime) -> NaiveDateTime {
    at.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn truncation_keeps_hour_and_minute() {
        let at = NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_milli_opt(14, 7, 59, 999))
            .unwrap();
        let truncated = truncate_to_minute(at);
        assert_eq!((truncated.hour(), truncated.minute()), (14, 7));
        assert_eq!((truncated.second(), truncated.nanosecond()), (0, 0));
        assert_eq!(truncated.date(), at.date());
    }

    #[test]
    fn fixed_clock_is_stable() {
        let at = NaiveDate::from_ymd_opt(2024, 1, 2)
            .and_then(|d| d.and_hms_opt(3, 4, 5))
            .unwrap();
        let clock = FixedClock(at);
        assert_eq!(clock.now(), clock.now());
    }
}
