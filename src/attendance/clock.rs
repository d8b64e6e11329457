use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Source of "now" for the attendance state machine.
///
/// Check-in and check-out read the date and time of day from here, never
/// from the ambient system clock, so tests can pin the moment.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }

    /// Date and wall-clock time read from a single instant, the time
    /// truncated to whole seconds like the TIME column
    fn moment(&self) -> (NaiveDate, NaiveTime) {
        let now = self.now();
        let time = now.time();
        (now.date(), time.with_nanosecond(0).unwrap_or(time))
    }
}

/// Server local time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[cfg(test)]
pub use fixed::FixedClock;
