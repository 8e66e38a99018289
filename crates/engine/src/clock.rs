//! Time sources for the engine.
//!
//! Dayparting windows and spend entry dates are expressed in the service's
//! local time, so the engine never reads the host clock directly: it asks an
//! injected [`Clock`].

use std::{
    fmt::Debug,
    sync::{Mutex, PoisonError},
};

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;

/// A source of local wall-clock time.
pub trait Clock: Debug + Send + Sync {
    /// Current local date and time.
    fn now(&self) -> NaiveDateTime;

    /// Current local calendar date.
    fn today(&self) -> NaiveDate {
        self.now().date()
    }

    /// Current local time of day.
    fn time_of_day(&self) -> NaiveTime {
        self.now().time()
    }
}

/// Wall clock, either in a configured IANA timezone or in the host zone.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock {
    timezone: Option<Tz>,
}

impl SystemClock {
    pub fn new(timezone: Option<Tz>) -> Self {
        Self { timezone }
    }

    /// Build a clock from an IANA name such as `Europe/Rome`.
    pub fn with_timezone_name(name: &str) -> Result<Self, String> {
        let tz: Tz = name
            .parse()
            .map_err(|_| format!("unknown timezone: {name}"))?;
        Ok(Self::new(Some(tz)))
    }

    pub fn timezone(&self) -> Option<Tz> {
        self.timezone
    }
}

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        match self.timezone {
            Some(tz) => Utc::now().with_timezone(&tz).naive_local(),
            None => Local::now().naive_local(),
        }
    }
}

/// A manually driven clock, for tests and dry runs.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Convenience constructor: `date` at `hour:minute`.
    pub fn at(date: NaiveDate, hour: u32, minute: u32) -> Option<Self> {
        date.and_hms_opt(hour, minute, 0).map(Self::new)
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    /// Keep the date, move the time of day.
    pub fn set_time(&self, time: NaiveTime) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now = now.date().and_time(time);
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
