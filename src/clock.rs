use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Minutes since midnight, the arithmetic type for time-of-day math.
pub type Minutes = i32;

pub const MINUTES_PER_DAY: Minutes = 24 * 60;

const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// Last second counted by the end-of-day countdown (23:59:59).
const END_OF_DAY_SECS: u32 = SECONDS_PER_DAY - 1;

/// Wall-clock time of day at minute resolution, `[00:00, 23:59]`.
///
/// Records carry it as `"HH:MM"` text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u16);

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime(0);

    /// Build from hour/minute. `None` when out of range.
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self((hour * 60 + minute) as u16))
        } else {
            None
        }
    }

    /// Build from minutes since midnight. `None` outside `[0, 1440)`.
    pub fn from_minutes(minutes: Minutes) -> Option<Self> {
        if (0..MINUTES_PER_DAY).contains(&minutes) {
            Some(Self(minutes as u16))
        } else {
            None
        }
    }

    /// Truncates seconds.
    pub fn from_naive(t: NaiveTime) -> Self {
        Self((t.hour() * 60 + t.minute()) as u16)
    }

    pub fn minutes(self) -> Minutes {
        Minutes::from(self.0)
    }

    pub fn hour(self) -> u32 {
        u32::from(self.0) / 60
    }

    pub fn minute(self) -> u32 {
        u32::from(self.0) % 60
    }

    /// Top of this time's hour (`HH:00`).
    pub fn floor_hour(self) -> Self {
        Self(self.0 - self.0 % 60)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTimeError(String);

impl fmt::Display for ParseTimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid time of day {:?}: expected HH:MM", self.0)
    }
}

impl std::error::Error for ParseTimeError {}

impl FromStr for ClockTime {
    type Err = ParseTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseTimeError(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(err)?;
        let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if h.is_empty() || h.len() > 2 || m.len() != 2 || !digits(h) || !digits(m) {
            return Err(err());
        }
        let hour: u32 = h.parse().map_err(|_| err())?;
        let minute: u32 = m.parse().map_err(|_| err())?;
        Self::new(hour, minute).ok_or_else(err)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ParseTimeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ClockTime> for String {
    fn from(t: ClockTime) -> Self {
        t.to_string()
    }
}

// ── Clock collaborator ───────────────────────────────────────────

/// Source of the current wall-clock time of day.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveTime;
}

/// Local wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveTime {
        chrono::Local::now().time()
    }
}

/// Simulated clock for deterministic runs. Second resolution, wraps at midnight.
#[derive(Debug)]
pub struct FixedClock {
    secs: AtomicU32,
}

impl FixedClock {
    pub fn at(hour: u32, minute: u32, second: u32) -> Self {
        Self {
            secs: AtomicU32::new((hour * 3600 + minute * 60 + second) % SECONDS_PER_DAY),
        }
    }

    pub fn set(&self, t: NaiveTime) {
        self.secs.store(t.num_seconds_from_midnight(), Ordering::Relaxed);
    }

    pub fn advance_secs(&self, secs: u32) {
        let cur = self.secs.load(Ordering::Relaxed);
        self.secs
            .store((cur + secs % SECONDS_PER_DAY) % SECONDS_PER_DAY, Ordering::Relaxed);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveTime {
        let secs = self.secs.load(Ordering::Relaxed);
        NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap_or(NaiveTime::MIN)
    }
}

// ── End-of-day countdown ────────────────────────────────────────

/// Time left until 23:59:59.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl Countdown {
    pub fn until_end_of_day(now: NaiveTime) -> Self {
        let left = END_OF_DAY_SECS.saturating_sub(now.num_seconds_from_midnight());
        Self {
            hours: left / 3600,
            minutes: (left % 3600) / 60,
            seconds: left % 60,
        }
    }

    pub fn total_seconds(&self) -> u32 {
        self.hours * 3600 + self.minutes * 60 + self.seconds
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} hrs, {} min, {} secs", self.hours, self.minutes, self.seconds)
    }
}
