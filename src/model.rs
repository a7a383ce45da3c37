use std::fmt;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::clock::{ClockTime, Minutes};

/// Stored duration when `end <= start`.
pub const FALLBACK_DURATION_MINUTES: Minutes = 30;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Fresh time-ordered id.
            pub fn generate() -> Self {
                Self(Ulid::new().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Opaque event identifier. Generated ids are ULIDs; imported ids are kept verbatim.
    EventId
);

string_id!(
    /// Opaque daily-template identifier.
    TemplateId
);

/// Half-open minute interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: Minutes,
    pub end: Minutes,
}

impl Span {
    pub fn new(start: Minutes, end: Minutes) -> Self {
        Self { start, end }
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && self.end > other.start
    }
}

/// `end - start`, or the fallback when the span is empty or inverted.
pub fn derive_duration(start: ClockTime, end: ClockTime) -> Minutes {
    let d = end.minutes() - start.minutes();
    if d > 0 { d } else { FALLBACK_DURATION_MINUTES }
}

/// One scheduled block on the day timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    #[serde(default)]
    pub duration_minutes: Minutes,
    #[serde(alias = "iconName")]
    pub icon_key: String,
    pub color: String,
    #[serde(default)]
    pub is_completed: bool,
}

impl Event {
    pub fn span(&self) -> Span {
        Span::new(self.start_time.minutes(), self.end_time.minutes())
    }

    /// Recompute the derived duration from the current start/end.
    pub fn normalize(&mut self) {
        self.duration_minutes = derive_duration(self.start_time, self.end_time);
    }

    pub fn to_template(&self) -> EventTemplate {
        EventTemplate {
            title: self.title.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            icon_key: self.icon_key.clone(),
            color: self.color.clone(),
        }
    }
}

/// Stable ascending sort by start minute.
pub fn sort_by_start(events: &mut [Event]) {
    events.sort_by_key(|e| e.start_time);
}

/// Input for `add`. A missing id is generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub id: Option<EventId>,
    pub title: String,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub icon_key: String,
    pub color: String,
}

/// Input for `update`. `is_completed: None` keeps the stored flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventUpdate {
    pub title: String,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub icon_key: String,
    pub color: String,
    pub is_completed: Option<bool>,
}

impl From<&Event> for EventUpdate {
    fn from(e: &Event) -> Self {
        Self {
            title: e.title.clone(),
            start_time: e.start_time,
            end_time: e.end_time,
            icon_key: e.icon_key.clone(),
            color: e.color.clone(),
            is_completed: None,
        }
    }
}

/// The display fields of an event, detached from any instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTemplate {
    pub title: String,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    #[serde(alias = "iconName")]
    pub icon_key: String,
    pub color: String,
}

impl EventTemplate {
    /// Materialise as a fresh, not-completed event.
    pub fn instantiate(&self) -> Event {
        Event {
            id: EventId::generate(),
            title: self.title.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            duration_minutes: derive_duration(self.start_time, self.end_time),
            icon_key: self.icon_key.clone(),
            color: self.color.clone(),
            is_completed: false,
        }
    }
}

/// A named, reusable day layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTemplate {
    pub id: TemplateId,
    pub name: String,
    /// Creation-time order, never re-sorted.
    pub events: Vec<EventTemplate>,
}

/// Collection used when nothing usable is persisted.
pub fn seed_events() -> Vec<Event> {
    let seed = [
        ("1", "Morning Workout", (7, 30), (8, 30), "Activity", "var(--accent-pink)"),
        ("2", "Focus Work", (9, 0), (11, 0), "Code", "var(--accent-blue)"),
        ("3", "Team Meeting", (11, 30), (12, 30), "MessageSquare", "var(--accent-orange)"),
        ("4", "Strategy Session", (14, 0), (15, 30), "Target", "var(--accent-purple)"),
    ];
    seed.into_iter()
        .filter_map(|(id, title, (sh, sm), (eh, em), icon, color)| {
            let start_time = ClockTime::new(sh, sm)?;
            let end_time = ClockTime::new(eh, em)?;
            Some(Event {
                id: EventId::from(id),
                title: title.to_string(),
                start_time,
                end_time,
                duration_minutes: derive_duration(start_time, end_time),
                icon_key: icon.to_string(),
                color: color.to_string(),
                is_completed: false,
            })
        })
        .collect()
}
