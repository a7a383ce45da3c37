//! Time → vertical position on the spine.
//!
//! Every card has the same height regardless of how long its event lasts, and
//! every gap between consecutive cards has the same height regardless of how
//! much idle time it stands for. Positions are piecewise linear in the query
//! minute:
//!
//! - before the first event: 1px per minute upward from the first card's top,
//! - inside an event: the event's span stretched over `card_height`,
//! - between two events: the idle span folded into `card_gap`,
//! - after the last event: 1px per minute downward from the last card's bottom.

use std::collections::BTreeSet;

use crate::clock::{ClockTime, Minutes};
use crate::model::{Event, EventId, Span};

/// Height reserved for the day-start and day-end icons.
pub const MARKER_SIZE: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub card_height: f64,
    pub card_gap: f64,
    /// Space above the first card (day-start icon).
    pub start_offset: f64,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            card_height: 120.0,
            card_gap: 20.0,
            start_offset: 40.0,
        }
    }
}

impl Layout {
    pub fn card_top(&self, index: usize) -> f64 {
        index as f64 * (self.card_height + self.card_gap) + self.start_offset
    }

    pub fn card_bottom(&self, index: usize) -> f64 {
        self.card_top(index) + self.card_height
    }

    /// Top edge of the day-start icon.
    pub fn day_start_y(&self) -> f64 {
        self.start_offset - MARKER_SIZE
    }

    /// Top edge of the day-end icon, one slot below the last card.
    pub fn day_end_y(&self, card_count: usize) -> f64 {
        self.card_top(card_count)
    }
}

/// Vertical position of minute `m` for the given events (any order).
pub fn time_to_y(layout: &Layout, m: Minutes, events: &[Event]) -> f64 {
    Timeline::new(*layout, events).y(m)
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourMarker {
    pub hour: u32,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardPlacement {
    pub id: EventId,
    pub top: f64,
    pub bottom: f64,
}

/// Every marker the spine needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Markers {
    pub day_start: f64,
    pub day_end: f64,
    pub now: f64,
    pub focus: f64,
    pub hours: Vec<HourMarker>,
}

/// A snapshot sorted once for repeated position queries.
#[derive(Debug, Clone)]
pub struct Timeline<'a> {
    layout: Layout,
    /// Stored order, as handed in.
    events: &'a [Event],
    /// Display order: stable ascending by start.
    sorted: Vec<&'a Event>,
}

impl<'a> Timeline<'a> {
    pub fn new(layout: Layout, events: &'a [Event]) -> Self {
        let mut sorted: Vec<&Event> = events.iter().collect();
        sorted.sort_by_key(|e| e.start_time);
        Self {
            layout,
            events,
            sorted,
        }
    }

    pub fn y(&self, m: Minutes) -> f64 {
        let l = &self.layout;
        let Some(first) = self.sorted.first() else {
            return l.start_offset;
        };

        let first_start = first.start_time.minutes();
        if m <= first_start {
            return l.start_offset - f64::from(first_start - m);
        }

        for (i, event) in self.sorted.iter().enumerate() {
            let Span { start: s, end: e } = event.span();
            let y_start = l.card_top(i);
            let y_end = y_start + l.card_height;

            if s <= m && m <= e {
                let len = if e == s { 1 } else { e - s };
                let progress = f64::from(m - s) / f64::from(len);
                return y_start + progress * l.card_height;
            }

            if let Some(next) = self.sorted.get(i + 1) {
                let next_start = next.start_time.minutes();
                if m > e && m < next_start {
                    let progress = f64::from(m - e) / f64::from(next_start - e);
                    return y_end + progress * l.card_gap;
                }
            }
        }

        let last_index = self.sorted.len() - 1;
        let last_end = self.sorted[last_index].end_time.minutes();
        l.card_bottom(last_index) + f64::from(m - last_end)
    }

    pub fn y_at(&self, t: ClockTime) -> f64 {
        self.y(t.minutes())
    }

    /// Cards in display order.
    pub fn cards(&self) -> Vec<CardPlacement> {
        self.sorted
            .iter()
            .enumerate()
            .map(|(i, e)| CardPlacement {
                id: e.id.clone(),
                top: self.layout.card_top(i),
                bottom: self.layout.card_bottom(i),
            })
            .collect()
    }

    /// One label per distinct start hour, hidden above the first card slot.
    pub fn hour_markers(&self) -> Vec<HourMarker> {
        let tops: BTreeSet<ClockTime> =
            self.events.iter().map(|e| e.start_time.floor_hour()).collect();
        tops.into_iter()
            .map(|top| HourMarker {
                hour: top.hour(),
                y: self.y_at(top),
            })
            .filter(|marker| marker.y >= self.layout.start_offset)
            .collect()
    }

    /// Line snapped to the start of the first incomplete event (stored order),
    /// or to the day-end icon once everything is done.
    pub fn focus_y(&self) -> f64 {
        match self.events.iter().find(|e| !e.is_completed) {
            Some(next) => self.y_at(next.start_time),
            None => self.layout.day_end_y(self.events.len()),
        }
    }

    pub fn markers(&self, now: ClockTime) -> Markers {
        Markers {
            day_start: self.layout.day_start_y(),
            day_end: self.layout.day_end_y(self.events.len()),
            now: self.y_at(now),
            focus: self.focus_y(),
            hours: self.hour_markers(),
        }
    }
}
