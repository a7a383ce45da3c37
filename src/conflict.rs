use std::collections::HashSet;

use crate::model::{Event, EventId};

/// Two distinct events whose `[start, end)` spans overlap.
/// Back-to-back events (`a.end == b.start`) do not conflict.
pub fn conflicts(a: &Event, b: &Event) -> bool {
    a.id != b.id && a.span().overlaps(&b.span())
}

/// Whether `event` overlaps anything else in `all`.
pub fn has_conflict(event: &Event, all: &[Event]) -> bool {
    all.iter().any(|other| conflicts(event, other))
}

/// Every event in `all` that overlaps at least one other; drives the warning badge.
pub fn conflicting_ids(all: &[Event]) -> HashSet<EventId> {
    let mut ids = HashSet::new();
    for (i, a) in all.iter().enumerate() {
        for b in &all[i + 1..] {
            if conflicts(a, b) {
                ids.insert(a.id.clone());
                ids.insert(b.id.clone());
            }
        }
    }
    ids
}
