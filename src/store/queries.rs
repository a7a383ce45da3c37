use std::collections::HashSet;

use crate::conflict;
use crate::geometry::{Layout, Timeline};
use crate::model::*;

use super::EventStore;

impl EventStore {
    /// Events in stored order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn get(&self, id: &EventId) -> Option<&Event> {
        self.events.iter().find(|e| &e.id == id)
    }

    pub fn templates(&self) -> &[DailyTemplate] {
        &self.templates
    }

    pub fn template(&self, id: &TemplateId) -> Option<&DailyTemplate> {
        self.templates.iter().find(|t| &t.id == id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of committed mutations since this store was opened.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Owned copy of the events, for callers that must not hold a borrow.
    pub fn snapshot(&self) -> Vec<Event> {
        self.events.clone()
    }

    pub fn timeline(&self, layout: Layout) -> Timeline<'_> {
        Timeline::new(layout, &self.events)
    }

    pub fn conflicting_ids(&self) -> HashSet<EventId> {
        conflict::conflicting_ids(&self.events)
    }

    pub fn has_conflict(&self, id: &EventId) -> bool {
        self.get(id)
            .is_some_and(|e| conflict::has_conflict(e, &self.events))
    }
}
