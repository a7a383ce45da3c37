use crate::model::*;
use crate::notify::ChangeKind;

use super::{Dirty, EventStore, StoreError, normalize_collection};

fn validate_title(title: &str) -> Result<(), StoreError> {
    if title.trim().is_empty() {
        return Err(StoreError::EmptyTitle);
    }
    Ok(())
}

impl EventStore {
    /// Insert a new event and re-sort. Returns its id (generated if none given).
    pub fn add(&mut self, new: NewEvent) -> Result<EventId, StoreError> {
        validate_title(&new.title).map_err(|e| self.reject("add", e))?;
        let id = match new.id {
            Some(id) if id.as_str().is_empty() => return Err(self.reject("add", StoreError::EmptyId)),
            Some(id) if self.position(&id).is_some() => {
                return Err(self.reject("add", StoreError::AlreadyExists(id)));
            }
            Some(id) => id,
            None => EventId::generate(),
        };

        self.events.push(Event {
            id: id.clone(),
            title: new.title,
            start_time: new.start_time,
            end_time: new.end_time,
            duration_minutes: derive_duration(new.start_time, new.end_time),
            icon_key: new.icon_key,
            color: new.color,
            is_completed: false,
        });
        sort_by_start(&mut self.events);
        self.commit(ChangeKind::EventAdded { id: id.clone() }, Dirty::Events);
        Ok(id)
    }

    /// Replace the display fields of an existing event and re-sort.
    /// Completion is kept unless `update.is_completed` is set.
    pub fn update(&mut self, id: &EventId, update: EventUpdate) -> Result<(), StoreError> {
        validate_title(&update.title).map_err(|e| self.reject("update", e))?;
        let pos = self
            .position(id)
            .ok_or_else(|| self.reject("update", StoreError::NotFound(id.clone())))?;

        let event = &mut self.events[pos];
        event.title = update.title;
        event.start_time = update.start_time;
        event.end_time = update.end_time;
        event.icon_key = update.icon_key;
        event.color = update.color;
        if let Some(done) = update.is_completed {
            event.is_completed = done;
        }
        event.normalize();

        sort_by_start(&mut self.events);
        self.commit(ChangeKind::EventUpdated { id: id.clone() }, Dirty::Events);
        Ok(())
    }

    /// Remove by id. Order of the rest is untouched.
    pub fn delete(&mut self, id: &EventId) -> Result<Event, StoreError> {
        let pos = self
            .position(id)
            .ok_or_else(|| self.reject("delete", StoreError::NotFound(id.clone())))?;
        let removed = self.events.remove(pos);
        self.commit(ChangeKind::EventDeleted { id: id.clone() }, Dirty::Events);
        Ok(removed)
    }

    /// Flip completion; returns the new value.
    pub fn toggle_completion(&mut self, id: &EventId) -> Result<bool, StoreError> {
        let pos = self
            .position(id)
            .ok_or_else(|| self.reject("toggle_completion", StoreError::NotFound(id.clone())))?;
        let event = &mut self.events[pos];
        event.is_completed = !event.is_completed;
        let is_completed = event.is_completed;
        self.commit(
            ChangeKind::CompletionToggled {
                id: id.clone(),
                is_completed,
            },
            Dirty::Events,
        );
        Ok(is_completed)
    }

    /// Drop every event. Templates are kept.
    pub fn clear(&mut self) {
        self.events.clear();
        self.commit(ChangeKind::EventsCleared, Dirty::Events);
    }

    /// Replace the whole collection with `events`.
    ///
    /// Ids are kept as given; an empty id, or a repeat of an id earlier in the
    /// list, gets a fresh one. Durations are re-derived and the result sorted.
    /// Returns the number of events now stored.
    pub fn import_events(&mut self, mut events: Vec<Event>) -> usize {
        normalize_collection(&mut events);
        self.events = events;
        let count = self.events.len();
        self.commit(ChangeKind::EventsImported { count }, Dirty::Events);
        count
    }
}
