mod error;
mod mutations;
mod queries;
mod templates;
#[cfg(test)]
mod tests;

pub use error::StoreError;

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::model::*;
use crate::notify::{ChangeHub, ChangeKind, StoreChange};
use crate::persistence::{self, Persistence};

/// Which persisted collection a mutation dirtied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dirty {
    Events,
    Templates,
}

/// Owns the day's events and the saved templates.
///
/// Every successful mutation bumps `version`, persists the collection it
/// changed (best effort) and broadcasts a [`StoreChange`]. Events are kept in
/// ascending start order after add, update, import and template apply.
pub struct EventStore {
    events: Vec<Event>,
    templates: Vec<DailyTemplate>,
    version: u64,
    backend: Arc<dyn Persistence>,
    pub notify: Arc<ChangeHub>,
}

impl EventStore {
    /// Load both collections from `backend`. Missing or malformed events fall
    /// back to the seed day; missing or malformed templates to none.
    pub fn open(backend: Arc<dyn Persistence>, notify: Arc<ChangeHub>) -> Self {
        let events = match persistence::load_events(backend.as_ref()) {
            Some(events) => {
                debug!("loaded {} events", events.len());
                events
            }
            None => {
                info!("no saved events, starting from the seed day");
                seed_events()
            }
        };
        let templates = persistence::load_templates(backend.as_ref()).unwrap_or_default();
        let (store, reassigned) = Self::with_state(backend, notify, events, templates);
        if reassigned > 0 {
            // Write the fresh ids back so they stay stable across runs.
            info!("reassigned {reassigned} event ids on load");
            persistence::save_events(store.backend.as_ref(), &store.events);
        }
        store
    }

    /// A store holding exactly `events`, nothing loaded, nothing persisted yet.
    pub fn with_events(
        backend: Arc<dyn Persistence>,
        notify: Arc<ChangeHub>,
        events: Vec<Event>,
    ) -> Self {
        Self::with_state(backend, notify, events, Vec::new()).0
    }

    fn with_state(
        backend: Arc<dyn Persistence>,
        notify: Arc<ChangeHub>,
        mut events: Vec<Event>,
        templates: Vec<DailyTemplate>,
    ) -> (Self, usize) {
        let reassigned = normalize_collection(&mut events);
        metrics::gauge!(crate::observability::EVENTS_ACTIVE).set(events.len() as f64);
        metrics::gauge!(crate::observability::TEMPLATES_ACTIVE).set(templates.len() as f64);
        let store = Self {
            events,
            templates,
            version: 0,
            backend,
            notify,
        };
        (store, reassigned)
    }

    /// Bump version + persist + notify in one call.
    fn commit(&mut self, kind: ChangeKind, dirty: Dirty) {
        self.version += 1;
        match dirty {
            Dirty::Events => {
                persistence::save_events(self.backend.as_ref(), &self.events);
                metrics::gauge!(crate::observability::EVENTS_ACTIVE).set(self.events.len() as f64);
            }
            Dirty::Templates => {
                persistence::save_templates(self.backend.as_ref(), &self.templates);
                metrics::gauge!(crate::observability::TEMPLATES_ACTIVE)
                    .set(self.templates.len() as f64);
            }
        }
        metrics::counter!(crate::observability::MUTATIONS_TOTAL, "op" => kind.label()).increment(1);
        debug!(version = self.version, op = kind.label(), "store changed");
        self.notify.send(StoreChange {
            version: self.version,
            kind,
        });
    }

    /// Count a validation failure and hand the error back.
    fn reject(&self, op: &'static str, err: StoreError) -> StoreError {
        metrics::counter!(crate::observability::MUTATIONS_REJECTED_TOTAL, "op" => op).increment(1);
        debug!("{op} rejected: {err}");
        err
    }

    fn position(&self, id: &EventId) -> Option<usize> {
        self.events.iter().position(|e| &e.id == id)
    }
}

/// Re-derive durations, give empty or repeated ids fresh ones, sort by start.
///
/// The first holder of a repeated id keeps it. Returns how many ids changed.
fn normalize_collection(events: &mut [Event]) -> usize {
    let mut reassigned = 0;
    let mut seen = HashSet::with_capacity(events.len());
    for event in events.iter_mut() {
        event.normalize();
        if event.id.as_str().is_empty() || !seen.insert(event.id.clone()) {
            let fresh = EventId::generate();
            warn!("reassigning id {:?} -> {fresh}", event.id.as_str());
            event.id = fresh.clone();
            seen.insert(fresh);
            reassigned += 1;
        }
    }
    sort_by_start(events);
    reassigned
}
