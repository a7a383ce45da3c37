use tracing::info;

use crate::model::*;
use crate::notify::ChangeKind;

use super::{Dirty, EventStore, StoreError};

impl EventStore {
    /// Snapshot the display fields of every event, in stored order, as a new template.
    pub fn save_as_template(&mut self, name: &str) -> Result<TemplateId, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(self.reject("save_template", StoreError::EmptyTemplateName));
        }
        let id = TemplateId::generate();
        self.templates.push(DailyTemplate {
            id: id.clone(),
            name: name.to_string(),
            events: self.events.iter().map(Event::to_template).collect(),
        });
        info!("saved template {name:?} ({id}) with {} events", self.events.len());
        self.commit(ChangeKind::TemplateSaved { id: id.clone() }, Dirty::Templates);
        Ok(id)
    }

    /// Replace the events with fresh instances of a saved template.
    /// Returns the number of events created.
    pub fn apply_template(&mut self, id: &TemplateId) -> Result<usize, StoreError> {
        let template = self
            .template(id)
            .ok_or_else(|| self.reject("apply_template", StoreError::TemplateNotFound(id.clone())))?;
        let mut events: Vec<Event> = template.events.iter().map(EventTemplate::instantiate).collect();
        sort_by_start(&mut events);
        let count = events.len();
        self.events = events;
        self.commit(ChangeKind::TemplateApplied { id: id.clone(), count }, Dirty::Events);
        Ok(count)
    }

    pub fn delete_template(&mut self, id: &TemplateId) -> Result<DailyTemplate, StoreError> {
        let pos = self
            .templates
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| self.reject("delete_template", StoreError::TemplateNotFound(id.clone())))?;
        let removed = self.templates.remove(pos);
        self.commit(ChangeKind::TemplateDeleted { id: id.clone() }, Dirty::Templates);
        Ok(removed)
    }
}
