use crate::model::{EventId, TemplateId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    NotFound(EventId),
    TemplateNotFound(TemplateId),
    AlreadyExists(EventId),
    EmptyTitle,
    EmptyTemplateName,
    EmptyId,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "event not found: {id}"),
            StoreError::TemplateNotFound(id) => write!(f, "template not found: {id}"),
            StoreError::AlreadyExists(id) => write!(f, "event already exists: {id}"),
            StoreError::EmptyTitle => write!(f, "event title must not be empty"),
            StoreError::EmptyTemplateName => write!(f, "template name must not be empty"),
            StoreError::EmptyId => write!(f, "identifier must not be empty"),
        }
    }
}

impl std::error::Error for StoreError {}
