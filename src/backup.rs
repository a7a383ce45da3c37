//! JSON backup files: export the whole collection, import all-or-nothing.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{info, warn};

use crate::model::Event;
use crate::store::EventStore;

#[derive(Debug)]
pub enum ImportError {
    Io(io::Error),
    /// Not JSON at all.
    Malformed(String),
    /// JSON, but the top-level value is not a sequence.
    NotASequence,
    /// A sequence element that is not an event record.
    InvalidRecord { index: usize, reason: String },
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::Io(e) => write!(f, "could not read backup file: {e}"),
            ImportError::Malformed(_) => {
                write!(f, "error parsing file, please make sure it is valid JSON")
            }
            ImportError::NotASequence => {
                write!(f, "invalid file format, please choose a valid unfold backup")
            }
            ImportError::InvalidRecord { index, reason } => {
                write!(f, "invalid event at position {index}: {reason}")
            }
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ImportError {
    fn from(e: io::Error) -> Self {
        ImportError::Io(e)
    }
}

/// `unfold-backup-YYYY-MM-DD.json`
pub fn default_file_name(date: NaiveDate) -> String {
    format!("unfold-backup-{}.json", date.format("%Y-%m-%d"))
}

/// Pretty-printed JSON array of every event.
pub fn export_json(events: &[Event]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(events)
}

pub fn export_to_file(path: &Path, events: &[Event]) -> io::Result<()> {
    let json = export_json(events).map_err(io::Error::from)?;
    fs::write(path, json)?;
    info!("exported {} events to {}", events.len(), path.display());
    Ok(())
}

/// Decode a backup. Every element must be a valid event or nothing is returned.
pub fn parse_backup(text: &str) -> Result<Vec<Event>, ImportError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| ImportError::Malformed(e.to_string()))?;
    let Value::Array(items) = value else {
        return Err(ImportError::NotASequence);
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<Event>(item).map_err(|e| ImportError::InvalidRecord {
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Parse `text` and, only if the whole file is valid, replace the store's events.
pub fn import_json(store: &mut EventStore, text: &str) -> Result<usize, ImportError> {
    match parse_backup(text) {
        Ok(events) => Ok(store.import_events(events)),
        Err(e) => {
            warn!("backup import rejected: {e}");
            metrics::counter!(crate::observability::IMPORTS_REJECTED_TOTAL).increment(1);
            Err(e)
        }
    }
}

pub fn import_file(store: &mut EventStore, path: &Path) -> Result<usize, ImportError> {
    let text = fs::read_to_string(path)?;
    let count = import_json(store, &text)?;
    info!("imported {count} events from {}", path.display());
    Ok(count)
}
