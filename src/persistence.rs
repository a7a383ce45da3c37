use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::model::{DailyTemplate, Event};

/// Key of the event collection blob.
pub const EVENTS_KEY: &str = "unfold_events";

/// Key of the template collection blob.
pub const TEMPLATES_KEY: &str = "unfold_templates";

/// String key-value storage the store saves into after every change.
pub trait Persistence: Send + Sync {
    fn get(&self, key: &str) -> io::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> io::Result<()>;
}

/// Process-local storage; nothing survives a restart.
#[derive(Default)]
pub struct MemoryBackend {
    entries: DashMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Persistence for MemoryBackend {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.entries.get(key).map(|e| e.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per key inside a data directory.
///
/// Writes go to `<key>.json.tmp`, are fsynced, then renamed over the live file,
/// so a crash mid-write leaves the previous value readable.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Open (or create) the data directory.
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> io::Result<PathBuf> {
        // Sanitize key to keep it inside the data directory
        let safe: String = key
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
            .collect();
        if safe.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty storage key"));
        }
        Ok(self.dir.join(format!("{safe}.json")))
    }
}

impl Persistence for FileBackend {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        let path = self.path_for(key)?;
        let tmp_path = path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            writer.write_all(value.as_bytes())?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp_path, &path)
    }
}

// ── Typed load/save ─────────────────────────────────────────────

/// Read and decode a collection. Missing, unreadable or malformed data is `None`.
fn load<T: DeserializeOwned>(backend: &dyn Persistence, key: &str) -> Option<Vec<T>> {
    let raw = match backend.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!("no persisted value for {key}");
            return None;
        }
        Err(e) => {
            warn!("could not read {key}: {e}");
            metrics::counter!(crate::observability::LOAD_DISCARDED_TOTAL, "key" => key.to_string())
                .increment(1);
            return None;
        }
    };
    match serde_json::from_str::<Vec<T>>(&raw) {
        Ok(items) => Some(items),
        Err(e) => {
            warn!("discarding malformed {key}: {e}");
            metrics::counter!(crate::observability::LOAD_DISCARDED_TOTAL, "key" => key.to_string())
                .increment(1);
            None
        }
    }
}

/// Encode and write a collection. Failures are logged and counted, never returned.
fn save<T: Serialize>(backend: &dyn Persistence, key: &str, items: &[T]) {
    let result = serde_json::to_string(items)
        .map_err(io::Error::from)
        .and_then(|raw| backend.set(key, &raw));
    if let Err(e) = result {
        warn!("could not save {key}: {e}");
        metrics::counter!(crate::observability::PERSIST_FAILURES_TOTAL, "key" => key.to_string())
            .increment(1);
    }
}

pub fn load_events(backend: &dyn Persistence) -> Option<Vec<Event>> {
    load(backend, EVENTS_KEY)
}

pub fn save_events(backend: &dyn Persistence, events: &[Event]) {
    save(backend, EVENTS_KEY, events)
}

pub fn load_templates(backend: &dyn Persistence) -> Option<Vec<DailyTemplate>> {
    load(backend, TEMPLATES_KEY)
}

pub fn save_templates(backend: &dyn Persistence, templates: &[DailyTemplate]) {
    save(backend, TEMPLATES_KEY, templates)
}
