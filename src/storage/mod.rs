//! Filesystem event store.
//!
//! Each event aggregate is persisted as one pretty-printed JSON document under
//! `<data_dir>/events/<event_id>.json`. Writes go through a temp file and
//! rename so a crash mid-write never leaves a truncated document behind.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::models::{EntityId, Event, EventId};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no event with id {0}")]
    EventNotFound(EventId),
}

/// Handle to the on-disk event store.
#[derive(Debug, Clone)]
pub struct EventStore {
    data_dir: PathBuf,
}

impl EventStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn events_dir(&self) -> PathBuf {
        self.data_dir.join("events")
    }

    fn event_path(&self, id: &EventId) -> PathBuf {
        self.events_dir().join(format!("{}.json", id))
    }

    /// Persist an event, creating the store directory on first use.
    pub fn save(&self, event: &Event) -> Result<(), StorageError> {
        fs::create_dir_all(self.events_dir())?;
        let path = self.event_path(&event.id);
        let json = serde_json::to_string_pretty(event)?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;

        debug!(event_id = %event.id, path = %path.display(), "event saved");
        Ok(())
    }

    pub fn load(&self, id: &EventId) -> Result<Event, StorageError> {
        let path = self.event_path(id);
        if !path.exists() {
            return Err(StorageError::EventNotFound(id.clone()));
        }
        let json = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn delete(&self, id: &EventId) -> Result<(), StorageError> {
        let path = self.event_path(id);
        if !path.exists() {
            return Err(StorageError::EventNotFound(id.clone()));
        }
        fs::remove_file(&path)?;
        info!(event_id = %id, "event deleted");
        Ok(())
    }

    /// Ids of every stored event, in id order. Files that aren't event
    /// documents are ignored.
    pub fn list(&self) -> Result<Vec<EventId>, StorageError> {
        let dir = self.events_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(EntityId::from(stem));
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Load every stored event.
    pub fn load_all(&self) -> Result<Vec<Event>, StorageError> {
        self.list()?.iter().map(|id| self.load(id)).collect()
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
