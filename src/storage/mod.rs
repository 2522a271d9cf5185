//! Player statistics store.
//!
//! The statistics document is read from disk on first use and shared
//! read-only for the rest of the process lifetime. There is no reload: a
//! changed file is picked up on restart.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::PlayerRecord;

/// Errors that can occur while loading the statistics document.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Player data file not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The statistics document, keyed by player id.
///
/// Records stay as raw JSON so one malformed entry can be skipped without
/// rejecting the whole document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerDocument {
    #[serde(default)]
    pub players: serde_json::Map<String, Value>,
}

impl PlayerDocument {
    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Look up a well-formed record by handle, ignoring case.
    pub fn find_by_handle(&self, handle: &str) -> Option<PlayerRecord> {
        let wanted = handle.trim().to_lowercase();
        self.players
            .values()
            .filter(|v| {
                v.get("handle")
                    .and_then(Value::as_str)
                    .is_some_and(|h| h.to_lowercase() == wanted)
            })
            .find_map(|v| PlayerRecord::from_value(v).ok())
    }
}

/// Read and parse the statistics document.
pub fn load_document(path: &Path) -> Result<PlayerDocument, StorageError> {
    let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => StorageError::NotFound(path.to_path_buf()),
        _ => StorageError::Io(e),
    })?;

    let document: PlayerDocument = serde_json::from_str(&contents)?;
    info!("Loaded {} player records from {:?}", document.len(), path);
    Ok(document)
}

/// Lazily-loaded, read-only player store.
#[derive(Debug)]
pub struct PlayerStore {
    path: PathBuf,
    document: OnceCell<Arc<PlayerDocument>>,
}

impl PlayerStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            document: OnceCell::new(),
        }
    }

    /// Build a store around an already-parsed document.
    pub fn from_document(document: PlayerDocument) -> Self {
        Self {
            path: PathBuf::new(),
            document: OnceCell::with_value(Arc::new(document)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.document.get().is_some()
    }

    /// Get the document, loading it on first call.
    ///
    /// A failed load leaves the store empty so the next call tries again.
    pub fn get(&self) -> Result<Arc<PlayerDocument>, StorageError> {
        if let Some(document) = self.document.get() {
            debug!("Using cached player document");
            return Ok(Arc::clone(document));
        }

        self.document
            .get_or_try_init(|| load_document(&self.path).map(Arc::new))
            .map(Arc::clone)
    }
}
