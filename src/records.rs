//! Best memory level, persisted across runs
//!
//! Stored as a small JSON file. Writes go to a `.tmp` sibling first and are
//! renamed over the real file, so a crash mid-write leaves the old record.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("record file I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("record file could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("record file is corrupt: {0}")]
    Decode(#[source] serde_json::Error),
}

/// On-disk layout
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct RecordFile {
    best_level: u32,
}

/// Durable best-level counter
#[derive(Debug, Clone)]
pub struct RecordStore {
    /// None keeps the record in memory only
    path: Option<PathBuf>,
    best: u32,
    /// Holds a value the last write failed to store
    dirty: bool,
}

impl RecordStore {
    /// Record that is never written anywhere
    pub fn in_memory() -> Self {
        Self {
            path: None,
            best: 0,
            dirty: false,
        }
    }

    /// Load the record at `path`. Missing or unreadable storage yields 0.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let best = match Self::read(&path) {
            Ok(Some(best)) => {
                log::info!("Loaded memory record {} from {}", best, path.display());
                best
            }
            Ok(None) => {
                log::info!("No memory record at {}, starting fresh", path.display());
                0
            }
            Err(e) => {
                log::warn!("Ignoring memory record at {}: {}", path.display(), e);
                0
            }
        };
        Self {
            path: Some(path),
            best,
            dirty: false,
        }
    }

    fn read(path: &Path) -> Result<Option<u32>, RecordError> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let file: RecordFile = serde_json::from_str(&json).map_err(RecordError::Decode)?;
        Ok(Some(file.best_level))
    }

    /// Best level ever reached
    pub fn best(&self) -> u32 {
        self.best
    }

    /// Raise the record to `level` if it is higher, persisting immediately.
    ///
    /// Returns true when the record changed. A failed write is logged; the
    /// in-memory record still moves so the session is not affected, and every
    /// later update tries the write again until it lands.
    pub fn update(&mut self, level: u32) -> bool {
        let raised = level > self.best;
        if raised {
            log::info!("New memory record: {} -> {}", self.best, level);
            self.best = level;
            self.dirty = true;
        }
        if self.dirty {
            match self.persist() {
                Ok(()) => self.dirty = false,
                Err(e) => log::warn!("Failed to persist memory record {}: {}", self.best, e),
            }
        }
        raised
    }

    /// Whether the stored record lags behind [`Self::best`]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn persist(&self) -> Result<(), RecordError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string(&RecordFile {
            best_level: self.best,
        })
        .map_err(RecordError::Encode)?;

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}
