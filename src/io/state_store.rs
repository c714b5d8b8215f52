//! Tracking state persistence
//!
//! The whole `TrackingState` is written after every cycle as a pretty JSON
//! document wrapped in a small versioned envelope. Writes go to a sibling
//! temp file first and are renamed into place, so a crash mid-write leaves
//! the previous snapshot intact.

use crate::domain::error::{TrackerError, TrackerResult};
use crate::domain::types::{DayState, TrackingState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const SNAPSHOT_VERSION: u32 = 1;

pub trait StateStore: Send + Sync {
    /// Previously saved state, `None` on first run
    fn load(&self) -> TrackerResult<Option<TrackingState>>;

    fn save(&self, state: &TrackingState) -> TrackerResult<()>;
}

/// On-disk envelope
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    days: Vec<DayState>,
}

/// JSON file backed state store
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        info!(path = %path.display(), "state_store_initialized");
        Self { path }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn failure(&self, reason: impl ToString) -> TrackerError {
        TrackerError::persistence(self.path.display(), reason)
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> TrackerResult<Option<TrackingState>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "state_snapshot_missing");
                return Ok(None);
            }
            Err(e) => return Err(self.failure(e)),
        };

        let snapshot: Snapshot = serde_json::from_str(&content).map_err(|e| self.failure(e))?;
        if snapshot.version > SNAPSHOT_VERSION {
            warn!(
                version = %snapshot.version,
                supported = %SNAPSHOT_VERSION,
                "state_snapshot_newer_than_supported"
            );
        }

        info!(
            path = %self.path.display(),
            days = %snapshot.days.len(),
            saved_at = ?snapshot.saved_at,
            "state_snapshot_loaded"
        );
        Ok(Some(TrackingState::new(snapshot.days)))
    }

    fn save(&self, state: &TrackingState) -> TrackerResult<()> {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            saved_at: Some(Utc::now()),
            days: state.days.clone(),
        };
        let json = serde_json::to_string_pretty(&snapshot).map_err(|e| self.failure(e))?;

        // Create parent directories if they don't exist
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| self.failure(e))?;
            }
        }

        let temp = self.temp_path();
        fs::write(&temp, json.as_bytes()).map_err(|e| self.failure(e))?;
        fs::rename(&temp, &self.path).map_err(|e| self.failure(e))?;

        debug!(path = %self.path.display(), bytes = %json.len(), "state_snapshot_saved");
        Ok(())
    }
}
