//! Debounced persistence of the canvas to a job-storage backend.
//!
//! The coordinator never touches the graph. It watches the store's revision
//! counter, keeps the most recent unsaved canvas, and writes it once the
//! debounce window has passed. A failed save is reported through
//! [`SaveStatus`] and is not retried; the next change schedules a fresh save.

use crate::error::PersistenceError;
use crate::graph::CanvasSnapshot;
use crate::store::GraphStore;
use ahash::AHashMap;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// External CRUD API for job canvases.
pub trait JobStorage {
    fn save_canvas(&mut self, job_id: &str, canvas: &CanvasSnapshot) -> Result<(), PersistenceError>;

    fn load_canvas(&self, job_id: &str) -> Result<CanvasSnapshot, PersistenceError>;
}

/// Keeps serialized canvases in memory, keyed by job id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryJobStorage {
    jobs: AHashMap<String, String>,
}

impl InMemoryJobStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw JSON last written for `job_id`.
    pub fn raw(&self, job_id: &str) -> Option<&str> {
        self.jobs.get(job_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl JobStorage for InMemoryJobStorage {
    fn save_canvas(&mut self, job_id: &str, canvas: &CanvasSnapshot) -> Result<(), PersistenceError> {
        let json = canvas
            .to_json()
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
        self.jobs.insert(job_id.to_string(), json);
        Ok(())
    }

    fn load_canvas(&self, job_id: &str) -> Result<CanvasSnapshot, PersistenceError> {
        let json = self
            .jobs
            .get(job_id)
            .ok_or_else(|| PersistenceError::JobNotFound(job_id.to_string()))?;
        CanvasSnapshot::from_json(json).map_err(|e| PersistenceError::Serialization(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutosaveConfig {
    pub debounce_ms: i64,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self { debounce_ms: 1000 }
    }
}

impl AutosaveConfig {
    pub fn debounce(&self) -> Duration {
        Duration::milliseconds(self.debounce_ms.max(0))
    }
}

/// Saving indicators consumed by the presentation layer. `is_saving` is set
/// from the moment a change is scheduled until the write completes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveStatus {
    pub is_saving: bool,
    pub last_saved: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone)]
struct PendingSave {
    canvas: CanvasSnapshot,
    due: DateTime<Utc>,
}

pub struct AutosaveCoordinator<S: JobStorage> {
    job_id: String,
    storage: S,
    config: AutosaveConfig,
    status: SaveStatus,
    observed_revision: Option<u64>,
    pending: Option<PendingSave>,
}

impl<S: JobStorage> AutosaveCoordinator<S> {
    pub fn new(job_id: impl Into<String>, storage: S, config: AutosaveConfig) -> Self {
        Self {
            job_id: job_id.into(),
            storage,
            config,
            status: SaveStatus::default(),
            observed_revision: None,
            pending: None,
        }
    }

    /// Loads the job's canvas into `store` and treats that state as saved.
    pub fn open(&mut self, store: &mut GraphStore) -> Result<(), PersistenceError> {
        let canvas = self.storage.load_canvas(&self.job_id)?;
        store
            .load(canvas)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
        self.mark_clean(store);
        Ok(())
    }

    /// Records the store's current revision as already persisted.
    pub fn mark_clean(&mut self, store: &GraphStore) {
        self.observed_revision = Some(store.revision());
        self.pending = None;
        self.status.is_saving = false;
    }

    /// Schedules a save if the store changed since the last observation.
    /// A newer change replaces any save still waiting for its window.
    pub fn observe(&mut self, store: &GraphStore, now: DateTime<Utc>) -> bool {
        if self.observed_revision == Some(store.revision()) {
            return false;
        }
        self.observed_revision = Some(store.revision());
        if self.pending.is_some() {
            debug!(job_id = %self.job_id, "superseding pending save");
        }
        let due = now
            .checked_add_signed(self.config.debounce())
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.pending = Some(PendingSave {
            canvas: store.to_canvas(),
            due,
        });
        self.status.is_saving = true;
        true
    }

    /// Saves the pending canvas once its debounce window has elapsed.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<Result<(), PersistenceError>> {
        match &self.pending {
            Some(pending) if pending.due <= now => self.flush(now),
            _ => None,
        }
    }

    /// Saves the pending canvas immediately, ignoring the debounce window.
    pub fn flush(&mut self, now: DateTime<Utc>) -> Option<Result<(), PersistenceError>> {
        let pending = self.pending.take()?;
        let result = self.storage.save_canvas(&self.job_id, &pending.canvas);
        self.status.is_saving = false;

        match &result {
            Ok(()) => {
                info!(job_id = %self.job_id, nodes = pending.canvas.nodes.len(), "canvas saved");
                self.status.last_saved = Some(now);
                self.status.last_error = None;
            }
            Err(e) => {
                warn!(job_id = %self.job_id, error = %e, "canvas save failed");
                self.status.last_error = Some(e.to_string());
            }
        }
        Some(result)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn status(&self) -> &SaveStatus {
        &self.status
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }
}
