//! Helpers for long-running hosts such as the web front end.
//!
//! [`ResultCache`] keeps recent run records so a client can fetch one by id
//! after the synchronous call returned. [`RunGate`] lets a host enforce at
//! most one run per target directory. Both live only as long as the host
//! process.
use crate::record::RunRecord;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

pub const DEFAULT_RESULT_CAPACITY: usize = 64;
pub const DEFAULT_HISTORY_CAPACITY: usize = 500;

/// Compact per-run entry used for trend graphs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub id: Uuid,
    pub timestamp: DateTime<Local>,
    pub directory: PathBuf,
    pub file_count: usize,
    pub folder_count: usize,
    pub verified: bool,
}

impl From<&RunRecord> for RunSummary {
    fn from(record: &RunRecord) -> Self {
        Self {
            id: record.id,
            timestamp: record.timestamp,
            directory: record.directory.clone(),
            file_count: record.moved_count(),
            folder_count: record.folders.len(),
            verified: record.verification.passed,
        }
    }
}

#[derive(Debug, Default)]
struct CacheInner {
    records: HashMap<Uuid, Arc<RunRecord>>,
    /// Insertion order of `records`, oldest first.
    order: VecDeque<Uuid>,
    history: VecDeque<RunSummary>,
}

/// Bounded, thread-safe store of recent run records keyed by run id.
#[derive(Debug)]
pub struct ResultCache {
    capacity: usize,
    history_capacity: usize,
    inner: Mutex<CacheInner>,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_RESULT_CAPACITY, DEFAULT_HISTORY_CAPACITY)
    }
}

impl ResultCache {
    /// Both capacities are clamped to at least one entry.
    pub fn new(capacity: usize, history_capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            history_capacity: history_capacity.max(1),
            inner: Mutex::new(CacheInner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        // Every critical section leaves the maps consistent, so poisoning is ignored.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stores `record` and returns its id. Evicts the oldest record when full.
    pub fn insert(&self, record: RunRecord) -> Uuid {
        let id = record.id;
        let summary = RunSummary::from(&record);
        let mut inner = self.lock();

        if inner.records.insert(id, Arc::new(record)).is_none() {
            inner.order.push_back(id);
        }
        while inner.order.len() > self.capacity {
            if let Some(evicted) = inner.order.pop_front() {
                inner.records.remove(&evicted);
                debug!(run = %evicted, "Evicted cached run result");
            }
        }

        inner.history.push_back(summary);
        while inner.history.len() > self.history_capacity {
            inner.history.pop_front();
        }
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<RunRecord>> {
        self.lock().records.get(id).cloned()
    }

    /// Summaries of all remembered runs, oldest first.
    pub fn history(&self) -> Vec<RunSummary> {
        self.lock().history.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Tracks which directories have a run in flight.
#[derive(Debug, Clone, Default)]
pub struct RunGate {
    active: Arc<Mutex<HashSet<PathBuf>>>,
}

/// Proof that the holder is the only run on a directory. Released on drop.
#[derive(Debug)]
pub struct RunPermit {
    active: Arc<Mutex<HashSet<PathBuf>>>,
    directory: PathBuf,
}

impl RunPermit {
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        let mut active = self.active.lock().unwrap_or_else(|p| p.into_inner());
        active.remove(&self.directory);
    }
}

impl RunGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `directory`, or returns `None` if a run already holds it.
    ///
    /// The path is canonicalized when possible so different spellings of the
    /// same directory share one slot.
    pub fn try_acquire(&self, directory: &Path) -> Option<RunPermit> {
        let key = directory
            .canonicalize()
            .unwrap_or_else(|_| directory.to_path_buf());
        let mut active = self.active.lock().unwrap_or_else(|p| p.into_inner());
        if !active.insert(key.clone()) {
            debug!(directory = %key.display(), "Run already in progress");
            return None;
        }
        Some(RunPermit {
            active: Arc::clone(&self.active),
            directory: key,
        })
    }

    pub fn is_busy(&self, directory: &Path) -> bool {
        let key = directory
            .canonicalize()
            .unwrap_or_else(|_| directory.to_path_buf());
        self.active
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains(&key)
    }
}
