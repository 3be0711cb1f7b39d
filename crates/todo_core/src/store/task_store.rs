//! Task store over device key-value storage.
//!
//! # Responsibility
//! - Load the task collection, falling back to seed data when the blob is
//!   absent, unreadable or corrupt.
//! - Save the task collection as one blob, unconditionally or guarded by a
//!   `Revision`.
//!
//! # Invariants
//! - `load()` never fails; it reports where its tasks came from instead.
//! - `load()` never writes; persisting a seed fallback is the caller's call.
//! - Write failures leave the previously persisted blob untouched.
//! - Blobs that are not a JSON array of tasks, or that repeat an id, are
//!   treated as corrupt. Blank titles and a missing `completed` flag load
//!   as stored.

use crate::model::task::{validate_collection, Task, TaskValidationError};
use crate::seed::seed_tasks;
use crate::storage::{ConditionalWrite, KeyValueStorage, StorageError};
use crate::store::revision::Revision;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage key used by the mobile app for the task blob.
pub const DEFAULT_STORAGE_KEY: &str = "TodoApp";

pub type StoreResult<T> = Result<T, StoreError>;

/// Task store failure surfaced to callers.
#[derive(Debug)]
pub enum StoreError {
    Storage(StorageError),
    /// Stored blob is not a valid task collection.
    Corrupt(String),
    /// Collection handed to `save` breaks collection invariants.
    Validation(TaskValidationError),
    Encode(serde_json::Error),
    /// Conditional save found a different blob than the caller derived from.
    Conflict { expected: Revision, found: Revision },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "{err}"),
            Self::Corrupt(message) => write!(f, "corrupt task blob: {message}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode task blob: {err}"),
            Self::Conflict { expected, found } => write!(
                f,
                "task blob changed since it was read (expected revision {expected}, found {found})"
            ),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::Corrupt(_) | Self::Conflict { .. } => None,
        }
    }
}

impl From<StorageError> for StoreError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<TaskValidationError> for StoreError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Persisted collection together with the revision it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Tasks in stored order. Empty when the key is absent.
    pub tasks: Vec<Task>,
    pub revision: Revision,
}

impl Snapshot {
    /// Returns whether a blob existed when the snapshot was taken.
    pub fn is_present(&self) -> bool {
        !self.revision.is_absent()
    }
}

/// Why `load()` returned seed data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedReason {
    Absent,
    ReadFailed,
    Corrupt,
}

/// Origin of the tasks returned by `load()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Persisted,
    Seed(SeedReason),
}

/// Result of the never-failing `load()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOutcome {
    pub tasks: Vec<Task>,
    pub source: LoadSource,
    /// Revision of the blob found in storage; `ABSENT` when unreadable.
    pub revision: Revision,
}

impl LoadOutcome {
    pub fn is_seed(&self) -> bool {
        matches!(self.source, LoadSource::Seed(_))
    }
}

/// Whole-collection persistence bound to one storage key.
#[derive(Debug, Clone)]
pub struct TaskStore<S: KeyValueStorage> {
    storage: S,
    key: String,
}

impl<S: KeyValueStorage> TaskStore<S> {
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Creates a store using `DEFAULT_STORAGE_KEY`.
    pub fn with_default_key(storage: S) -> Self {
        Self::new(storage, DEFAULT_STORAGE_KEY)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Reads the blob without any fallback.
    ///
    /// An absent key yields an empty snapshot at `Revision::ABSENT`.
    ///
    /// # Errors
    /// - `StoreError::Storage` when the backend read fails.
    /// - `StoreError::Corrupt` when the blob does not decode to a valid
    ///   collection.
    pub fn read_snapshot(&self) -> StoreResult<Snapshot> {
        let raw = self.storage.get_item(&self.key)?;
        let revision = Revision::of_blob(raw.as_deref());
        let tasks = match raw.as_deref() {
            Some(blob) => decode_blob(blob)?,
            None => Vec::new(),
        };
        Ok(Snapshot { tasks, revision })
    }

    /// Loads the collection, degrading every failure to seed data.
    pub fn load(&self) -> LoadOutcome {
        match self.read_snapshot() {
            Ok(snapshot) if snapshot.is_present() => {
                info!(
                    "event=store_load module=store status=ok source=persisted count={}",
                    snapshot.tasks.len()
                );
                LoadOutcome {
                    tasks: snapshot.tasks,
                    source: LoadSource::Persisted,
                    revision: snapshot.revision,
                }
            }
            Ok(_) => {
                info!("event=store_load module=store status=ok source=seed reason=absent");
                seed_outcome(SeedReason::Absent, Revision::ABSENT)
            }
            Err(StoreError::Corrupt(message)) => {
                warn!(
                    "event=store_load module=store status=degraded source=seed reason=corrupt error={message}"
                );
                let revision = self
                    .storage
                    .get_item(&self.key)
                    .map(|raw| Revision::of_blob(raw.as_deref()))
                    .unwrap_or(Revision::ABSENT);
                seed_outcome(SeedReason::Corrupt, revision)
            }
            Err(err) => {
                warn!(
                    "event=store_load module=store status=degraded source=seed reason=read_failed error={err}"
                );
                seed_outcome(SeedReason::ReadFailed, Revision::ABSENT)
            }
        }
    }

    /// Overwrites the blob with `tasks`, last writer wins.
    ///
    /// Returns the revision of the newly written blob. Failures are logged
    /// and returned; the previously persisted blob is left in place.
    pub fn save(&self, tasks: &[Task]) -> StoreResult<Revision> {
        let result = encode_blob(tasks).and_then(|blob| {
            self.storage.set_item(&self.key, &blob)?;
            Ok(Revision::of_blob(Some(blob.as_str())))
        });
        log_save("unconditional", tasks.len(), &result);
        result
    }

    /// Overwrites the blob only if it is still at `expected`.
    ///
    /// # Errors
    /// - `StoreError::Conflict` when another writer replaced (or removed)
    ///   the blob after the caller's read.
    /// - Encoding, validation and storage errors as for `save`.
    pub fn save_if_unchanged(&self, tasks: &[Task], expected: Revision) -> StoreResult<Revision> {
        let result = encode_blob(tasks).and_then(|blob| {
            let unchanged = |current: Option<&str>| Revision::of_blob(current) == expected;
            let outcome = self.storage.set_item_if(&self.key, &blob, &unchanged)?;
            match outcome {
                ConditionalWrite::Written => Ok(Revision::of_blob(Some(blob.as_str()))),
                ConditionalWrite::Rejected { current } => Err(StoreError::Conflict {
                    expected,
                    found: Revision::of_blob(current.as_deref()),
                }),
            }
        });
        log_save("conditional", tasks.len(), &result);
        result
    }

    /// Removes the blob so the next `load()` returns seed data.
    pub fn clear(&self) -> StoreResult<()> {
        self.storage.remove_item(&self.key).map_err(|err| {
            error!("event=store_clear module=store status=error error={err}");
            StoreError::from(err)
        })?;
        info!("event=store_clear module=store status=ok");
        Ok(())
    }
}

fn seed_outcome(reason: SeedReason, revision: Revision) -> LoadOutcome {
    LoadOutcome {
        tasks: seed_tasks(),
        source: LoadSource::Seed(reason),
        revision,
    }
}

fn decode_blob(blob: &str) -> StoreResult<Vec<Task>> {
    let tasks: Vec<Task> =
        serde_json::from_str(blob).map_err(|err| StoreError::Corrupt(err.to_string()))?;
    validate_collection(&tasks).map_err(|err| StoreError::Corrupt(err.to_string()))?;
    Ok(tasks)
}

fn encode_blob(tasks: &[Task]) -> StoreResult<String> {
    validate_collection(tasks)?;
    serde_json::to_string(tasks).map_err(StoreError::Encode)
}

fn log_save(mode: &str, count: usize, result: &StoreResult<Revision>) {
    match result {
        Ok(revision) => info!(
            "event=store_save module=store status=ok mode={mode} count={count} revision={revision}"
        ),
        Err(StoreError::Conflict { expected, found }) => warn!(
            "event=store_save module=store status=conflict mode={mode} expected={expected} found={found}"
        ),
        Err(err) => error!(
            "event=store_save module=store status=error mode={mode} count={count} error={err}"
        ),
    }
}
