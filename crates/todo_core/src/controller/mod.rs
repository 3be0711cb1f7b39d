//! Screen controllers over the task store.
//!
//! # Responsibility
//! - `TaskListController` owns the list screen's in-memory collection and
//!   autosaves it after every mutation.
//! - `TaskEditor` edits or deletes one task by re-reading the store.
//!
//! # Invariants
//! - No controller operation panics or returns a fatal error; every
//!   failure is reported as an outcome value and logged.
//! - Under `ConcurrencyMode::Optimistic` a controller never overwrites a
//!   blob it did not derive its state from.

pub mod editor;
pub mod list;

use crate::config::{AppConfig, ConcurrencyMode, EmptyCollectionPolicy};
use crate::store::task_store::StoreError;

/// Write behavior shared by both controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControllerOptions {
    pub concurrency: ConcurrencyMode,
    pub empty_collection: EmptyCollectionPolicy,
}

impl From<&AppConfig> for ControllerOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            concurrency: config.concurrency,
            empty_collection: config.empty_collection,
        }
    }
}

/// What happened to the autosave following a mutation.
#[derive(Debug)]
pub enum SaveStatus {
    Saved,
    /// Empty collection not written (`EmptyCollectionPolicy::SkipSave`).
    SkippedEmpty,
    /// Write failed; in-memory state is ahead of storage.
    Failed(StoreError),
}

impl SaveStatus {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved)
    }
}
