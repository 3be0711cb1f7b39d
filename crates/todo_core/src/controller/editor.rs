//! Edit screen controller.
//!
//! # Responsibility
//! - Resolve one task by the raw id segment of its route.
//! - Rename or delete it by re-reading and rewriting the whole blob.
//!
//! # Invariants
//! - The editor shares no state with the list controller; every operation
//!   starts from a fresh read of storage.
//! - An absent blob reads as an empty collection here, never as seed data.
//! - Blank titles and missing ids never cause a write.
//! - Under `ConcurrencyMode::Optimistic` the write is conditional on the
//!   revision of the read it was derived from.

use crate::config::ConcurrencyMode;
use crate::controller::ControllerOptions;
use crate::model::task::{normalize_title, Task};
use crate::storage::KeyValueStorage;
use crate::store::task_store::{Snapshot, StoreError, TaskStore};
use log::{debug, info, warn};

/// Lifecycle of one editor screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorState {
    /// Created but `load()` not called yet.
    Pending,
    Ready(Task),
    /// Terminal: no task matches the route id.
    NotFound,
    /// Terminal: the editor finished and the caller should navigate back.
    Closed,
}

/// Result of one editor action.
#[derive(Debug)]
pub enum EditorOutcome {
    /// Navigate back to the list.
    Completed,
    /// Blank title; nothing written.
    Rejected,
    /// The task is not (or no longer) in storage; nothing written.
    NotFound,
    /// Storage changed between read and write; nothing written.
    Conflict,
    /// Read or write failed; the editor stays open.
    Failed(StoreError),
}

impl EditorOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Editor bound to one raw route id.
pub struct TaskEditor<S: KeyValueStorage> {
    store: TaskStore<S>,
    options: ControllerOptions,
    raw_id: String,
    state: EditorState,
}

impl<S: KeyValueStorage> TaskEditor<S> {
    pub fn new(store: TaskStore<S>, options: ControllerOptions, raw_id: impl Into<String>) -> Self {
        Self {
            store,
            options,
            raw_id: raw_id.into(),
            state: EditorState::Pending,
        }
    }

    pub fn raw_id(&self) -> &str {
        &self.raw_id
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    /// The loaded task, when the editor is ready.
    pub fn task(&self) -> Option<&Task> {
        match &self.state {
            EditorState::Ready(task) => Some(task),
            _ => None,
        }
    }

    /// Reads storage and resolves the route id.
    ///
    /// Read failures are logged and reported as `NotFound`.
    pub fn load(&mut self) -> &EditorState {
        self.state = match self.store.read_snapshot() {
            Ok(snapshot) => match find(&snapshot, &self.raw_id) {
                Some(index) => EditorState::Ready(snapshot.tasks[index].clone()),
                None => EditorState::NotFound,
            },
            Err(err) => {
                warn!("event=editor_load module=editor status=error error={err}");
                EditorState::NotFound
            }
        };
        debug!(
            "event=editor_load module=editor status=ok found={}",
            matches!(self.state, EditorState::Ready(_))
        );
        &self.state
    }

    /// Replaces the task title with the trimmed `title`.
    pub fn save(&mut self, title: &str) -> EditorOutcome {
        if !matches!(self.state, EditorState::Ready(_)) {
            return EditorOutcome::NotFound;
        }
        let Some(title) = normalize_title(title) else {
            debug!("event=editor_save module=editor status=rejected reason=blank_title");
            return EditorOutcome::Rejected;
        };

        self.rewrite("save", |tasks, index| tasks[index].title = title)
    }

    /// Removes the task from storage.
    pub fn delete(&mut self) -> EditorOutcome {
        if !matches!(self.state, EditorState::Ready(_)) {
            return EditorOutcome::NotFound;
        }

        self.rewrite("delete", |tasks, index| {
            tasks.remove(index);
        })
    }

    /// Leaves the editor without writing.
    pub fn cancel(&mut self) -> EditorOutcome {
        self.state = EditorState::Closed;
        EditorOutcome::Completed
    }

    fn rewrite(&mut self, op: &str, edit: impl FnOnce(&mut Vec<Task>, usize)) -> EditorOutcome {
        let snapshot = match self.store.read_snapshot() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("event=editor_{op} module=editor status=error stage=read error={err}");
                return EditorOutcome::Failed(err);
            }
        };
        let Some(index) = find(&snapshot, &self.raw_id) else {
            debug!("event=editor_{op} module=editor status=not_found");
            self.state = EditorState::NotFound;
            return EditorOutcome::NotFound;
        };

        let revision = snapshot.revision;
        let mut tasks = snapshot.tasks;
        edit(&mut tasks, index);

        let result = match self.options.concurrency {
            ConcurrencyMode::LastWriterWins => self.store.save(&tasks),
            ConcurrencyMode::Optimistic => self.store.save_if_unchanged(&tasks, revision),
        };
        match result {
            Ok(_) => {
                info!("event=editor_{op} module=editor status=ok count={}", tasks.len());
                self.state = EditorState::Closed;
                EditorOutcome::Completed
            }
            Err(StoreError::Conflict { .. }) => EditorOutcome::Conflict,
            Err(err) => EditorOutcome::Failed(err),
        }
    }
}

fn find(snapshot: &Snapshot, raw_id: &str) -> Option<usize> {
    snapshot
        .tasks
        .iter()
        .position(|task| task.id.matches_raw(raw_id))
}
