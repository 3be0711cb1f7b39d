//! List screen controller.
//!
//! # Invariants
//! - `tasks()` is always in display order (descending id).
//! - A rejected or not-found mutation performs no write.
//! - An applied mutation is kept in memory even when its save fails.
//! - An optimistic conflict discards the mutation and reloads storage.

use crate::config::{ConcurrencyMode, EmptyCollectionPolicy};
use crate::controller::{ControllerOptions, SaveStatus};
use crate::model::task::{next_task_id, normalize_title, sort_for_display, Task, TaskId};
use crate::seed::seed_tasks;
use crate::storage::KeyValueStorage;
use crate::store::revision::Revision;
use crate::store::task_store::{LoadSource, SeedReason, StoreError, TaskStore};
use log::{debug, info, warn};

/// Result of one list mutation.
#[derive(Debug)]
pub enum MutationOutcome {
    Applied { id: TaskId, save: SaveStatus },
    /// Blank title; nothing changed.
    Rejected,
    /// No task with the requested id; nothing changed.
    NotFound,
    /// Storage changed underneath; state was reloaded and the mutation dropped.
    Conflict,
    /// The largest id is already `i64::MAX`; nothing changed.
    IdsExhausted,
}

impl MutationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Summary of a mount/reload.
#[derive(Debug)]
pub struct MountReport {
    pub source: LoadSource,
    pub count: usize,
    /// Present when seed data was shown and therefore written back.
    pub seed_save: Option<SaveStatus>,
}

/// In-memory owner of the list screen's task collection.
pub struct TaskListController<S: KeyValueStorage> {
    store: TaskStore<S>,
    options: ControllerOptions,
    tasks: Vec<Task>,
    revision: Revision,
}

impl<S: KeyValueStorage> TaskListController<S> {
    /// Creates an unmounted controller with an empty collection.
    pub fn new(store: TaskStore<S>, options: ControllerOptions) -> Self {
        Self {
            store,
            options,
            tasks: Vec::new(),
            revision: Revision::ABSENT,
        }
    }

    /// Tasks in display order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn store(&self) -> &TaskStore<S> {
        &self.store
    }

    /// Loads the collection from the store and sorts it for display.
    ///
    /// Falls back to seed data when the store returns seed data, or when it
    /// returns an empty collection under `EmptyCollectionPolicy::SkipSave`.
    /// Seed data shown this way is written back immediately.
    pub fn mount(&mut self) -> MountReport {
        let loaded = self.store.load();
        let mut source = loaded.source;
        let mut tasks = loaded.tasks;
        self.revision = loaded.revision;

        if tasks.is_empty() && self.options.empty_collection == EmptyCollectionPolicy::SkipSave {
            tasks = seed_tasks();
            source = LoadSource::Seed(SeedReason::Absent);
        }
        sort_for_display(&mut tasks);
        self.tasks = tasks;

        let seed_save = match source {
            LoadSource::Persisted => None,
            LoadSource::Seed(_) => {
                let tasks = self.tasks.clone();
                Some(match self.write(&tasks) {
                    Ok(save) => save,
                    Err(conflict) => SaveStatus::Failed(conflict),
                })
            }
        };

        info!(
            "event=list_mount module=list status=ok source={} count={}",
            source_label(source),
            self.tasks.len()
        );
        MountReport {
            source,
            count: self.tasks.len(),
            seed_save,
        }
    }

    /// Re-reads storage, e.g. when the list screen regains focus.
    pub fn reload(&mut self) -> MountReport {
        self.mount()
    }

    /// Prepends a new open task with `id = max + 1`.
    ///
    /// The title is stored trimmed; a title that trims to nothing is rejected.
    pub fn add(&mut self, title: &str) -> MutationOutcome {
        let Some(title) = normalize_title(title) else {
            debug!("event=list_add module=list status=rejected reason=blank_title");
            return MutationOutcome::Rejected;
        };

        let Some(id) = next_task_id(&self.tasks) else {
            warn!("event=list_add module=list status=rejected reason=ids_exhausted");
            return MutationOutcome::IdsExhausted;
        };
        let mut next = Vec::with_capacity(self.tasks.len() + 1);
        next.push(Task::new(id, title));
        next.extend(self.tasks.iter().cloned());
        self.commit("add", id, next)
    }

    /// Flips the completion flag of task `id`.
    pub fn toggle(&mut self, id: TaskId) -> MutationOutcome {
        let Some(index) = self.position(id) else {
            debug!("event=list_toggle module=list status=not_found id={id}");
            return MutationOutcome::NotFound;
        };

        let mut next = self.tasks.clone();
        next[index].toggle();
        self.commit("toggle", id, next)
    }

    /// Removes task `id`.
    pub fn delete(&mut self, id: TaskId) -> MutationOutcome {
        let Some(index) = self.position(id) else {
            debug!("event=list_delete module=list status=not_found id={id}");
            return MutationOutcome::NotFound;
        };

        let mut next = self.tasks.clone();
        next.remove(index);
        self.commit("delete", id, next)
    }

    fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    fn commit(&mut self, op: &str, id: TaskId, next: Vec<Task>) -> MutationOutcome {
        match self.write(&next) {
            Ok(save) => {
                self.tasks = next;
                info!(
                    "event=list_{op} module=list status=ok id={id} count={} saved={}",
                    self.tasks.len(),
                    save.is_saved()
                );
                MutationOutcome::Applied { id, save }
            }
            Err(conflict) => {
                warn!("event=list_{op} module=list status=conflict id={id} error={conflict}");
                self.mount();
                MutationOutcome::Conflict
            }
        }
    }

    /// Persists `tasks` according to the configured policies.
    ///
    /// Returns `Err` only for an optimistic conflict; every other failure is
    /// folded into `SaveStatus::Failed`.
    fn write(&mut self, tasks: &[Task]) -> Result<SaveStatus, StoreError> {
        if tasks.is_empty() && self.options.empty_collection == EmptyCollectionPolicy::SkipSave {
            return Ok(SaveStatus::SkippedEmpty);
        }

        let result = match self.options.concurrency {
            ConcurrencyMode::LastWriterWins => self.store.save(tasks),
            ConcurrencyMode::Optimistic => self.store.save_if_unchanged(tasks, self.revision),
        };
        match result {
            Ok(revision) => {
                self.revision = revision;
                Ok(SaveStatus::Saved)
            }
            Err(err @ StoreError::Conflict { .. }) => Err(err),
            Err(err) => Ok(SaveStatus::Failed(err)),
        }
    }
}

fn source_label(source: LoadSource) -> &'static str {
    match source {
        LoadSource::Persisted => "persisted",
        LoadSource::Seed(SeedReason::Absent) => "seed_absent",
        LoadSource::Seed(SeedReason::ReadFailed) => "seed_read_failed",
        LoadSource::Seed(SeedReason::Corrupt) => "seed_corrupt",
    }
}
