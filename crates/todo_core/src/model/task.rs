//! Task domain model and collection helpers.
//!
//! # Responsibility
//! - Define the `Task` record shared by list and editor controllers.
//! - Own id assignment, display ordering and title normalization rules.
//!
//! # Invariants
//! - `id` is unique within one stored collection.
//! - New ids are `max(existing) + 1`, or `1` for an empty collection.
//! - Titles entered by the user are trimmed and never blank. Stored records
//!   are not re-checked, so a blank title already in storage is kept.
//! - A record without `completed` reads as an open task.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Caller-assigned integer identifier of one task.
///
/// Serialized transparently as a JSON number to keep the blob layout
/// `{ "id": number, ... }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl TaskId {
    /// Returns whether this id matches a raw route segment.
    ///
    /// Matching is exact string comparison against the decimal form, so
    /// `"2"` matches `TaskId(2)` while `"02"` and `" 2"` do not.
    pub fn matches_raw(self, raw: &str) -> bool {
        self.0.to_string() == raw
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TaskId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// One to-do entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

/// Validation errors for task collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    DuplicateId(TaskId),
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateId(id) => write!(f, "task id {id} appears more than once"),
        }
    }
}

impl Error for TaskValidationError {}

impl Task {
    /// Creates an open (not completed) task.
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            completed: false,
        }
    }

    /// Flips the completion flag.
    pub fn toggle(&mut self) {
        self.completed = !self.completed;
    }
}

/// Returns the trimmed title, or `None` when the input is blank.
pub fn normalize_title(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Computes the id for the next task added to `tasks`.
///
/// Returns `None` when the largest id is already `i64::MAX`.
pub fn next_task_id(tasks: &[Task]) -> Option<TaskId> {
    match tasks.iter().map(|task| task.id.0).max() {
        None => Some(TaskId(1)),
        Some(max) => max.checked_add(1).map(TaskId),
    }
}

/// Orders tasks by descending id, the list screen's display order.
pub fn sort_for_display(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| b.id.cmp(&a.id));
}

/// Returns the first id that occurs more than once, if any.
pub fn find_duplicate_id(tasks: &[Task]) -> Option<TaskId> {
    let mut seen = HashSet::with_capacity(tasks.len());
    tasks.iter().map(|task| task.id).find(|id| !seen.insert(*id))
}

/// Checks collection-level invariants on load and before persistence.
pub fn validate_collection(tasks: &[Task]) -> Result<(), TaskValidationError> {
    match find_duplicate_id(tasks) {
        Some(id) => Err(TaskValidationError::DuplicateId(id)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        find_duplicate_id, next_task_id, normalize_title, sort_for_display, Task, TaskId,
    };

    #[test]
    fn next_id_starts_at_one_for_empty_collection() {
        assert_eq!(next_task_id(&[]), Some(TaskId(1)));
    }

    #[test]
    fn next_id_uses_max_not_len() {
        let tasks = vec![Task::new(7, "a"), Task::new(2, "b")];
        assert_eq!(next_task_id(&tasks), Some(TaskId(8)));
    }

    #[test]
    fn next_id_is_none_once_id_space_is_exhausted() {
        let tasks = vec![Task::new(i64::MAX, "last"), Task::new(1, "first")];
        assert_eq!(next_task_id(&tasks), None);
    }

    #[test]
    fn normalize_title_rejects_whitespace() {
        assert_eq!(normalize_title("   "), None);
        assert_eq!(normalize_title(""), None);
        assert_eq!(normalize_title("  milk \n").as_deref(), Some("milk"));
    }

    #[test]
    fn sort_for_display_orders_descending() {
        let mut tasks = vec![Task::new(1, "a"), Task::new(3, "c"), Task::new(2, "b")];
        sort_for_display(&mut tasks);
        let ids: Vec<i64> = tasks.iter().map(|task| task.id.0).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn raw_id_matching_is_exact_string_comparison() {
        assert!(TaskId(2).matches_raw("2"));
        assert!(!TaskId(2).matches_raw("02"));
        assert!(!TaskId(2).matches_raw(" 2"));
        assert!(TaskId(-4).matches_raw("-4"));
    }

    #[test]
    fn duplicate_ids_are_detected() {
        let tasks = vec![Task::new(1, "a"), Task::new(2, "b"), Task::new(1, "c")];
        assert_eq!(find_duplicate_id(&tasks), Some(TaskId(1)));
        assert_eq!(find_duplicate_id(&tasks[..2]), None);
    }

    #[test]
    fn task_serializes_to_flat_json_object() {
        let json = serde_json::to_value(Task::new(4, "buy milk")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 4, "title": "buy milk", "completed": false})
        );
    }

    #[test]
    fn missing_completed_flag_reads_as_open() {
        let task: Task = serde_json::from_str(r#"{"id":5,"title":"legacy"}"#).unwrap();
        assert_eq!(task, Task::new(5, "legacy"));
    }
}
