//! Built-in seed collection used when nothing has been persisted yet.

use crate::model::task::{Task, TaskId};

const SEED: &[(i64, &str, bool)] = &[
    (1, "Read the getting started guide", false),
    (2, "Add your first to-do", false),
    (3, "Long-press a task to mark it done", true),
];

/// Returns a fresh copy of the seed tasks in ascending id order.
pub fn seed_tasks() -> Vec<Task> {
    SEED.iter()
        .map(|(id, title, completed)| Task {
            id: TaskId(*id),
            title: (*title).to_string(),
            completed: *completed,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::seed_tasks;
    use crate::model::task::{validate_collection, TaskId};

    #[test]
    fn seed_has_three_valid_tasks() {
        let seed = seed_tasks();
        let ids: Vec<TaskId> = seed.iter().map(|task| task.id).collect();
        assert_eq!(ids, vec![TaskId(1), TaskId(2), TaskId(3)]);
        validate_collection(&seed).expect("seed must satisfy collection invariants");
    }
}
