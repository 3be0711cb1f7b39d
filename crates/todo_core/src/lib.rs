//! Core domain logic for the to-do app.
//! This crate is the single source of truth for task invariants; UI shells
//! (Flutter via `todo_ffi`, the `todo` CLI) only call into it.

pub mod config;
pub mod controller;
pub mod db;
pub mod logging;
pub mod model;
pub mod route;
pub mod seed;
pub mod storage;
pub mod store;
pub mod theme;

pub use config::{AppConfig, ConcurrencyMode, ConfigError, EmptyCollectionPolicy};
pub use controller::editor::{EditorOutcome, EditorState, TaskEditor};
pub use controller::list::{MountReport, MutationOutcome, TaskListController};
pub use controller::{ControllerOptions, SaveStatus};
pub use logging::{
    default_log_level, init_logging, init_stderr_logging, logging_status, LogLevel, LogTarget,
    LoggingError,
};
pub use model::task::{Task, TaskId, TaskValidationError};
pub use route::{Route, RouteError};
pub use seed::seed_tasks;
pub use storage::{
    KeyValueStorage, MemoryKeyValueStorage, SqliteKeyValueStorage, StorageError, StorageResult,
};
pub use store::revision::Revision;
pub use store::task_store::{
    LoadOutcome, LoadSource, SeedReason, Snapshot, StoreError, StoreResult, TaskStore,
    DEFAULT_STORAGE_KEY,
};
pub use theme::{ColorScheme, ThemeTokens};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
