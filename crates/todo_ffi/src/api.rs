//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose list/editor/theme use-cases to Dart via FRB.
//! - Keep error semantics simple: envelopes with `ok` and a message.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Every call opens storage, mounts fresh state and closes it again; the
//!   Dart side owns display state between calls.

use log::warn;
use std::sync::OnceLock;
use todo_core::db::open_db;
use todo_core::{
    core_version as core_version_inner, default_log_level, init_logging as init_logging_inner, ping as ping_inner,
    AppConfig, ColorScheme, ControllerOptions, EditorOutcome, EditorState, MutationOutcome,
    Route, SaveStatus, SqliteKeyValueStorage, Task, TaskEditor, TaskId, TaskListController,
    TaskStore,
};

/// Attempts per list mutation when a concurrent writer wins the race.
const MUTATION_ATTEMPTS: usize = 3;

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
/// - A blank `level` uses `TODO_LOG_LEVEL`, then the build default.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    let level = if level.trim().is_empty() {
        app_config()
            .log_level
            .clone()
            .unwrap_or_else(|| default_log_level().to_string())
    } else {
        level
    };
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One task as shown by the Flutter list and edit screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: i64,
    pub title: String,
    pub completed: bool,
    /// Route of the edit screen for this task.
    pub edit_path: String,
}

/// Display-ordered task list envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListResponse {
    pub ok: bool,
    /// Tasks sorted by descending id.
    pub items: Vec<TaskItem>,
    pub message: String,
}

/// Generic action envelope for list and editor mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskActionResponse {
    /// Whether the change was applied.
    pub ok: bool,
    /// Whether the change reached storage.
    pub persisted: bool,
    /// Task the action applied to, when known.
    pub task_id: Option<i64>,
    /// Whether the edit screen should navigate back.
    pub navigate_back: bool,
    pub message: String,
}

impl TaskActionResponse {
    fn applied(task_id: TaskId, save: &SaveStatus, message: impl Into<String>) -> Self {
        let message = match save {
            SaveStatus::Failed(err) => format!("{} Not saved: {err}", message.into()),
            SaveStatus::Saved | SaveStatus::SkippedEmpty => message.into(),
        };
        Self {
            ok: true,
            persisted: save.is_saved(),
            task_id: Some(task_id.0),
            navigate_back: false,
            message,
        }
    }

    fn completed(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            persisted: true,
            task_id: None,
            navigate_back: true,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            persisted: false,
            task_id: None,
            navigate_back: false,
            message: message.into(),
        }
    }
}

/// Edit screen envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorResponse {
    pub found: bool,
    pub task: Option<TaskItem>,
    pub message: String,
}

/// Color tokens envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeResponse {
    pub scheme: String,
    pub is_dark: bool,
    pub background: String,
    pub text: String,
    pub button: String,
}

/// Loads the list screen state.
///
/// Seed data is returned (and persisted) on first run.
#[flutter_rust_bridge::frb(sync)]
pub fn list_tasks() -> TaskListResponse {
    match with_list(|list| list.tasks().iter().map(to_task_item).collect::<Vec<_>>()) {
        Ok(items) => TaskListResponse {
            ok: true,
            message: format!("{} task(s).", items.len()),
            items,
        },
        Err(err) => TaskListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("list_tasks failed: {err}"),
        },
    }
}

/// Adds a task from the list screen input.
#[flutter_rust_bridge::frb(sync)]
pub fn list_add(title: String) -> TaskActionResponse {
    run_mutation("list_add", "Task added.", |list| list.add(title.as_str()))
}

/// Flips the completion flag of one task.
#[flutter_rust_bridge::frb(sync)]
pub fn list_toggle(id: i64) -> TaskActionResponse {
    run_mutation("list_toggle", "Task updated.", |list| list.toggle(TaskId(id)))
}

/// Deletes one task from the list screen.
#[flutter_rust_bridge::frb(sync)]
pub fn list_delete(id: i64) -> TaskActionResponse {
    run_mutation("list_delete", "Task deleted.", |list| list.delete(TaskId(id)))
}

/// Resolves an edit screen route such as `/todos/3`.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_open(path: String) -> EditorResponse {
    let raw_id = match Route::parse(path.as_str()) {
        Ok(Route::EditTask(raw_id)) => raw_id,
        Ok(Route::List) => {
            return EditorResponse {
                found: false,
                task: None,
                message: "path addresses the list screen".to_string(),
            }
        }
        Err(err) => {
            return EditorResponse {
                found: false,
                task: None,
                message: err.to_string(),
            }
        }
    };

    match with_editor(raw_id.as_str(), |editor| editor.task().map(to_task_item)) {
        Ok(Some(task)) => EditorResponse {
            found: true,
            task: Some(task),
            message: "Task loaded.".to_string(),
        },
        Ok(None) => EditorResponse {
            found: false,
            task: None,
            message: "Task not found.".to_string(),
        },
        Err(err) => EditorResponse {
            found: false,
            task: None,
            message: format!("editor_open failed: {err}"),
        },
    }
}

/// Saves a new title from the edit screen.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_save(raw_id: String, title: String) -> TaskActionResponse {
    run_editor("editor_save", "Task saved.", raw_id.as_str(), |editor| {
        editor.save(title.as_str())
    })
}

/// Deletes the task shown by the edit screen.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_delete(raw_id: String) -> TaskActionResponse {
    run_editor("editor_delete", "Task deleted.", raw_id.as_str(), |editor| editor.delete())
}

/// Returns color tokens for `light|dark`, or for the configured scheme when blank.
#[flutter_rust_bridge::frb(sync)]
pub fn theme_tokens(scheme: String) -> ThemeResponse {
    let scheme = if scheme.trim().is_empty() {
        app_config().color_scheme
    } else {
        scheme.parse::<ColorScheme>().unwrap_or_else(|err| {
            warn!("event=theme_tokens module=ffi status=fallback error={err}");
            ColorScheme::default()
        })
    };
    let tokens = scheme.tokens();
    ThemeResponse {
        scheme: scheme.as_str().to_string(),
        is_dark: scheme.is_dark(),
        background: tokens.background.to_string(),
        text: tokens.text.to_string(),
        button: tokens.button.to_string(),
    }
}

fn app_config() -> &'static AppConfig {
    APP_CONFIG.get_or_init(|| {
        AppConfig::from_env().unwrap_or_else(|err| {
            warn!("event=config_load module=ffi status=fallback error={err}");
            AppConfig::default()
        })
    })
}

fn with_list<T>(
    f: impl FnOnce(&mut TaskListController<SqliteKeyValueStorage<'_>>) -> T,
) -> Result<T, String> {
    let config = app_config();
    let conn = open_db(&config.db_path).map_err(|err| format!("storage open failed: {err}"))?;
    let store = TaskStore::new(SqliteKeyValueStorage::new(&conn), config.storage_key.as_str());
    let mut list = TaskListController::new(store, ControllerOptions::from(config));
    list.mount();
    Ok(f(&mut list))
}

fn with_editor<T>(
    raw_id: &str,
    f: impl FnOnce(&mut TaskEditor<SqliteKeyValueStorage<'_>>) -> T,
) -> Result<T, String> {
    let config = app_config();
    let conn = open_db(&config.db_path).map_err(|err| format!("storage open failed: {err}"))?;
    let store = TaskStore::new(SqliteKeyValueStorage::new(&conn), config.storage_key.as_str());
    let mut editor = TaskEditor::new(store, ControllerOptions::from(config), raw_id);
    editor.load();
    Ok(f(&mut editor))
}

fn run_mutation(
    op: &str,
    done: &str,
    mutate: impl Fn(&mut TaskListController<SqliteKeyValueStorage<'_>>) -> MutationOutcome,
) -> TaskActionResponse {
    let result = with_list(|list| {
        // A conflict reloads the list, so a replay applies to fresh state.
        let mut outcome = mutate(list);
        for _ in 1..MUTATION_ATTEMPTS {
            if !matches!(outcome, MutationOutcome::Conflict) {
                break;
            }
            outcome = mutate(list);
        }
        outcome
    });

    match result {
        Ok(MutationOutcome::Applied { id, save }) => {
            TaskActionResponse::applied(id, &save, done)
        }
        Ok(MutationOutcome::Rejected) => TaskActionResponse::failure("Title cannot be empty."),
        Ok(MutationOutcome::NotFound) => TaskActionResponse::failure("Task not found."),
        Ok(MutationOutcome::IdsExhausted) => {
            TaskActionResponse::failure("No task ids left; delete the newest task first.")
        }
        Ok(MutationOutcome::Conflict) => {
            TaskActionResponse::failure(format!("{op} failed: storage kept changing"))
        }
        Err(err) => TaskActionResponse::failure(format!("{op} failed: {err}")),
    }
}

fn run_editor(
    op: &str,
    done: &str,
    raw_id: &str,
    action: impl Fn(&mut TaskEditor<SqliteKeyValueStorage<'_>>) -> EditorOutcome,
) -> TaskActionResponse {
    let attempt = || {
        with_editor(raw_id, |editor| {
            if matches!(editor.state(), EditorState::NotFound) {
                return EditorOutcome::NotFound;
            }
            action(editor)
        })
    };
    let mut result = attempt();
    for _ in 1..MUTATION_ATTEMPTS {
        if !matches!(result, Ok(EditorOutcome::Conflict)) {
            break;
        }
        result = attempt();
    }

    match result {
        Ok(EditorOutcome::Completed) => TaskActionResponse::completed(done),
        Ok(EditorOutcome::Rejected) => TaskActionResponse::failure("Title cannot be empty."),
        Ok(EditorOutcome::NotFound) => TaskActionResponse::failure("Task not found."),
        Ok(EditorOutcome::Conflict) => {
            TaskActionResponse::failure(format!("{op} failed: storage kept changing"))
        }
        Ok(EditorOutcome::Failed(err)) => {
            TaskActionResponse::failure(format!("{op} failed: {err}"))
        }
        Err(err) => TaskActionResponse::failure(format!("{op} failed: {err}")),
    }
}

fn to_task_item(task: &Task) -> TaskItem {
    TaskItem {
        id: task.id.0,
        title: task.title.clone(),
        completed: task.completed,
        edit_path: Route::edit(task.id).path(),
    }
}
