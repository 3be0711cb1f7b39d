//! Command-line front end for the to-do core.
//!
//! # Responsibility
//! - Drive the same list/editor controllers the mobile shell uses.
//! - Map controller outcomes to exit codes: 0 applied, 1 no-op, 2 error.

use clap::{Parser, Subcommand};
use log::debug;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::process::ExitCode;
use todo_core::db::open_db;
use todo_core::{
    core_version, init_logging, init_stderr_logging, ping, AppConfig, ColorScheme,
    ConcurrencyMode, ControllerOptions, EditorOutcome, EditorState, EmptyCollectionPolicy,
    KeyValueStorage, MemoryKeyValueStorage, MutationOutcome, Route, SaveStatus, SqliteKeyValueStorage, Task,
    TaskEditor, TaskId, TaskListController, TaskStore,
};

const DEFAULT_CLI_LOG_LEVEL: &str = "warn";

#[derive(Parser, Debug)]
#[command(name = "todo", version, about = "Local to-do list backed by key-value storage")]
struct Cli {
    /// SQLite file backing storage (default: TODO_DB_PATH or a temp file).
    #[arg(long)]
    db: Option<PathBuf>,

    /// Storage key holding the task blob.
    #[arg(long)]
    key: Option<String>,

    /// Write mode: `lww` or `optimistic`.
    #[arg(long)]
    concurrency: Option<ConcurrencyMode>,

    /// Keep the empty list instead of persisting nothing when the last task is deleted.
    #[arg(long)]
    persist_empty: Option<bool>,

    /// Use throwaway in-memory storage.
    #[arg(long)]
    ephemeral: bool,

    /// Log level; falls back to TODO_LOG_LEVEL, then `warn`.
    #[arg(long)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logs go to stderr when unset.
    #[arg(long, env = "TODO_LOG_DIR")]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print tasks, newest first.
    List,
    /// Add a task.
    Add { title: Vec<String> },
    /// Flip a task between open and done.
    Toggle { id: i64 },
    /// Delete a task from the list.
    Delete { id: i64 },
    /// Rename a task through the editor.
    Edit { id: String, title: Vec<String> },
    /// Delete a task through the editor.
    Remove { id: String },
    /// Open a screen by route, e.g. `/todos/3`.
    Show { path: String },
    /// Drop persisted tasks; the next load shows seed data.
    Reset,
    /// Print color tokens for `light`, `dark` or `toggle`.
    Theme { scheme: Option<String> },
    Ping,
    Version,
}

#[derive(Debug)]
enum CliError {
    Config(String),
    Storage(String),
    /// The action was valid but changed nothing.
    NoOp(String),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(message) => write!(f, "configuration error: {message}"),
            Self::Storage(message) => write!(f, "storage error: {message}"),
            Self::NoOp(message) => f.write_str(message),
        }
    }
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            Self::NoOp(_) => ExitCode::from(1),
            Self::Config(_) | Self::Storage(_) => ExitCode::from(2),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            err.exit_code()
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = resolve_config(&cli)?;
    let level = cli
        .log_level
        .as_deref()
        .or(config.log_level.as_deref())
        .unwrap_or(DEFAULT_CLI_LOG_LEVEL);
    let logging = match cli.log_dir.as_deref() {
        Some(dir) => init_logging(level, dir),
        None => init_stderr_logging(level),
    };
    logging.map_err(|err| CliError::Config(err.to_string()))?;

    debug!(
        "event=cli_start module=cli ephemeral={} concurrency={:?}",
        cli.ephemeral, config.concurrency
    );

    match cli.command {
        Command::Ping => {
            println!("todo_core ping={}", ping());
            Ok(())
        }
        Command::Version => {
            println!("todo_core version={}", core_version());
            Ok(())
        }
        Command::Theme { scheme } => print_theme(&config, scheme.as_deref()),
        command if cli.ephemeral => {
            let storage = MemoryKeyValueStorage::new();
            execute(command, &storage, &config)
        }
        command => {
            let conn = open_db(&config.db_path).map_err(|err| {
                CliError::Storage(format!("cannot open `{}`: {err}", config.db_path.display()))
            })?;
            execute(command, SqliteKeyValueStorage::new(&conn), &config)
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<AppConfig, CliError> {
    let mut config = AppConfig::from_env().map_err(|err| CliError::Config(err.to_string()))?;
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(key) = &cli.key {
        config.storage_key = key.clone();
    }
    if let Some(mode) = cli.concurrency {
        config.concurrency = mode;
    }
    if let Some(persist) = cli.persist_empty {
        config.empty_collection = if persist {
            EmptyCollectionPolicy::Persist
        } else {
            EmptyCollectionPolicy::SkipSave
        };
    }
    Ok(config)
}

fn execute<S: KeyValueStorage + Copy>(
    command: Command,
    storage: S,
    config: &AppConfig,
) -> Result<(), CliError> {
    let store = || TaskStore::new(storage, config.storage_key.as_str());
    let options = ControllerOptions::from(config);
    let list = || {
        let mut list = TaskListController::new(store(), options);
        list.mount();
        list
    };
    let editor = |raw_id: &str| {
        let mut editor = TaskEditor::new(store(), options, raw_id);
        editor.load();
        editor
    };

    match command {
        Command::List => {
            print_tasks(list().tasks());
            Ok(())
        }
        Command::Add { title } => report_mutation(list().add(&title.join(" "))),
        Command::Toggle { id } => report_mutation(list().toggle(TaskId(id))),
        Command::Delete { id } => report_mutation(list().delete(TaskId(id))),
        Command::Edit { id, title } => {
            let mut editor = editor(&id);
            report_editor(editor.save(&title.join(" ")))
        }
        Command::Remove { id } => {
            let mut editor = editor(&id);
            report_editor(editor.delete())
        }
        Command::Show { path } => match Route::parse(&path) {
            Ok(Route::List) => {
                print_tasks(list().tasks());
                Ok(())
            }
            Ok(Route::EditTask(raw_id)) => match editor(&raw_id).state() {
                EditorState::Ready(task) => {
                    print_tasks(std::slice::from_ref(task));
                    Ok(())
                }
                _ => Err(CliError::NoOp("Todo not found".to_string())),
            },
            Err(err) => Err(CliError::NoOp(err.to_string())),
        },
        Command::Reset => store()
            .clear()
            .map_err(|err| CliError::Storage(err.to_string())),
        Command::Theme { .. } | Command::Ping | Command::Version => Ok(()),
    }
}

fn report_mutation(outcome: MutationOutcome) -> Result<(), CliError> {
    match outcome {
        MutationOutcome::Applied { id, save } => match save {
            SaveStatus::Saved | SaveStatus::SkippedEmpty => {
                println!("ok id={id}");
                Ok(())
            }
            SaveStatus::Failed(err) => Err(CliError::Storage(format!(
                "task {id} changed in memory but was not saved: {err}"
            ))),
        },
        MutationOutcome::Rejected => Err(CliError::NoOp("title cannot be empty".to_string())),
        MutationOutcome::NotFound => Err(CliError::NoOp("task not found".to_string())),
        MutationOutcome::IdsExhausted => Err(CliError::NoOp(
            "no task ids left; delete the newest task first".to_string(),
        )),
        MutationOutcome::Conflict => Err(CliError::NoOp(
            "storage changed while applying; run the command again".to_string(),
        )),
    }
}

fn report_editor(outcome: EditorOutcome) -> Result<(), CliError> {
    match outcome {
        EditorOutcome::Completed => {
            println!("ok");
            Ok(())
        }
        EditorOutcome::Rejected => Err(CliError::NoOp("title cannot be empty".to_string())),
        EditorOutcome::NotFound => Err(CliError::NoOp("Todo not found".to_string())),
        EditorOutcome::Conflict => Err(CliError::NoOp(
            "task changed while saving; run the command again".to_string(),
        )),
        EditorOutcome::Failed(err) => Err(CliError::Storage(err.to_string())),
    }
}

fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No todos yet. Add a new one!");
        return;
    }
    for task in tasks {
        let mark = if task.completed { 'x' } else { ' ' };
        println!("[{mark}] {:>4}  {}", task.id, task.title);
    }
}

fn print_theme(config: &AppConfig, requested: Option<&str>) -> Result<(), CliError> {
    let scheme = match requested {
        None => config.color_scheme,
        Some("toggle") => config.color_scheme.toggled(),
        Some(value) => value.parse::<ColorScheme>().map_err(CliError::Config)?,
    };
    let tokens = scheme.tokens();
    println!("scheme={scheme}");
    println!("background={}", tokens.background);
    println!("text={}", tokens.text);
    println!("button={}", tokens.button);
    Ok(())
}
