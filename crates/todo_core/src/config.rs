//! Runtime configuration for core callers.
//!
//! # Responsibility
//! - Hold every knob the controllers and storage bootstrap depend on.
//! - Resolve values from environment variables with explicit defaults.
//!
//! # Invariants
//! - Unset variables fall back to defaults; malformed values are errors,
//!   never silently replaced.

use crate::logging::LogLevel;
use crate::store::task_store::DEFAULT_STORAGE_KEY;
use crate::theme::ColorScheme;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

pub const ENV_DB_PATH: &str = "TODO_DB_PATH";
pub const ENV_STORAGE_KEY: &str = "TODO_STORAGE_KEY";
pub const ENV_CONCURRENCY: &str = "TODO_CONCURRENCY";
pub const ENV_PERSIST_EMPTY: &str = "TODO_PERSIST_EMPTY";
pub const ENV_COLOR_SCHEME: &str = "TODO_COLOR_SCHEME";
pub const ENV_LOG_LEVEL: &str = "TODO_LOG_LEVEL";

const DEFAULT_DB_FILE_NAME: &str = "todo_app.sqlite3";

/// How a controller writes a collection it derived from an earlier read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyMode {
    /// Overwrite unconditionally; a stale writer silently wins.
    LastWriterWins,
    /// Write only if the blob is unchanged since the controller's read.
    #[default]
    Optimistic,
}

impl FromStr for ConcurrencyMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lww" | "last_writer_wins" | "last-writer-wins" => Ok(Self::LastWriterWins),
            "optimistic" => Ok(Self::Optimistic),
            other => Err(format!(
                "unsupported concurrency mode `{other}`; expected lww|optimistic"
            )),
        }
    }
}

/// Whether the list controller persists a collection emptied by deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyCollectionPolicy {
    /// Persist `[]`; the next load shows an empty list.
    #[default]
    Persist,
    /// Skip the save; the next load resurrects seed data.
    SkipSave,
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        var: &'static str,
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { var, message } => write!(f, "{var}: {message}"),
        }
    }
}

impl Error for ConfigError {}

/// Controller and storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite file backing key-value storage.
    pub db_path: PathBuf,
    /// Key under which the task blob is stored.
    pub storage_key: String,
    pub concurrency: ConcurrencyMode,
    pub empty_collection: EmptyCollectionPolicy,
    pub color_scheme: ColorScheme,
    /// One of `trace|debug|info|warn|error`; `None` leaves the choice to the host.
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            concurrency: ConcurrencyMode::default(),
            empty_collection: EmptyCollectionPolicy::default(),
            color_scheme: ColorScheme::default(),
            log_level: None,
        }
    }
}

impl AppConfig {
    /// Builds configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds configuration from an arbitrary variable lookup.
    ///
    /// Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| {
            lookup(var)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = get(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(key) = get(ENV_STORAGE_KEY) {
            config.storage_key = key;
        }
        if let Some(mode) = get(ENV_CONCURRENCY) {
            config.concurrency = parse_var(ENV_CONCURRENCY, &mode)?;
        }
        if let Some(flag) = get(ENV_PERSIST_EMPTY) {
            config.empty_collection = if parse_flag(ENV_PERSIST_EMPTY, &flag)? {
                EmptyCollectionPolicy::Persist
            } else {
                EmptyCollectionPolicy::SkipSave
            };
        }
        if let Some(scheme) = get(ENV_COLOR_SCHEME) {
            config.color_scheme = parse_var(ENV_COLOR_SCHEME, &scheme)?;
        }
        if let Some(level) = get(ENV_LOG_LEVEL) {
            let level = level
                .parse::<LogLevel>()
                .map_err(|err| ConfigError::InvalidValue {
                    var: ENV_LOG_LEVEL,
                    message: err.to_string(),
                })?;
            config.log_level = Some(level.as_str().to_string());
        }

        Ok(config)
    }
}

fn parse_var<T: FromStr<Err = String>>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|message| ConfigError::InvalidValue { var, message })
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            var,
            message: format!("expected a boolean, got `{other}`"),
        }),
    }
}
