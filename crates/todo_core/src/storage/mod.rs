//! Device key-value storage abstraction.
//!
//! # Responsibility
//! - Define the minimal get/set/remove contract the task store depends on.
//! - Provide SQLite-backed and in-memory implementations.
//!
//! # Invariants
//! - Each single call is atomic with respect to other calls.
//! - Calls are not serialized against each other; overlapping writers
//!   resolve as last-write-wins unless `set_item_if` is used.

mod memory;
mod sqlite;

pub use memory::MemoryKeyValueStorage;
pub use sqlite::SqliteKeyValueStorage;

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StorageResult<T> = Result<T, StorageError>;

/// Transport-level storage failure.
#[derive(Debug)]
pub enum StorageError {
    Db(DbError),
    Unavailable(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Result of a conditional write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionalWrite {
    Written,
    /// Precondition rejected the value found in storage; nothing was written.
    Rejected { current: Option<String> },
}

/// Key-value storage contract modeled on mobile async-storage APIs.
pub trait KeyValueStorage {
    /// Reads the value stored under `key`, `None` when absent.
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    /// Replaces the value stored under `key`.
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Removes `key`; removing an absent key is not an error.
    fn remove_item(&self, key: &str) -> StorageResult<()>;

    /// Writes `value` only when `precondition` accepts the current value.
    ///
    /// The default implementation is a plain read followed by a write and
    /// is only atomic for single-threaded callers. Backends with
    /// transactions override it.
    fn set_item_if(
        &self,
        key: &str,
        value: &str,
        precondition: &dyn Fn(Option<&str>) -> bool,
    ) -> StorageResult<ConditionalWrite> {
        let current = self.get_item(key)?;
        if !precondition(current.as_deref()) {
            return Ok(ConditionalWrite::Rejected { current });
        }
        self.set_item(key, value)?;
        Ok(ConditionalWrite::Written)
    }
}

impl<T: KeyValueStorage + ?Sized> KeyValueStorage for &T {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        (**self).remove_item(key)
    }

    fn set_item_if(
        &self,
        key: &str,
        value: &str,
        precondition: &dyn Fn(Option<&str>) -> bool,
    ) -> StorageResult<ConditionalWrite> {
        (**self).set_item_if(key, value, precondition)
    }
}
