//! SQLite-backed key-value storage.
//!
//! # Invariants
//! - One row per key in `kv_entries`; `set_item` is an upsert.
//! - `set_item_if` runs read + write inside one immediate transaction, so
//!   it is atomic across connections to the same database file.

use super::{ConditionalWrite, KeyValueStorage, StorageResult};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

/// Key-value storage over a migrated connection.
#[derive(Debug, Clone, Copy)]
pub struct SqliteKeyValueStorage<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKeyValueStorage<'conn> {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl KeyValueStorage for SqliteKeyValueStorage<'_> {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        read_value(self.conn, key)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        write_value(self.conn, key, value)
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM kv_entries WHERE key = ?1;", [key])?;
        Ok(())
    }

    fn set_item_if(
        &self,
        key: &str,
        value: &str,
        precondition: &dyn Fn(Option<&str>) -> bool,
    ) -> StorageResult<ConditionalWrite> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let current = read_value(&tx, key)?;
        if !precondition(current.as_deref()) {
            tx.rollback()?;
            return Ok(ConditionalWrite::Rejected { current });
        }
        write_value(&tx, key, value)?;
        tx.commit()?;
        Ok(ConditionalWrite::Written)
    }
}

fn read_value(conn: &Connection, key: &str) -> StorageResult<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM kv_entries WHERE key = ?1;",
            [key],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(value)
}

fn write_value(conn: &Connection, key: &str, value: &str) -> StorageResult<()> {
    conn.execute(
        "INSERT INTO kv_entries (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = (strftime('%s', 'now') * 1000);",
        params![key, value],
    )?;
    Ok(())
}
