use todo_core::db::{open_db, open_db_in_memory};
use todo_core::storage::ConditionalWrite;
use todo_core::{KeyValueStorage, SqliteKeyValueStorage};

#[test]
fn set_item_upserts_single_row() {
    let conn = open_db_in_memory().unwrap();
    let storage = SqliteKeyValueStorage::new(&conn);

    assert_eq!(storage.get_item("TodoApp").unwrap(), None);
    storage.set_item("TodoApp", "[1]").unwrap();
    storage.set_item("TodoApp", "[2]").unwrap();

    assert_eq!(storage.get_item("TodoApp").unwrap().as_deref(), Some("[2]"));
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM kv_entries;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn remove_item_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let storage = SqliteKeyValueStorage::new(&conn);

    storage.set_item("TodoApp", "[]").unwrap();
    storage.remove_item("TodoApp").unwrap();
    storage.remove_item("TodoApp").unwrap();
    assert_eq!(storage.get_item("TodoApp").unwrap(), None);
}

#[test]
fn keys_are_independent() {
    let conn = open_db_in_memory().unwrap();
    let storage = SqliteKeyValueStorage::new(&conn);

    storage.set_item("a", "1").unwrap();
    storage.set_item("b", "2").unwrap();
    storage.remove_item("a").unwrap();
    assert_eq!(storage.get_item("b").unwrap().as_deref(), Some("2"));
}

#[test]
fn conditional_write_sees_other_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");
    let conn_a = open_db(&path).unwrap();
    let conn_b = open_db(&path).unwrap();
    let storage_a = SqliteKeyValueStorage::new(&conn_a);
    let storage_b = SqliteKeyValueStorage::new(&conn_b);

    storage_a.set_item("TodoApp", "v1").unwrap();
    storage_b.set_item("TodoApp", "v2").unwrap();

    let expects_v1 = |current: Option<&str>| current == Some("v1");
    let outcome = storage_a
        .set_item_if("TodoApp", "v3", &expects_v1)
        .unwrap();
    assert_eq!(
        outcome,
        ConditionalWrite::Rejected {
            current: Some("v2".to_string())
        }
    );

    let expects_v2 = |current: Option<&str>| current == Some("v2");
    let outcome = storage_a
        .set_item_if("TodoApp", "v3", &expects_v2)
        .unwrap();
    assert_eq!(outcome, ConditionalWrite::Written);
    assert_eq!(storage_b.get_item("TodoApp").unwrap().as_deref(), Some("v3"));
}

#[test]
fn rejected_conditional_write_leaves_connection_usable() {
    let conn = open_db_in_memory().unwrap();
    let storage = SqliteKeyValueStorage::new(&conn);

    let never = |_: Option<&str>| false;
    storage.set_item_if("TodoApp", "x", &never).unwrap();
    storage.set_item("TodoApp", "y").unwrap();
    assert_eq!(storage.get_item("TodoApp").unwrap().as_deref(), Some("y"));
}
