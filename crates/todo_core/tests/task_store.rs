use std::cell::Cell;
use std::collections::BTreeSet;
use todo_core::db::open_db_in_memory;
use todo_core::{
    seed_tasks, KeyValueStorage, LoadSource, MemoryKeyValueStorage, Revision, SeedReason,
    SqliteKeyValueStorage, StorageError, StorageResult, StoreError, Task, TaskId, TaskStore,
    DEFAULT_STORAGE_KEY,
};

/// Memory storage whose reads or writes can be switched to fail.
#[derive(Default)]
struct FlakyStorage {
    inner: MemoryKeyValueStorage,
    fail_reads: Cell<bool>,
    fail_writes: Cell<bool>,
}

impl KeyValueStorage for FlakyStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        if self.fail_reads.get() {
            return Err(StorageError::Unavailable("read disabled".to_string()));
        }
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        if self.fail_writes.get() {
            return Err(StorageError::Unavailable("write disabled".to_string()));
        }
        self.inner.set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.inner.remove_item(key)
    }
}

fn sample() -> Vec<Task> {
    vec![
        Task::new(3, "three"),
        Task {
            id: TaskId(1),
            title: "one".to_string(),
            completed: true,
        },
        Task::new(2, "two"),
    ]
}

fn as_set(tasks: &[Task]) -> BTreeSet<(i64, String, bool)> {
    tasks
        .iter()
        .map(|task| (task.id.0, task.title.clone(), task.completed))
        .collect()
}

#[test]
fn absent_blob_loads_seed_without_writing_it() {
    let storage = MemoryKeyValueStorage::new();
    let store = TaskStore::with_default_key(&storage);

    let loaded = store.load();
    assert_eq!(loaded.source, LoadSource::Seed(SeedReason::Absent));
    assert_eq!(loaded.tasks, seed_tasks());
    assert!(loaded.revision.is_absent());
    assert_eq!(storage.get_item(DEFAULT_STORAGE_KEY).unwrap(), None);
}

#[test]
fn save_then_load_round_trips_as_a_set() {
    let conn = open_db_in_memory().unwrap();
    let store = TaskStore::with_default_key(SqliteKeyValueStorage::new(&conn));

    let tasks = sample();
    let revision = store.save(&tasks).unwrap();
    let loaded = store.load();

    assert_eq!(loaded.source, LoadSource::Persisted);
    assert_eq!(loaded.revision, revision);
    assert_eq!(as_set(&loaded.tasks), as_set(&tasks));
}

#[test]
fn persisted_layout_is_a_bare_json_array() {
    let storage = MemoryKeyValueStorage::new();
    let store = TaskStore::new(&storage, "custom-key");
    store.save(&[Task::new(1, "only")]).unwrap();

    let raw = storage.get_item("custom-key").unwrap().unwrap();
    assert_eq!(raw, r#"[{"id":1,"title":"only","completed":false}]"#);
}

#[test]
fn empty_array_loads_as_persisted_empty_collection() {
    let storage = MemoryKeyValueStorage::with_entry(DEFAULT_STORAGE_KEY, "[]");
    let store = TaskStore::with_default_key(&storage);

    let loaded = store.load();
    assert_eq!(loaded.source, LoadSource::Persisted);
    assert!(loaded.tasks.is_empty());
}

#[test]
fn corrupt_blob_degrades_to_seed() {
    for blob in ["not json", "null", r#"{"id":1}"#, r#"[{"id":"x"}]"#] {
        let storage = MemoryKeyValueStorage::with_entry(DEFAULT_STORAGE_KEY, blob);
        let store = TaskStore::with_default_key(&storage);

        let loaded = store.load();
        assert_eq!(loaded.source, LoadSource::Seed(SeedReason::Corrupt), "{blob}");
        assert_eq!(loaded.tasks, seed_tasks());
        assert_eq!(loaded.revision, Revision::of_blob(Some(blob)));
    }
}

#[test]
fn blank_titles_and_missing_flags_load_as_persisted() {
    let blob = r#"[{"id":1,"title":"keep me","completed":true},{"id":7,"title":""},{"id":8,"title":"  ","completed":false}]"#;
    let storage = MemoryKeyValueStorage::with_entry(DEFAULT_STORAGE_KEY, blob);
    let store = TaskStore::with_default_key(&storage);

    let loaded = store.load();
    assert_eq!(loaded.source, LoadSource::Persisted);
    assert_eq!(loaded.tasks.len(), 3);
    assert!(loaded.tasks.contains(&Task::new(7, "")));
    assert!(loaded.tasks.contains(&Task::new(8, "  ")));

    store.save(&loaded.tasks).expect("stored collection must be writable again");
}

#[test]
fn read_snapshot_surfaces_corruption_as_error() {
    let storage = MemoryKeyValueStorage::with_entry(DEFAULT_STORAGE_KEY, "{");
    let store = TaskStore::with_default_key(&storage);
    assert!(matches!(store.read_snapshot(), Err(StoreError::Corrupt(_))));
}

#[test]
fn read_failure_degrades_to_seed() {
    let storage = FlakyStorage::default();
    storage.fail_reads.set(true);
    let store = TaskStore::with_default_key(&storage);

    let loaded = store.load();
    assert_eq!(loaded.source, LoadSource::Seed(SeedReason::ReadFailed));
    assert_eq!(loaded.tasks, seed_tasks());
}

#[test]
fn write_failure_is_returned_and_keeps_previous_blob() {
    let storage = FlakyStorage::default();
    let store = TaskStore::with_default_key(&storage);
    store.save(&[Task::new(1, "kept")]).unwrap();

    storage.fail_writes.set(true);
    let err = store.save(&sample()).unwrap_err();
    assert!(matches!(err, StoreError::Storage(StorageError::Unavailable(_))));

    storage.fail_writes.set(false);
    let loaded = store.load();
    assert_eq!(loaded.tasks, vec![Task::new(1, "kept")]);
}

#[test]
fn save_rejects_collections_with_duplicate_ids() {
    let storage = MemoryKeyValueStorage::new();
    let store = TaskStore::with_default_key(&storage);

    let err = store
        .save(&[Task::new(1, "a"), Task::new(1, "b")])
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert_eq!(storage.get_item(DEFAULT_STORAGE_KEY).unwrap(), None);
}

#[test]
fn conditional_save_detects_intervening_write() {
    let conn = open_db_in_memory().unwrap();
    let store = TaskStore::with_default_key(SqliteKeyValueStorage::new(&conn));

    let first = store.save(&sample()).unwrap();
    let second = store.save(&[Task::new(9, "other writer")]).unwrap();

    let err = store
        .save_if_unchanged(&sample(), first)
        .expect_err("stale revision must be refused");
    match err {
        StoreError::Conflict { expected, found } => {
            assert_eq!(expected, first);
            assert_eq!(found, second);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.load().tasks, vec![Task::new(9, "other writer")]);

    let third = store.save_if_unchanged(&sample(), second).unwrap();
    assert_eq!(store.read_snapshot().unwrap().revision, third);
}

#[test]
fn conditional_save_from_absent_requires_key_to_stay_absent() {
    let storage = MemoryKeyValueStorage::new();
    let store = TaskStore::with_default_key(&storage);

    store
        .save_if_unchanged(&sample(), Revision::ABSENT)
        .expect("absent key matches ABSENT");
    let err = store
        .save_if_unchanged(&sample(), Revision::ABSENT)
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict { .. }));
}

#[test]
fn clear_removes_blob() {
    let storage = MemoryKeyValueStorage::new();
    let store = TaskStore::with_default_key(&storage);
    store.save(&sample()).unwrap();

    store.clear().unwrap();
    assert_eq!(store.load().source, LoadSource::Seed(SeedReason::Absent));
}
