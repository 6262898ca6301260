use recordkeep_core::db::schema::SCHEMA_VERSION;
use recordkeep_core::db::{open_db, open_db_in_memory, DbError};
use recordkeep_core::{
    KeyValueStore, KvError, PersistError, PersistenceOp, RecordStore, SqliteKeyValueStore,
};
use rusqlite::Connection;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn open_db_in_memory_creates_kv_schema() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), SCHEMA_VERSION);
    assert_table_exists(&conn, "kv_entries");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kv.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), SCHEMA_VERSION);
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), SCHEMA_VERSION);
    assert_table_exists(&conn_second, "kv_entries");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::SchemaTooNew { found, supported } => {
            assert_eq!(found, 999);
            assert_eq!(supported, SCHEMA_VERSION);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn sqlite_store_upserts_and_removes() {
    let conn = open_db_in_memory().unwrap();
    let kv = SqliteKeyValueStore::new(&conn);

    assert_eq!(kv.get("records").unwrap(), None);

    kv.set("records", "[]").unwrap();
    kv.set("records", "[1]").unwrap();
    assert_eq!(kv.get("records").unwrap().as_deref(), Some("[1]"));

    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM kv_entries;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);

    kv.remove("records").unwrap();
    kv.remove("records").unwrap();
    assert_eq!(kv.get("records").unwrap(), None);
}

#[test]
fn sqlite_write_failure_is_swallowed_and_observed() {
    let conn = open_db_in_memory().unwrap();
    let mut store = RecordStore::new(SqliteKeyValueStore::new(&conn));
    let outcomes: Rc<RefCell<Vec<(PersistenceOp, bool)>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&outcomes);
    store.set_persistence_observer(move |op, result| sink.borrow_mut().push((op, result.is_ok())));

    conn.execute_batch("DROP TABLE kv_entries;").unwrap();
    let id = store.add(json!({"title": "kept in memory"})).unwrap();
    store.load();

    assert!(store.get_item(&id).is_some());
    assert_eq!(
        *outcomes.borrow(),
        vec![(PersistenceOp::Save, false), (PersistenceOp::Load, false)]
    );
    assert!(matches!(
        store.try_save().unwrap_err(),
        PersistError::Kv(KvError::Db(_))
    ));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
