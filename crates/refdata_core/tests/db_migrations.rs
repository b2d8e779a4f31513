use refdata_core::db::migrations::{current_user_version, latest_version};
use refdata_core::db::{open_db, open_db_in_memory, DbError};
use refdata_core::RepoError;
use rusqlite::{params, Connection};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(current_user_version(&conn).unwrap(), latest_version());
    for table in [
        "departments",
        "scopes",
        "bpm_types",
        "main_titles",
        "product_types",
        "service_features",
        "main_title_service_features",
    ] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("refdata.db");

    let conn_first = open_db(&path).unwrap();
    insert_department(&conn_first, "Finance", None);
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(current_user_version(&conn_second).unwrap(), latest_version());
    let count: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM departments;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
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
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn foreign_keys_are_enforced() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}

#[test]
fn active_name_index_rejects_duplicates_but_ignores_deleted_rows() {
    let conn = open_db_in_memory().unwrap();
    insert_department(&conn, "Finance", Some(1));
    insert_department(&conn, "Finance", None);

    let err = conn
        .execute(
            "INSERT INTO departments (
                name, creator_id, sequence_tag, created_at_epoch_ms, correlation_id,
                created_at, modified_at, is_deleted
            ) VALUES ('Finance', 'u', 10008, 1, 'dup-guid', '2024-01-01', '2024-01-01', 0);",
            [],
        )
        .unwrap_err();
    assert!(matches!(RepoError::from(err), RepoError::UniqueViolation(_)));
}

#[test]
fn null_is_deleted_counts_as_active_for_uniqueness() {
    let conn = open_db_in_memory().unwrap();
    insert_department(&conn, "Legal", None);
    let result = conn.execute(
        "INSERT INTO departments (
            name, creator_id, sequence_tag, created_at_epoch_ms, correlation_id,
            created_at, modified_at, is_deleted
        ) VALUES ('Legal', 'u', 10008, 1, 'other-guid', '2024-01-01', '2024-01-01', NULL);",
        [],
    );
    assert!(result.is_err());
}

fn insert_department(conn: &Connection, name: &str, is_deleted: Option<i64>) {
    let correlation_id = format!("{name}-{is_deleted:?}");
    conn.execute(
        "INSERT INTO departments (
            name, creator_id, sequence_tag, created_at_epoch_ms, correlation_id,
            created_at, modified_at, is_deleted
        ) VALUES (?1, 'u', 10008, 1, ?2, '2024-01-01', '2024-01-01', ?3);",
        params![name, correlation_id, is_deleted],
    )
    .unwrap();
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
