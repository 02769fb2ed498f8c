//! Tests for schema versioning and migration of older database files.

use rusqlite::Connection;
use std::path::Path;
use task_manager::db::Database;
use task_manager::db::schema::CURRENT_SCHEMA_VERSION;
use task_manager::error::{Error, ErrorCode};
use task_manager::types::{DEFAULT_CATEGORY, Priority};
use tempfile::TempDir;

/// Write a database in the pre-versioning layout: bare descriptions and a
/// completion flag, no version table.
fn create_legacy_db(path: &Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE tasks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            description TEXT NOT NULL,
            completed INTEGER NOT NULL DEFAULT 0
        );
        INSERT INTO tasks (description, completed) VALUES ('Old open task', 0);
        INSERT INTO tasks (description, completed) VALUES ('Old finished task', 1);",
    )
    .unwrap();
}

#[test]
fn fresh_file_gets_current_schema() {
    let dir = TempDir::new().unwrap();
    let db = Database::open(dir.path().join("tasks.db")).unwrap();
    assert_eq!(db.schema_version().unwrap(), CURRENT_SCHEMA_VERSION);

    let tables = db.table_names().unwrap();
    assert!(tables.contains(&"tasks".to_string()));
    assert!(tables.contains(&"categories".to_string()));
    assert!(tables.contains(&"schema_version".to_string()));
}

#[test]
fn legacy_database_is_migrated_in_place() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("legacy.db");
    create_legacy_db(&path);

    let db = Database::open(&path).unwrap();
    assert_eq!(db.schema_version().unwrap(), CURRENT_SCHEMA_VERSION);

    let tasks = db.list_tasks(true).unwrap();
    assert_eq!(tasks.len(), 2);
    for task in &tasks {
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.category, DEFAULT_CATEGORY);
        assert!(task.due_date.is_none());
        assert!(task.created_at.is_some());
        assert!(task.updated_at.is_some());
    }
    assert_eq!(db.list_completed().unwrap().len(), 1);
    assert!(db.get_category(DEFAULT_CATEGORY).unwrap().is_some());
}

#[test]
fn version_one_database_is_upgraded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("v1.db");
    create_legacy_db(&path);
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE schema_version (version INTEGER PRIMARY KEY, applied_at TEXT NOT NULL);
             INSERT INTO schema_version (version, applied_at) VALUES (1, '2023-01-01T00:00:00');",
        )
        .unwrap();
    }

    let mut db = Database::open(&path).unwrap();
    assert_eq!(db.schema_version().unwrap(), CURRENT_SCHEMA_VERSION);

    // Migrated rows are fully usable.
    let id = db.list_tasks(false).unwrap()[0].id.unwrap();
    db.mark_complete(id).unwrap();
    assert_eq!(db.list_completed().unwrap().len(), 2);
}

#[test]
fn migration_is_idempotent_across_reopens() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("legacy.db");
    create_legacy_db(&path);

    Database::open(&path).unwrap().close().unwrap();
    let db = Database::open(&path).unwrap();
    assert_eq!(db.schema_version().unwrap(), CURRENT_SCHEMA_VERSION);
    assert_eq!(db.list_tasks(true).unwrap().len(), 2);
}

#[test]
fn newer_schema_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("future.db");
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(&format!(
            "CREATE TABLE schema_version (version INTEGER PRIMARY KEY, applied_at TEXT NOT NULL);
             INSERT INTO schema_version (version, applied_at) VALUES ({}, 'later');",
            CURRENT_SCHEMA_VERSION + 1
        ))
        .unwrap();
    }

    let err = Database::open(&path).err().expect("open should fail");
    assert!(matches!(err, Error::Schema(_)));
    assert_eq!(err.code(), ErrorCode::DatabaseError);
}
