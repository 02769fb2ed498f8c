//! Schema creation, version tracking, and linear migrations.
//!
//! The `schema_version` table records every version that has been applied.
//! A fresh database gets the full current schema in one step; an older one
//! walks the migration list in order, each step in its own transaction
//! together with its version record.

use super::{Database, now_timestamp};
use crate::error::{Error, Result};
use crate::types::DEFAULT_CATEGORY;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;

/// Schema version this build reads and writes.
pub const CURRENT_SCHEMA_VERSION: i64 = 2;

/// Columns the task row decoder reads by name.
pub const TASK_COLUMNS: &[&str] = &[
    "id",
    "description",
    "priority",
    "category",
    "due_date",
    "completed",
    "created_at",
    "updated_at",
    "completed_at",
];

const CREATE_VERSION_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER PRIMARY KEY,
        applied_at TEXT NOT NULL
    )";

const CREATE_CATEGORIES: &str = "
    CREATE TABLE IF NOT EXISTS categories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT UNIQUE NOT NULL,
        description TEXT
    )";

const CREATE_TASKS: &str = "
    CREATE TABLE IF NOT EXISTS tasks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        description TEXT NOT NULL,
        priority TEXT NOT NULL DEFAULT 'Medium',
        category TEXT NOT NULL DEFAULT 'General',
        due_date TEXT,
        completed INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        completed_at TEXT,
        FOREIGN KEY (category) REFERENCES categories(name)
            ON UPDATE CASCADE
    )";

const CREATE_INDEXES: &str = "
    CREATE INDEX IF NOT EXISTS idx_tasks_completed ON tasks(completed);
    CREATE INDEX IF NOT EXISTS idx_tasks_category ON tasks(category);
    CREATE INDEX IF NOT EXISTS idx_tasks_due_date ON tasks(due_date);
    CREATE INDEX IF NOT EXISTS idx_tasks_priority ON tasks(priority);";

/// A single forward step from `version - 1` to `version`.
struct Migration {
    version: i64,
    description: &'static str,
    up: fn(&Connection) -> Result<()>,
}

/// All migrations in order. Each entry upgrades from the previous version.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create legacy tasks table",
        up: migrate_v0_to_v1,
    },
    Migration {
        version: 2,
        description: "add priority, category, dates; add categories table",
        up: migrate_v1_to_v2,
    },
];

impl Database {
    /// Bring the schema to [`CURRENT_SCHEMA_VERSION`].
    pub(super) fn migrate(&mut self) -> Result<()> {
        self.conn
            .execute_batch(CREATE_VERSION_TABLE)
            .map_err(Error::storage("create version table"))?;

        let current = self.schema_version()?;
        if current > CURRENT_SCHEMA_VERSION {
            return Err(Error::Schema(format!(
                "version {} is newer than supported version {}",
                current, CURRENT_SCHEMA_VERSION
            )));
        }

        if current == 0 && !table_exists(&self.conn, "tasks")? {
            self.transaction("create initial schema", |tx| {
                create_current_schema(tx)?;
                record_version(tx, CURRENT_SCHEMA_VERSION)
            })?;
            info!(version = CURRENT_SCHEMA_VERSION, "Initial database schema created");
        } else if current < CURRENT_SCHEMA_VERSION {
            info!(from = current, to = CURRENT_SCHEMA_VERSION, "Running migrations");
            for step in MIGRATIONS.iter().filter(|m| m.version > current) {
                self.transaction("migrate schema", |tx| {
                    (step.up)(tx)?;
                    record_version(tx, step.version)
                })?;
                info!(version = step.version, description = step.description, "Migration applied");
            }
        }

        self.ensure_default_category()?;
        self.verify_task_columns()
    }

    /// Highest recorded schema version, or 0 for an unversioned database.
    pub fn schema_version(&self) -> Result<i64> {
        self.read("read schema version", |conn| {
            let version: Option<i64> =
                conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
            Ok(version.unwrap_or(0))
        })
    }

    /// Make sure the default category exists.
    pub fn ensure_default_category(&mut self) -> Result<()> {
        self.transaction("ensure default category", |tx| {
            seed_default_category(tx)?;
            Ok(())
        })
    }

    /// Confirm the tasks table has every column the row decoder reads.
    fn verify_task_columns(&self) -> Result<()> {
        let columns = self.read("inspect tasks table", |conn| table_columns(conn, "tasks"))?;
        if let Some(missing) = TASK_COLUMNS.iter().find(|c| !columns.iter().any(|col| col == *c)) {
            return Err(Error::Schema(format!("tasks table has no '{}' column", missing)));
        }
        Ok(())
    }

    /// Names of user tables in the database.
    pub fn table_names(&self) -> Result<Vec<String>> {
        self.read("list tables", |conn| {
            let mut stmt = conn.prepare(
                "SELECT name FROM sqlite_master
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
                 ORDER BY name",
            )?;
            let names = stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(names)
        })
    }
}

fn create_current_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_CATEGORIES)?;
    conn.execute_batch(CREATE_TASKS)?;
    conn.execute_batch(CREATE_INDEXES)?;
    seed_default_category(conn)?;
    Ok(())
}

fn seed_default_category(conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO categories (name, description) VALUES (?1, ?2)",
        params![DEFAULT_CATEGORY, "Default category for uncategorized tasks"],
    )?;
    Ok(())
}

fn record_version(conn: &Connection, version: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
        params![version, now_timestamp()],
    )?;
    Ok(())
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![name],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>("name"))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

/// Version 1 stored bare descriptions with a completion flag. Databases that
/// predate version tracking already have this table.
fn migrate_v0_to_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS tasks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            description TEXT NOT NULL,
            completed INTEGER NOT NULL DEFAULT 0
        )",
    )?;
    Ok(())
}

fn migrate_v1_to_v2(conn: &Connection) -> Result<()> {
    let columns = table_columns(conn, "tasks")?;
    let has = |name: &str| columns.iter().any(|c| c == name);
    let now = now_timestamp();

    if !has("priority") {
        conn.execute_batch("ALTER TABLE tasks ADD COLUMN priority TEXT NOT NULL DEFAULT 'Medium'")?;
    }
    if !has("category") {
        conn.execute_batch("ALTER TABLE tasks ADD COLUMN category TEXT NOT NULL DEFAULT 'General'")?;
    }
    if !has("due_date") {
        conn.execute_batch("ALTER TABLE tasks ADD COLUMN due_date TEXT")?;
    }
    if !has("completed") {
        conn.execute_batch("ALTER TABLE tasks ADD COLUMN completed INTEGER NOT NULL DEFAULT 0")?;
    }
    if !has("created_at") {
        conn.execute_batch("ALTER TABLE tasks ADD COLUMN created_at TEXT")?;
        conn.execute(
            "UPDATE tasks SET created_at = ?1 WHERE created_at IS NULL",
            params![now],
        )?;
    }
    if !has("updated_at") {
        conn.execute_batch("ALTER TABLE tasks ADD COLUMN updated_at TEXT")?;
        conn.execute(
            "UPDATE tasks SET updated_at = ?1 WHERE updated_at IS NULL",
            params![now],
        )?;
    }
    if !has("completed_at") {
        conn.execute_batch("ALTER TABLE tasks ADD COLUMN completed_at TEXT")?;
    }

    conn.execute_batch(CREATE_CATEGORIES)?;
    seed_default_category(conn)?;

    // Legacy rows may name categories that were never registered.
    conn.execute_batch(
        "INSERT OR IGNORE INTO categories (name)
         SELECT DISTINCT category FROM tasks WHERE category IS NOT NULL",
    )?;
    conn.execute_batch(CREATE_INDEXES)?;
    Ok(())
}
