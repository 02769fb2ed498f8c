//! Persistence layer: a single SQLite connection holding tasks and categories.

pub mod categories;
pub mod schema;
pub mod stats;
pub mod tasks;

use crate::error::{Error, Result};
use rusqlite::{Connection, Transaction};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Database handle wrapping the process's one SQLite connection.
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Open or create the database at the given path and bring its schema
    /// up to date.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(Error::io(parent))?;
        }

        let conn = Connection::open(path).map_err(|source| {
            error!(path = %path.display(), error = %source, "Failed to connect to database");
            Error::Open {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let db = Self::init(conn, Some(path.to_path_buf()))?;
        info!(path = %path.display(), version = db.schema_version()?, "Database initialized");
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(Error::storage("enable foreign keys"))?;
        debug!("Database connection established");

        let mut db = Self { conn, path };
        db.migrate()?;
        Ok(db)
    }

    /// Path of the backing file, or `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run `f` inside a transaction. Commits on success; any error rolls the
    /// transaction back and is attributed to `operation`.
    pub fn transaction<T, F>(&mut self, operation: &'static str, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let run = |conn: &mut Connection| -> Result<T> {
            let tx = conn.transaction()?;
            let value = f(&tx)?;
            tx.commit()?;
            Ok(value)
        };

        match run(&mut self.conn) {
            Ok(value) => {
                debug!(operation, "Transaction committed");
                Ok(value)
            }
            Err(err) => {
                let err = err.in_operation(operation);
                error!(operation, error = %err, "Transaction rolled back");
                Err(err)
            }
        }
    }

    /// Run a read-only query outside any transaction.
    pub fn read<T, F>(&self, operation: &'static str, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        f(&self.conn).map_err(|err| {
            let err = err.in_operation(operation);
            error!(operation, error = %err, "Query failed");
            err
        })
    }

    /// Close the connection, reporting any failure to flush.
    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, source)| Error::Storage {
                operation: "close database",
                source,
            })?;
        info!("Database connection closed");
        Ok(())
    }
}

/// Current local time as ISO-8601 text, the format stored in timestamp columns.
pub fn now_timestamp() -> String {
    chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Task;

    #[test]
    fn transaction_rolls_back_on_error() {
        let mut db = Database::open_in_memory().unwrap();

        let result: Result<()> = db.transaction("insert twice", |tx| {
            tx.execute(
                "INSERT INTO categories (name) VALUES ('Errands')",
                [],
            )?;
            tx.execute(
                "INSERT INTO categories (name) VALUES ('Errands')",
                [],
            )?;
            Ok(())
        });

        match result {
            Err(Error::Storage { operation, .. }) => assert_eq!(operation, "insert twice"),
            other => panic!("expected storage error, got {:?}", other),
        }
        assert!(db.get_category("Errands").unwrap().is_none());
    }

    #[test]
    fn open_creates_parent_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("tasks.db");

        let mut db = Database::open(&path).unwrap();
        db.insert_task(&Task::new("persisted").unwrap()).unwrap();
        assert_eq!(db.path(), Some(path.as_path()));
        db.close().unwrap();

        let db = Database::open(&path).unwrap();
        assert_eq!(db.list_tasks(true).unwrap().len(), 1);
    }

    #[test]
    fn open_fails_on_directory_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = Database::open(dir.path());
        assert!(matches!(result, Err(Error::Open { .. }) | Err(Error::Storage { .. })));
    }

    #[test]
    fn timestamps_are_iso_formatted() {
        let ts = now_timestamp();
        assert!(chrono::NaiveDateTime::parse_from_str(&ts, "%Y-%m-%dT%H:%M:%S%.f").is_ok());
    }
}
