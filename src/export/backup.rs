//! Database backup and restore by whole-file copy.

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// `tasks_backup_YYYYMMDD_HHMMSS.db`
pub fn backup_file_name() -> String {
    format!("tasks_backup_{}.db", chrono::Local::now().format("%Y%m%d_%H%M%S"))
}

/// Copy the database file into `backup_dir` under a timestamped name.
pub fn create_backup(db_path: &Path, backup_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(backup_dir).map_err(Error::io(backup_dir))?;
    let backup_path = backup_dir.join(backup_file_name());
    fs::copy(db_path, &backup_path).map_err(Error::io(db_path))?;
    info!(path = %backup_path.display(), "Created backup");
    Ok(backup_path)
}

/// Overwrite the database file with a backup copy.
///
/// The caller must close its connection first and reopen afterwards.
pub fn restore_backup(backup_path: &Path, db_path: &Path) -> Result<()> {
    if !backup_path.is_file() {
        return Err(Error::Io {
            path: backup_path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "backup file not found"),
        });
    }
    fs::copy(backup_path, db_path).map_err(Error::io(backup_path))?;
    info!(path = %backup_path.display(), "Restored database from backup");
    Ok(())
}
