//! Export/import of task lists and database backups.
//!
//! JSON exports use a small envelope:
//!
//! ```json
//! { "exported_at": "2024-06-15T09:30:00.000000", "task_count": 2, "tasks": [ ... ] }
//! ```
//!
//! A `.gz` output path is gzip-compressed; imports detect compression from
//! the file's magic bytes. Imported tasks never keep their stored id.

pub mod backup;
pub mod csv;

use crate::db::now_timestamp;
use crate::error::{Error, Result, ValidationError};
use crate::types::Task;
use crate::validate::validate_task_fields;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub use self::backup::{create_backup, restore_backup};
pub use self::csv::{export_csv, import_csv};

/// Gzip magic bytes.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// File format for task exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

/// The JSON export document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportEnvelope {
    pub exported_at: String,
    pub task_count: usize,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl ExportEnvelope {
    pub fn new(tasks: &[Task]) -> Self {
        Self {
            exported_at: now_timestamp(),
            task_count: tasks.len(),
            tasks: tasks.to_vec(),
        }
    }
}

/// `tasks_export_YYYYMMDD_HHMMSS.<ext>` inside `dir`.
pub fn default_export_path(dir: &Path, format: ExportFormat) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("tasks_export_{}.{}", stamp, format.extension()))
}

fn is_gzip_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

fn create_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(Error::io(parent))?;
    }
    File::create(path).map_err(Error::io(path))
}

/// Write tasks to a JSON envelope at `path`.
pub fn export_json(tasks: &[Task], path: &Path) -> Result<()> {
    let envelope = ExportEnvelope::new(tasks);
    let json = serde_json::to_string_pretty(&envelope)?;
    let file = create_file(path)?;

    let result = if is_gzip_path(path) {
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        write_json(&mut encoder, &json).and_then(|_| encoder.finish()?.flush())
    } else {
        let mut out = BufWriter::new(file);
        write_json(&mut out, &json).and_then(|_| out.flush())
    };
    result.map_err(Error::io(path))?;

    info!(count = tasks.len(), path = %path.display(), "Exported tasks to JSON");
    Ok(())
}

fn write_json<W: Write>(out: &mut W, json: &str) -> std::io::Result<()> {
    out.write_all(json.as_bytes())?;
    out.write_all(b"\n")
}

/// Read a JSON envelope (plain or gzip) and return its tasks without ids.
///
/// Every task is validated; the first malformed task aborts the import.
pub fn import_json(path: &Path) -> Result<Vec<Task>> {
    let mut reader = BufReader::new(File::open(path).map_err(Error::io(path))?);
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).map_err(Error::io(path))?;

    let envelope: ExportEnvelope = if bytes.starts_with(&GZIP_MAGIC) {
        serde_json::from_reader(GzDecoder::new(bytes.as_slice()))?
    } else {
        serde_json::from_slice(&bytes)?
    };

    let tasks = prepare_imported(envelope.tasks)?;
    info!(count = tasks.len(), path = %path.display(), "Imported tasks from JSON");
    Ok(tasks)
}

/// Strip ids and validate, labelling failures with the record position.
fn prepare_imported(tasks: Vec<Task>) -> Result<Vec<Task>> {
    tasks
        .into_iter()
        .enumerate()
        .map(|(i, mut task)| -> Result<Task> {
            task.id = None;
            validate_task_fields(&task).map_err(|e| {
                ValidationError::new(e.field, format!("task {}: {}", i + 1, e.message))
            })?;
            Ok(task)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Priority;
    use tempfile::TempDir;

    fn sample() -> Vec<Task> {
        let mut a = Task::new("Draft proposal")
            .unwrap()
            .with_priority(Priority::High)
            .with_category("Work")
            .with_due_date("2024-07-01");
        a.id = Some(4);
        a.created_at = Some("2024-06-01T10:00:00.000000".to_string());
        a.updated_at = a.created_at.clone();
        let mut b = Task::new("Buy stamps").unwrap().completed(true);
        b.id = Some(9);
        b.completed_at = Some("2024-06-02T08:00:00.000000".to_string());
        vec![a, b]
    }

    #[test]
    fn envelope_counts_tasks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        export_json(&sample(), &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["task_count"], 2);
        assert!(value["exported_at"].is_string());
        assert_eq!(value["tasks"][0]["priority"], "High");
    }

    #[test]
    fn import_discards_ids() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        export_json(&sample(), &path).unwrap();

        let imported = import_json(&path).unwrap();
        assert!(imported.iter().all(|t| t.id.is_none()));

        let mut expected = sample();
        for t in &mut expected {
            t.id = None;
        }
        assert_eq!(imported, expected);
    }

    #[test]
    fn gzip_export_is_detected_on_import() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json.gz");
        export_json(&sample(), &path).unwrap();

        let raw = std::fs::read(&path).unwrap();
        assert!(raw.starts_with(&GZIP_MAGIC));
        assert_eq!(import_json(&path).unwrap().len(), 2);
    }

    #[test]
    fn blank_description_aborts_import() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(
            &path,
            r#"{"exported_at":"x","task_count":2,"tasks":[{"description":"ok"},{"description":"  "}]}"#,
        )
        .unwrap();

        let err = import_json(&path).unwrap_err();
        assert!(err.to_string().starts_with("task 2:"));
    }

    #[test]
    fn invalid_category_aborts_import() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(
            &path,
            r#"{"exported_at":"x","task_count":2,"tasks":[{"description":"a","category":"Work"},{"description":"b","category":"Bad/Name!!"}]}"#,
        )
        .unwrap();

        let err = import_json(&path).unwrap_err();
        assert_eq!(err.field(), Some("category"));
        assert!(err.to_string().starts_with("task 2:"));
    }

    #[test]
    fn unpadded_due_date_aborts_import() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(
            &path,
            r#"{"exported_at":"x","task_count":1,"tasks":[{"description":"a","due_date":"2024-6-1"}]}"#,
        )
        .unwrap();

        assert_eq!(import_json(&path).unwrap_err().field(), Some("due_date"));
    }

    #[test]
    fn unknown_priority_aborts_import() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(
            &path,
            r#"{"exported_at":"x","task_count":1,"tasks":[{"description":"ok","priority":"Critical"}]}"#,
        )
        .unwrap();

        assert!(matches!(import_json(&path), Err(Error::Json(_))));
    }

    #[test]
    fn default_path_uses_extension() {
        let path = default_export_path(Path::new("exports"), ExportFormat::Csv);
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("tasks_export_"));
        assert!(name.ends_with(".csv"));
    }
}
