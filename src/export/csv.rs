//! CSV export/import.
//!
//! One row per task under a header of task field names. Absent values are
//! written as empty cells; on import `""`, `"None"`, and `"null"` all read
//! back as absent.

use super::create_file;
use crate::error::{Error, Result, ValidationError};
use crate::types::{DEFAULT_CATEGORY, Priority, Task};
use crate::validate::validate_task_fields;
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use std::path::Path;
use tracing::info;

/// Cell values that mean "no value".
const NULL_LITERALS: &[&str] = &["", "None", "null"];

/// Cell values that mean `completed = true`.
const TRUE_LITERALS: &[&str] = &["1", "True", "true"];

/// Write tasks as CSV. An empty list produces an empty file.
pub fn export_csv(tasks: &[Task], path: &Path) -> Result<()> {
    let file = create_file(path)?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);
    for task in tasks {
        writer.serialize(task)?;
    }
    writer.flush().map_err(Error::io(path))?;

    info!(count = tasks.len(), path = %path.display(), "Exported tasks to CSV");
    Ok(())
}

/// Read tasks from CSV, discarding ids. The first malformed row aborts.
pub fn import_csv(path: &Path) -> Result<Vec<Task>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::Headers)
        .from_path(path)?;

    let columns = ColumnIndex::new(reader.headers()?);
    let mut tasks = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let task = columns.parse(&record).map_err(|e| {
            ValidationError::new(e.field, format!("row {}: {}", i + 1, e.message))
        })?;
        tasks.push(task);
    }

    info!(count = tasks.len(), path = %path.display(), "Imported tasks from CSV");
    Ok(tasks)
}

/// Position of each known column in the header row.
struct ColumnIndex {
    description: Option<usize>,
    priority: Option<usize>,
    category: Option<usize>,
    due_date: Option<usize>,
    completed: Option<usize>,
    created_at: Option<usize>,
    updated_at: Option<usize>,
    completed_at: Option<usize>,
}

impl ColumnIndex {
    fn new(headers: &StringRecord) -> Self {
        let find = |name: &str| headers.iter().position(|h| h == name);
        Self {
            description: find("description"),
            priority: find("priority"),
            category: find("category"),
            due_date: find("due_date"),
            completed: find("completed"),
            created_at: find("created_at"),
            updated_at: find("updated_at"),
            completed_at: find("completed_at"),
        }
    }

    fn parse(&self, record: &StringRecord) -> std::result::Result<Task, ValidationError> {
        let cell = |idx: Option<usize>| -> Option<String> {
            idx.and_then(|i| record.get(i))
                .filter(|v| !NULL_LITERALS.contains(v))
                .map(str::to_string)
        };

        let description = cell(self.description).unwrap_or_default();
        let priority = match cell(self.priority) {
            Some(p) => p.parse::<Priority>()?,
            None => Priority::default(),
        };
        let completed = self
            .completed
            .and_then(|i| record.get(i))
            .is_some_and(|v| TRUE_LITERALS.contains(&v));

        let mut task = Task::new(description)?
            .with_priority(priority)
            .with_category(cell(self.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()))
            .completed(completed);
        task.due_date = cell(self.due_date);
        task.created_at = cell(self.created_at);
        task.updated_at = cell(self.updated_at);
        task.completed_at = cell(self.completed_at);
        validate_task_fields(&task)?;
        Ok(task)
    }
}
