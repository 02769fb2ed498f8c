//! Import subcommand for task-manager CLI
//!
//! Reads tasks from a JSON or CSV export and inserts them with fresh ids.

use crate::error::Result;
use crate::export::{ExportFormat, import_csv, import_json};
use crate::types::Task;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the import subcommand
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// File format
    #[arg(value_enum, id = "file_format", value_name = "FORMAT")]
    pub format: ExportFormat,

    /// Path to the export file to import
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

impl ImportArgs {
    /// Parse and validate every task in the file.
    pub fn read_tasks(&self) -> Result<Vec<Task>> {
        match self.format {
            ExportFormat::Json => import_json(&self.file),
            ExportFormat::Csv => import_csv(&self.file),
        }
    }
}
