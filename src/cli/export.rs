//! Export subcommand for task-manager CLI
//!
//! Writes tasks to a JSON or CSV file that can be re-imported later.

use crate::export::{ExportFormat, default_export_path};
use clap::{ArgAction, Args};
use std::path::{Path, PathBuf};

/// Arguments for the export subcommand
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// File format
    #[arg(value_enum, id = "file_format", value_name = "FORMAT")]
    pub format: ExportFormat,

    /// Output file path (default: timestamped file in the exports directory)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Include completed tasks
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub include_completed: bool,

    /// Gzip-compress JSON output (auto-detected from .gz extension otherwise)
    #[arg(long)]
    pub gzip: bool,
}

impl ExportArgs {
    /// Resolve the output file, appending `.gz` for compressed JSON.
    pub fn output_path(&self, exports_dir: &Path) -> PathBuf {
        let path = self
            .output
            .clone()
            .unwrap_or_else(|| default_export_path(exports_dir, self.format));

        let wants_gzip = self.gzip && self.format == ExportFormat::Json;
        if wants_gzip && path.extension().is_none_or(|ext| ext != "gz") {
            let mut name = path.clone().into_os_string();
            name.push(".gz");
            PathBuf::from(name)
        } else {
            path
        }
    }
}
