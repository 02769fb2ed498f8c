//! CLI command definitions for task-manager
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod backup;
pub mod commands;
pub mod export;
pub mod import;

use crate::error::{Error, ErrorCode, ErrorReport};
use crate::format::OutputFormat;
use crate::types::SortKey;
use backup::RestoreArgs;
use clap::{Args, Parser, Subcommand};
use export::ExportArgs;
use import::ImportArgs;
use std::path::PathBuf;

pub use commands::{App, Output};

/// Personal task manager backed by SQLite
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), file, or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    /// Output format for results and errors
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    Add(AddArgs),

    /// Change fields of an existing task
    Edit(EditArgs),

    /// Delete a task
    Delete { id: i64 },

    /// Mark a task as completed
    Complete { id: i64 },

    /// Mark a completed task as active again
    Reopen { id: i64 },

    /// Show all fields of one task
    Show { id: i64 },

    /// List tasks, newest first unless --sort is given
    List(ListArgs),

    /// Delete every completed task
    PurgeCompleted,

    /// Manage categories
    #[command(subcommand)]
    Category(CategoryCommand),

    /// Show task statistics
    Stats,

    /// Export tasks to a JSON or CSV file
    Export(ExportArgs),

    /// Import tasks from a JSON or CSV file
    Import(ImportArgs),

    /// Copy the database file into the backups directory
    Backup,

    /// Replace the database with a backup copy
    Restore(RestoreArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Task description
    pub description: String,

    /// Low, Medium, High, or Urgent
    #[arg(short, long, default_value = "Medium")]
    pub priority: String,

    /// Category name (must exist)
    #[arg(long, default_value = crate::types::DEFAULT_CATEGORY)]
    pub category: String,

    /// Due date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub due: Option<String>,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    pub id: i64,

    #[arg(long)]
    pub description: Option<String>,

    /// Low, Medium, High, or Urgent
    #[arg(short, long)]
    pub priority: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    /// New due date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", conflicts_with = "clear_due")]
    pub due: Option<String>,

    /// Remove the due date
    #[arg(long)]
    pub clear_due: bool,
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Only completed tasks, most recently completed first
    #[arg(long, conflicts_with_all = ["all", "search", "category", "priority"])]
    pub completed: bool,

    /// Include completed tasks
    #[arg(short, long)]
    pub all: bool,

    /// Case-insensitive text to look for in descriptions
    #[arg(short, long)]
    pub search: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(short, long)]
    pub priority: Option<String>,

    /// Order by a column instead of newest first
    #[arg(long, value_enum, value_name = "COLUMN")]
    pub sort: Option<SortKey>,

    /// Descending order for --sort
    #[arg(short, long, requires = "sort")]
    pub reverse: bool,
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommand {
    /// Create a category
    Add {
        name: String,

        #[arg(long)]
        description: Option<String>,
    },

    /// List categories by name
    List,

    /// Delete a category, moving its tasks to General
    Delete { name: String },
}

/// Build the error body reported for a failed command.
pub fn error_report(err: &anyhow::Error) -> ErrorReport {
    match err.downcast_ref::<Error>() {
        Some(e) => ErrorReport::from(e),
        None => ErrorReport {
            code: ErrorCode::InternalError,
            message: format!("{:#}", err),
            field: None,
        },
    }
}
