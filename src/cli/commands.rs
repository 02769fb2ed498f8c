//! Command execution against an open database.

use super::backup::{RestoreArgs, confirm};
use super::export::ExportArgs;
use super::import::ImportArgs;
use super::{AddArgs, CategoryCommand, Command, EditArgs, ListArgs};
use crate::config::Config;
use crate::db::Database;
use crate::error::Error;
use crate::export::{ExportFormat, create_backup, export_csv, export_json, restore_backup};
use crate::format::{self, OutputFormat, View};
use crate::types::{Category, Priority, Task, TaskFilter};
use crate::validate;
use anyhow::Result;
use chrono::NaiveDate;
use serde_json::{Value, json};
use std::path::PathBuf;
use tracing::{debug, info};

/// Result of one command, renderable as text or JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub text: String,
    pub json: Value,
}

impl Output {
    fn new(text: impl Into<String>, json: Value) -> Self {
        Self {
            text: text.into(),
            json,
        }
    }

    pub fn render(&self, format: OutputFormat) -> serde_json::Result<String> {
        match format {
            OutputFormat::Text => Ok(self.text.trim_end().to_string()),
            OutputFormat::Json => format::to_json(&self.json),
        }
    }
}

/// Accept any capitalization of a priority name.
fn parse_priority(value: &str) -> Result<Priority> {
    match Priority::parse_loose(value) {
        Some(p) => Ok(p),
        None => Ok(validate::validate_priority(value).map_err(Error::from)?),
    }
}

/// Empty input clears the date.
fn parse_due(value: &str) -> Result<Option<String>> {
    let value = value.trim();
    validate::validate_date(value).map_err(Error::from)?;
    Ok((!value.is_empty()).then(|| value.to_string()))
}

fn check_description(value: &str) -> Result<String> {
    validate::validate_description(value).map_err(Error::from)?;
    Ok(value.trim().to_string())
}

fn check_category(value: &str) -> Result<String> {
    validate::validate_category(value).map_err(Error::from)?;
    Ok(value.trim().to_string())
}

/// Open database plus the configuration it was opened with.
pub struct App {
    db: Database,
    config: Config,
    db_path: PathBuf,
    today: NaiveDate,
}

impl App {
    /// Open the configured database.
    pub fn open(config: Config) -> Result<Self> {
        let db_path = config.db_path();
        let db = Database::open(&db_path)?;
        Ok(Self::with_database(db, config, db_path))
    }

    pub fn with_database(db: Database, config: Config, db_path: PathBuf) -> Self {
        Self {
            db,
            config,
            db_path,
            today: chrono::Local::now().date_naive(),
        }
    }

    /// Fix the date used for overdue checks.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn execute(&mut self, command: Command) -> Result<Output> {
        debug!(?command, "Executing command");
        match command {
            Command::Add(args) => self.add(args),
            Command::Edit(args) => self.edit(args),
            Command::Delete { id } => {
                self.db.delete_task(id)?;
                Ok(Output::new(
                    format!("Deleted task {}", id),
                    json!({ "id": id, "deleted": true }),
                ))
            }
            Command::Complete { id } => {
                self.db.mark_complete(id)?;
                self.with_summary(format!("Completed task {}", id), id)
            }
            Command::Reopen { id } => {
                self.db.mark_incomplete(id)?;
                self.with_summary(format!("Reopened task {}", id), id)
            }
            Command::Show { id } => {
                let task = self.require_task(id)?;
                Ok(Output::new(format::render_task_detail(&task), json!(task)))
            }
            Command::List(args) => self.list(args),
            Command::PurgeCompleted => {
                let removed = self.db.delete_completed()?;
                Ok(Output::new(
                    format!("Removed {} completed tasks", removed),
                    json!({ "removed": removed }),
                ))
            }
            Command::Category(command) => self.category(command),
            Command::Stats => {
                let stats = self.db.statistics(self.today)?;
                Ok(Output::new(format::render_statistics(&stats), json!(stats)))
            }
            Command::Export(args) => self.export(args),
            Command::Import(args) => self.import(args),
            Command::Backup => {
                let path = create_backup(&self.db_path, &self.config.paths.backups_dir())?;
                Ok(Output::new(
                    format!("Backup created: {}", path.display()),
                    json!({ "path": path }),
                ))
            }
            Command::Restore(args) => self.restore(args),
        }
    }

    fn require_task(&self, id: i64) -> Result<Task> {
        Ok(self.db.get_task(id)?.ok_or_else(|| Error::task_not_found(id))?)
    }

    /// Mutation result followed by the active/completed status line.
    fn with_summary(&self, message: String, id: i64) -> Result<Output> {
        let stats = self.db.statistics(self.today)?;
        let task = self.require_task(id)?;
        Ok(Output::new(
            format!("{}\n{}", message, format::status_summary(&stats)),
            json!(task),
        ))
    }

    fn add(&mut self, args: AddArgs) -> Result<Output> {
        let description = check_description(&args.description)?;
        let priority = parse_priority(&args.priority)?;
        let category = check_category(&args.category)?;
        let due_date = match args.due {
            Some(ref due) => parse_due(due)?,
            None => None,
        };

        let mut task = Task::new(description)
            .map_err(Error::from)?
            .with_priority(priority)
            .with_category(category);
        task.due_date = due_date;

        let id = self.db.insert_task(&task)?;
        self.with_summary(format!("Added task {}", id), id)
    }

    fn edit(&mut self, args: EditArgs) -> Result<Output> {
        let mut task = self.require_task(args.id)?;

        if let Some(ref description) = args.description {
            task.description = check_description(description)?;
        }
        if let Some(ref priority) = args.priority {
            task.priority = parse_priority(priority)?;
        }
        if let Some(ref category) = args.category {
            task.category = check_category(category)?;
        }
        if args.clear_due {
            task.due_date = None;
        } else if let Some(ref due) = args.due {
            task.due_date = parse_due(due)?;
        }

        self.db.update_task(&task)?;
        self.with_summary(format!("Updated task {}", args.id), args.id)
    }

    fn list(&mut self, args: ListArgs) -> Result<Output> {
        let (mut tasks, total) = if args.completed {
            let tasks = self.db.list_completed()?;
            let total = tasks.len();
            (tasks, total)
        } else {
            let filter = TaskFilter {
                search: args.search.filter(|s| !s.trim().is_empty()),
                category: args.category,
                priority: args.priority.as_deref().map(parse_priority).transpose()?,
                include_completed: args.all,
            };
            let tasks = self.db.filter_tasks(&filter)?;
            let total = if filter.is_empty() {
                tasks.len()
            } else {
                self.db.list_tasks(filter.include_completed)?.len()
            };
            (tasks, total)
        };

        if let Some(key) = args.sort {
            key.sort(&mut tasks, args.reverse);
        }

        let view = View::new(&self.config.ui, self.today);
        Ok(Output::new(
            format::render_task_table(&tasks, total, &view),
            json!({ "tasks": tasks, "shown": tasks.len(), "total": total }),
        ))
    }

    fn category(&mut self, command: CategoryCommand) -> Result<Output> {
        match command {
            CategoryCommand::Add { name, description } => {
                let name = check_category(&name)?;
                let mut category = Category::new(name).map_err(Error::from)?;
                if let Some(d) = description.filter(|d| !d.trim().is_empty()) {
                    category = category.with_description(d);
                }
                let id = self.db.insert_category(&category)?;
                category.id = Some(id);
                Ok(Output::new(
                    format!("Added category {}", category.name),
                    json!(category),
                ))
            }
            CategoryCommand::List => {
                let categories = self.db.list_categories()?;
                Ok(Output::new(
                    format::render_categories(&categories),
                    json!(categories),
                ))
            }
            CategoryCommand::Delete { name } => {
                let moved = self.db.delete_category(&name)?;
                Ok(Output::new(
                    format!(
                        "Deleted category {} ({} tasks moved to {})",
                        name,
                        moved,
                        crate::types::DEFAULT_CATEGORY
                    ),
                    json!({ "name": name, "reassigned": moved }),
                ))
            }
        }
    }

    fn export(&mut self, args: ExportArgs) -> Result<Output> {
        let tasks = self.db.list_tasks(args.include_completed)?;
        let path = args.output_path(&self.config.paths.exports_dir());
        match args.format {
            ExportFormat::Json => export_json(&tasks, &path)?,
            ExportFormat::Csv => export_csv(&tasks, &path)?,
        }
        Ok(Output::new(
            format!("Exported {} tasks to {}", tasks.len(), path.display()),
            json!({ "count": tasks.len(), "path": path }),
        ))
    }

    fn import(&mut self, args: ImportArgs) -> Result<Output> {
        let tasks = args.read_tasks()?;
        let ids = self.db.import_tasks(&tasks)?;
        Ok(Output::new(
            format!("Imported {} tasks from {}", ids.len(), args.file.display()),
            json!({ "count": ids.len(), "ids": ids }),
        ))
    }

    fn restore(&mut self, args: RestoreArgs) -> Result<Output> {
        if !args.yes {
            let prompt = format!(
                "This will replace {} with {}. Continue?",
                self.db_path.display(),
                args.file.display()
            );
            let stdin = std::io::stdin();
            if !confirm(&prompt, &mut stdin.lock(), &mut std::io::stdout())? {
                return Ok(Output::new("Restore cancelled.", json!({ "restored": false })));
            }
        }

        let previous = std::mem::replace(&mut self.db, Database::open_in_memory()?);
        previous.close()?;
        let restored = restore_backup(&args.file, &self.db_path);
        self.db = Database::open(&self.db_path)?;
        restored?;

        info!(path = %args.file.display(), "Database restored");
        Ok(Output::new(
            format!("Restored database from {}", args.file.display()),
            json!({ "restored": true, "path": args.file }),
        ))
    }
}
