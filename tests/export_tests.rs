//! Tests for moving tasks in and out of the database: JSON/CSV files and
//! whole-database backups.

use std::path::PathBuf;
use task_manager::cli::backup::RestoreArgs;
use task_manager::cli::export::ExportArgs;
use task_manager::cli::import::ImportArgs;
use task_manager::cli::{App, Command};
use task_manager::config::Config;
use task_manager::db::Database;
use task_manager::export::{self, ExportFormat};
use task_manager::types::{Category, DEFAULT_CATEGORY, Priority, Task};
use tempfile::TempDir;

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

fn seeded_db() -> Database {
    let mut db = setup_db();
    db.insert_category(&Category::new("Work").unwrap()).unwrap();
    db.insert_task(
        &Task::new("Send invoice")
            .unwrap()
            .with_priority(Priority::Urgent)
            .with_category("Work")
            .with_due_date("2024-08-01"),
    )
    .unwrap();
    let done = db.insert_task(&Task::new("Book dentist").unwrap()).unwrap();
    db.mark_complete(done).unwrap();
    db
}

fn config_in(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.paths.data_dir = dir.path().to_path_buf();
    config
}

/// Compare the fields that survive an export/import cycle.
fn portable(task: &Task) -> (String, Priority, String, Option<String>, bool, Option<String>) {
    (
        task.description.clone(),
        task.priority,
        task.category.clone(),
        task.due_date.clone(),
        task.completed,
        task.created_at.clone(),
    )
}

mod json_tests {
    use super::*;

    #[test]
    fn roundtrip_into_fresh_database_assigns_new_ids() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");

        let source = seeded_db();
        let original = source.list_tasks(true).unwrap();
        export::export_json(&original, &path).unwrap();

        let mut target = setup_db();
        // Occupy id 1 so imported ids cannot coincide with the originals.
        target.insert_task(&Task::new("Already here").unwrap()).unwrap();

        let imported = export::import_json(&path).unwrap();
        let ids = target.import_tasks(&imported).unwrap();
        assert_eq!(ids.len(), original.len());
        for id in &ids {
            assert!(original.iter().all(|t| t.id != Some(*id)));
        }

        // Category named by the import was created on the fly.
        assert!(target.get_category("Work").unwrap().is_some());

        for (id, before) in ids.iter().zip(&original) {
            let after = target.get_task(*id).unwrap().unwrap();
            assert_eq!(portable(&after), portable(before));
            assert_eq!(after.completed_at, before.completed_at);
        }
    }

    #[test]
    fn failed_batch_leaves_database_untouched() {
        let mut db = setup_db();
        let good = Task::new("Fine").unwrap();
        let mut bad = Task::new("Also fine").unwrap();
        bad.description = "   ".to_string();

        assert!(db.import_tasks(&[good, bad]).is_err());
        assert!(db.list_tasks(true).unwrap().is_empty());
    }
}

mod csv_tests {
    use super::*;

    #[test]
    fn roundtrip_through_database() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.csv");

        let source = seeded_db();
        let original = source.list_tasks(true).unwrap();
        export::export_csv(&original, &path).unwrap();

        let mut target = setup_db();
        let ids = target.import_tasks(&export::import_csv(&path).unwrap()).unwrap();
        assert_eq!(ids.len(), 2);

        let imported = target.list_tasks(true).unwrap();
        let mut before: Vec<_> = original.iter().map(portable).collect();
        let mut after: Vec<_> = imported.iter().map(portable).collect();
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }

    #[test]
    fn hand_written_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hand.csv");
        std::fs::write(
            &path,
            "description,priority,category,due_date,completed\n\
             Call plumber,,,,\n\
             Pay rent,High,Home,2024-07-01,true\n",
        )
        .unwrap();

        let mut db = setup_db();
        db.import_tasks(&export::import_csv(&path).unwrap()).unwrap();

        let plumber = &db.search_tasks("plumber").unwrap()[0];
        assert_eq!(plumber.priority, Priority::Medium);
        assert_eq!(plumber.category, DEFAULT_CATEGORY);
        assert!(!plumber.completed);

        let rent = &db.search_tasks("rent").unwrap()[0];
        assert_eq!(rent.category, "Home");
        assert!(rent.completed);
        assert!(rent.completed_at.is_some());
    }
}

mod command_tests {
    use super::*;

    #[test]
    fn export_then_import_via_commands() {
        let dir = TempDir::new().unwrap();
        let mut app = App::open(config_in(&dir)).unwrap();
        app.execute(Command::Add(task_manager::cli::AddArgs {
            description: "Export me".to_string(),
            priority: "low".to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            due: None,
        }))
        .unwrap();

        let out = app
            .execute(Command::Export(ExportArgs {
                format: ExportFormat::Json,
                output: None,
                include_completed: true,
                gzip: true,
            }))
            .unwrap();
        assert_eq!(out.json["count"], 1);
        let path = PathBuf::from(out.json["path"].as_str().unwrap());
        assert!(path.starts_with(dir.path().join("exports")));
        assert!(path.to_string_lossy().ends_with(".json.gz"));

        let out = app
            .execute(Command::Import(ImportArgs {
                format: ExportFormat::Json,
                file: path,
            }))
            .unwrap();
        assert_eq!(out.json["count"], 1);
        assert_eq!(app.database().search_tasks("Export me").unwrap().len(), 2);
    }

    #[test]
    fn backup_and_restore() {
        let dir = TempDir::new().unwrap();
        let mut app = App::open(config_in(&dir)).unwrap();
        app.execute(Command::Add(task_manager::cli::AddArgs {
            description: "Keep me".to_string(),
            priority: "Medium".to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            due: None,
        }))
        .unwrap();

        let out = app.execute(Command::Backup).unwrap();
        let backup = PathBuf::from(out.json["path"].as_str().unwrap());
        assert!(backup.starts_with(dir.path().join("backups")));

        app.execute(Command::PurgeCompleted).unwrap();
        let id = app.database().list_tasks(false).unwrap()[0].id.unwrap();
        app.execute(Command::Delete { id }).unwrap();
        assert!(app.database().list_tasks(true).unwrap().is_empty());

        app.execute(Command::Restore(RestoreArgs {
            file: backup,
            yes: true,
        }))
        .unwrap();
        let tasks = app.database().list_tasks(true).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].description, "Keep me");
    }

    #[test]
    fn restore_from_missing_file_keeps_database_usable() {
        let dir = TempDir::new().unwrap();
        let mut app = App::open(config_in(&dir)).unwrap();

        let err = app
            .execute(Command::Restore(RestoreArgs {
                file: dir.path().join("missing.db"),
                yes: true,
            }))
            .unwrap_err();
        assert_eq!(
            task_manager::cli::error_report(&err).code,
            task_manager::error::ErrorCode::IoError
        );
        assert!(app.database().list_categories().is_ok());
    }
}
