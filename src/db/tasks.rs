//! Task CRUD, listing, filtering, and completion.

use super::{Database, now_timestamp};
use crate::error::{Error, Result};
use crate::types::{Priority, Task, TaskFilter};
use crate::validate::validate_task_fields;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, ToSql, params};
use tracing::{debug, info};

const SELECT_TASKS: &str = "SELECT id, description, priority, category, due_date, completed,
        created_at, updated_at, completed_at
     FROM tasks";

/// Decode a task row by column name.
pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let column = row.as_ref().column_index("priority")?;
    let priority: String = row.get(column)?;
    let priority = priority.parse::<Priority>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e))
    })?;

    Ok(Task {
        id: Some(row.get("id")?),
        description: row.get("description")?,
        priority,
        category: row.get("category")?,
        due_date: row.get("due_date")?,
        completed: row.get("completed")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        completed_at: row.get("completed_at")?,
    })
}

fn query_tasks(conn: &Connection, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare(sql)?;
    let tasks = stmt
        .query_map(params, parse_task_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tasks)
}

/// Escape LIKE wildcards so the query matches literally.
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn require_category(conn: &Connection, name: &str) -> Result<()> {
    let exists = conn
        .query_row(
            "SELECT 1 FROM categories WHERE name = ?1",
            params![name],
            |_| Ok(()),
        )
        .optional()?;
    match exists {
        Some(()) => Ok(()),
        None => Err(Error::category_not_found(name)),
    }
}

/// Insert using the given timestamps. `completed_at` is only kept for
/// completed tasks.
pub(super) fn insert_task_row(
    conn: &Connection,
    task: &Task,
    created_at: &str,
    updated_at: &str,
    completed_at: Option<&str>,
) -> Result<i64> {
    let completed_at = if task.completed { completed_at } else { None };
    conn.execute(
        "INSERT INTO tasks (
            description, priority, category, due_date,
            completed, created_at, updated_at, completed_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            task.description,
            task.priority.as_str(),
            task.category,
            task.due_date,
            task.completed,
            created_at,
            updated_at,
            completed_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

impl Database {
    /// Insert a new task and return its assigned id. Timestamps are set to now.
    pub fn insert_task(&mut self, task: &Task) -> Result<i64> {
        task.validate()?;
        let id = self.transaction("insert task", |tx| {
            require_category(tx, &task.category)?;
            let now = now_timestamp();
            let completed_at = task.completed_at.clone().unwrap_or_else(|| now.clone());
            insert_task_row(tx, task, &now, &now, Some(&completed_at))
        })?;
        info!(task_id = id, "Task created");
        Ok(id)
    }

    /// Insert a batch of imported tasks in one transaction, assigning fresh
    /// ids. Timestamps carried by the tasks are kept; missing ones are set to
    /// now. Categories that do not exist yet are created.
    pub fn import_tasks(&mut self, tasks: &[Task]) -> Result<Vec<i64>> {
        for task in tasks {
            validate_task_fields(task)?;
        }
        let ids = self.transaction("import tasks", |tx| {
            let now = now_timestamp();
            let mut ids = Vec::with_capacity(tasks.len());
            for task in tasks {
                tx.execute(
                    "INSERT OR IGNORE INTO categories (name) VALUES (?1)",
                    params![task.category],
                )?;
                let created_at = task.created_at.as_deref().unwrap_or(&now);
                let updated_at = task.updated_at.as_deref().unwrap_or(&now);
                let completed_at = task.completed_at.as_deref().unwrap_or(&now);
                ids.push(insert_task_row(tx, task, created_at, updated_at, Some(completed_at))?);
            }
            Ok(ids)
        })?;
        info!(count = ids.len(), "Tasks imported");
        Ok(ids)
    }

    /// Overwrite an existing task's editable fields and bump `updated_at`.
    ///
    /// `completed_at` follows `completed`: set when the task becomes
    /// completed, kept while it stays completed, cleared otherwise.
    pub fn update_task(&mut self, task: &Task) -> Result<()> {
        let id = task
            .id
            .ok_or_else(|| Error::invalid("id", "Cannot update task without ID"))?;
        task.validate()?;

        self.transaction("update task", |tx| {
            require_category(tx, &task.category)?;
            let now = now_timestamp();
            let changed = tx.execute(
                "UPDATE tasks
                 SET description = ?1, priority = ?2, category = ?3, due_date = ?4,
                     completed = ?5, updated_at = ?6,
                     completed_at = CASE
                         WHEN ?5 = 0 THEN NULL
                         ELSE COALESCE(completed_at, ?6)
                     END
                 WHERE id = ?7",
                params![
                    task.description,
                    task.priority.as_str(),
                    task.category,
                    task.due_date,
                    task.completed,
                    now,
                    id,
                ],
            )?;
            if changed == 0 {
                return Err(Error::task_not_found(id));
            }
            Ok(())
        })?;
        info!(task_id = id, "Task updated");
        Ok(())
    }

    pub fn get_task(&self, id: i64) -> Result<Option<Task>> {
        self.read("get task", |conn| {
            let task = conn
                .query_row(
                    &format!("{} WHERE id = ?1", SELECT_TASKS),
                    params![id],
                    parse_task_row,
                )
                .optional()?;
            Ok(task)
        })
    }

    /// All tasks, newest first. Completed tasks only when asked for.
    pub fn list_tasks(&self, include_completed: bool) -> Result<Vec<Task>> {
        self.filter_tasks(&TaskFilter {
            include_completed,
            ..TaskFilter::default()
        })
    }

    /// Completed tasks, most recently completed first.
    pub fn list_completed(&self) -> Result<Vec<Task>> {
        self.read("list completed tasks", |conn| {
            query_tasks(
                conn,
                &format!(
                    "{} WHERE completed = 1 ORDER BY completed_at DESC, id DESC",
                    SELECT_TASKS
                ),
                &[],
            )
        })
    }

    pub fn list_by_category(&self, category: &str) -> Result<Vec<Task>> {
        self.read("list tasks by category", |conn| {
            query_tasks(
                conn,
                &format!(
                    "{} WHERE category = ?1 ORDER BY created_at DESC, id DESC",
                    SELECT_TASKS
                ),
                &[&category],
            )
        })
    }

    pub fn list_by_priority(&self, priority: Priority) -> Result<Vec<Task>> {
        self.read("list tasks by priority", |conn| {
            query_tasks(
                conn,
                &format!(
                    "{} WHERE priority = ?1 ORDER BY created_at DESC, id DESC",
                    SELECT_TASKS
                ),
                &[&priority.as_str()],
            )
        })
    }

    /// Case-insensitive substring search over descriptions.
    pub fn search_tasks(&self, query: &str) -> Result<Vec<Task>> {
        let pattern = like_pattern(query);
        self.read("search tasks", |conn| {
            query_tasks(
                conn,
                &format!(
                    "{} WHERE description LIKE ?1 ESCAPE '\\' ORDER BY created_at DESC, id DESC",
                    SELECT_TASKS
                ),
                &[&pattern],
            )
        })
    }

    /// Combined view query: search text, category, priority, and completion.
    pub fn filter_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if !filter.include_completed {
            clauses.push("completed = 0");
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            clauses.push("description LIKE ? ESCAPE '\\'");
            values.push(Box::new(like_pattern(search)));
        }
        if let Some(ref category) = filter.category {
            clauses.push("category = ?");
            values.push(Box::new(category.clone()));
        }
        if let Some(priority) = filter.priority {
            clauses.push("priority = ?");
            values.push(Box::new(priority.as_str()));
        }

        let mut sql = String::from(SELECT_TASKS);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let params_refs: Vec<&dyn ToSql> = values.iter().map(|b| b.as_ref()).collect();
        debug!(sql = %sql, "Filtering tasks");
        self.read("filter tasks", |conn| query_tasks(conn, &sql, &params_refs))
    }

    pub fn mark_complete(&mut self, id: i64) -> Result<()> {
        self.transaction("mark task complete", |tx| {
            let now = now_timestamp();
            let changed = tx.execute(
                "UPDATE tasks SET completed = 1, completed_at = ?1, updated_at = ?1 WHERE id = ?2",
                params![now, id],
            )?;
            if changed == 0 {
                return Err(Error::task_not_found(id));
            }
            Ok(())
        })?;
        info!(task_id = id, "Task marked as complete");
        Ok(())
    }

    pub fn mark_incomplete(&mut self, id: i64) -> Result<()> {
        self.transaction("mark task incomplete", |tx| {
            let changed = tx.execute(
                "UPDATE tasks SET completed = 0, completed_at = NULL, updated_at = ?1 WHERE id = ?2",
                params![now_timestamp(), id],
            )?;
            if changed == 0 {
                return Err(Error::task_not_found(id));
            }
            Ok(())
        })?;
        info!(task_id = id, "Task marked as incomplete");
        Ok(())
    }

    pub fn delete_task(&mut self, id: i64) -> Result<()> {
        self.transaction("delete task", |tx| {
            let changed = tx.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
            if changed == 0 {
                return Err(Error::task_not_found(id));
            }
            Ok(())
        })?;
        info!(task_id = id, "Task deleted");
        Ok(())
    }

    /// Delete every completed task, returning how many were removed.
    pub fn delete_completed(&mut self) -> Result<usize> {
        let removed = self.transaction("delete completed tasks", |tx| {
            Ok(tx.execute("DELETE FROM tasks WHERE completed = 1", [])?)
        })?;
        info!(count = removed, "Completed tasks deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("abc"), "%abc%");
        assert_eq!(like_pattern("50%"), "%50\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("c:\\tmp"), "%c:\\\\tmp%");
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_task(&Task::new("Raise price 50%").unwrap()).unwrap();
        db.insert_task(&Task::new("Raise price 500").unwrap()).unwrap();

        let found = db.search_tasks("50%").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].description, "Raise price 50%");
    }

    #[test]
    fn decoder_rejects_unknown_priority() {
        let mut db = Database::open_in_memory().unwrap();
        let id = db.insert_task(&Task::new("odd").unwrap()).unwrap();
        db.transaction("corrupt", |tx| {
            tx.execute("UPDATE tasks SET priority = 'Someday' WHERE id = ?1", params![id])?;
            Ok(())
        })
        .unwrap();

        assert!(matches!(db.get_task(id), Err(Error::Storage { operation: "get task", .. })));

        // The failure names the priority column's position in the select list.
        let column = match db.get_task(id) {
            Err(Error::Storage {
                source: rusqlite::Error::FromSqlConversionFailure(column, ..),
                ..
            }) => column,
            other => panic!("unexpected result: {:?}", other),
        };
        assert_eq!(column, 2);
    }

    #[test]
    fn import_rejects_invalid_category_before_storage() {
        let mut db = Database::open_in_memory().unwrap();
        let good = Task::new("a").unwrap().with_category("Work");
        let bad = Task::new("b").unwrap().with_category("");

        let err = db.import_tasks(&[good, bad]).unwrap_err();
        assert_eq!(err.field(), Some("category"));
        assert!(db.list_tasks(true).unwrap().is_empty());
        assert!(db.get_category("Work").unwrap().is_none());
    }
}
