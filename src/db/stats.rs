//! Aggregation queries for statistics.

use super::Database;
use crate::error::Result;
use crate::types::{Priority, Statistics};
use chrono::NaiveDate;
use rusqlite::params;
use std::collections::BTreeMap;
use tracing::warn;

impl Database {
    /// Aggregate task counts. Grouped counts and `overdue` cover active
    /// tasks only; a task is overdue when its due date is strictly before
    /// `today`.
    pub fn statistics(&self, today: NaiveDate) -> Result<Statistics> {
        self.read("compute statistics", |conn| {
            let (total, completed): (i64, i64) = conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(completed), 0) FROM tasks",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            let mut by_priority = BTreeMap::new();
            let mut stmt = conn.prepare(
                "SELECT priority, COUNT(*) FROM tasks WHERE completed = 0 GROUP BY priority",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                let (name, count) = row?;
                match name.parse::<Priority>() {
                    Ok(priority) => {
                        by_priority.insert(priority, count);
                    }
                    Err(_) => warn!(priority = %name, count, "Skipping unknown priority in statistics"),
                }
            }

            let mut stmt = conn.prepare(
                "SELECT category, COUNT(*) FROM tasks WHERE completed = 0 GROUP BY category",
            )?;
            let by_category = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
                .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;

            let overdue: i64 = conn.query_row(
                "SELECT COUNT(*) FROM tasks
                 WHERE completed = 0
                   AND due_date IS NOT NULL
                   AND date(due_date) < date(?1)",
                params![today.format("%Y-%m-%d").to_string()],
                |row| row.get(0),
            )?;

            Ok(Statistics {
                total,
                completed,
                active: total - completed,
                by_priority,
                by_category,
                overdue,
            })
        })
    }
}
