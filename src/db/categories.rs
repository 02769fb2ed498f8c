//! Category operations.

use super::Database;
use crate::error::{Error, Result};
use crate::types::{Category, DEFAULT_CATEGORY};
use rusqlite::{ErrorCode, OptionalExtension, Row, params};
use tracing::{info, warn};

fn parse_category_row(row: &Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: Some(row.get("id")?),
        name: row.get("name")?,
        description: row.get("description")?,
    })
}

fn is_unique_violation(err: &Error) -> bool {
    matches!(
        err,
        Error::Storage {
            source: rusqlite::Error::SqliteFailure(e, _),
            ..
        } if e.code == ErrorCode::ConstraintViolation
    )
}

impl Database {
    /// Insert a new category and return its id. Names are unique.
    pub fn insert_category(&mut self, category: &Category) -> Result<i64> {
        let result = self.transaction("insert category", |tx| {
            tx.execute(
                "INSERT INTO categories (name, description) VALUES (?1, ?2)",
                params![category.name, category.description],
            )?;
            Ok(tx.last_insert_rowid())
        });

        match result {
            Ok(id) => {
                info!(category = %category.name, "Category created");
                Ok(id)
            }
            Err(err) if is_unique_violation(&err) => Err(Error::AlreadyExists {
                entity: "category",
                key: category.name.clone(),
            }),
            Err(err) => Err(err),
        }
    }

    /// All categories ordered by name.
    pub fn list_categories(&self) -> Result<Vec<Category>> {
        self.read("list categories", |conn| {
            let mut stmt =
                conn.prepare("SELECT id, name, description FROM categories ORDER BY name")?;
            let categories = stmt
                .query_map([], parse_category_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(categories)
        })
    }

    pub fn get_category(&self, name: &str) -> Result<Option<Category>> {
        self.read("get category", |conn| {
            let category = conn
                .query_row(
                    "SELECT id, name, description FROM categories WHERE name = ?1",
                    params![name],
                    parse_category_row,
                )
                .optional()?;
            Ok(category)
        })
    }

    /// Delete a category. Its tasks move to the default category in the same
    /// transaction; the number of moved tasks is returned.
    ///
    /// The default category itself cannot be deleted.
    pub fn delete_category(&mut self, name: &str) -> Result<usize> {
        if name == DEFAULT_CATEGORY {
            warn!(category = name, "Refused to delete the default category");
            return Err(Error::invalid(
                "category",
                format!("Cannot delete the {} category", DEFAULT_CATEGORY),
            ));
        }

        let moved = self.transaction("delete category", |tx| {
            let moved = tx.execute(
                "UPDATE tasks SET category = ?1 WHERE category = ?2",
                params![DEFAULT_CATEGORY, name],
            )?;
            let deleted = tx.execute("DELETE FROM categories WHERE name = ?1", params![name])?;
            if deleted == 0 {
                return Err(Error::category_not_found(name));
            }
            Ok(moved)
        })?;

        info!(category = name, reassigned = moved, "Category deleted");
        Ok(moved)
    }
}
