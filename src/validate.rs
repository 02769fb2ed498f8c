//! Field validators for user-supplied task and category input.
//!
//! Pure functions: each returns `Ok` or a [`ValidationError`] naming the
//! field and a reason suitable for showing to the user.

use crate::error::ValidationError;
use crate::types::{Priority, Task};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

pub const MAX_DESCRIPTION_LEN: usize = 500;
pub const MAX_CATEGORY_LEN: usize = 50;

/// Format of due dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Letters, digits, underscores, whitespace, and hyphens, in any script.
static CATEGORY_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w\s\-]+$").expect("category pattern is valid"));

pub fn validate_description(description: &str) -> Result<(), ValidationError> {
    if description.trim().is_empty() {
        return Err(ValidationError::new(
            "description",
            "Description cannot be empty",
        ));
    }
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::new(
            "description",
            format!("Description cannot exceed {} characters", MAX_DESCRIPTION_LEN),
        ));
    }
    Ok(())
}

/// Accepts exactly one of the priority names and returns the parsed level.
pub fn validate_priority(priority: &str) -> Result<Priority, ValidationError> {
    priority.parse()
}

/// Empty input means "no due date" and is valid. Otherwise the date must be
/// zero-padded `YYYY-MM-DD`, the only form SQLite's `date()` understands.
pub fn validate_date(date: &str) -> Result<(), ValidationError> {
    if date.is_empty() {
        return Ok(());
    }
    match NaiveDate::parse_from_str(date, DATE_FORMAT) {
        Ok(d) if d.format(DATE_FORMAT).to_string() == date => Ok(()),
        _ => Err(ValidationError::new(
            "due_date",
            "Date must be in format YYYY-MM-DD",
        )),
    }
}

pub fn validate_category(category: &str) -> Result<(), ValidationError> {
    if category.trim().is_empty() {
        return Err(ValidationError::new("category", "Category cannot be empty"));
    }
    if category.chars().count() > MAX_CATEGORY_LEN {
        return Err(ValidationError::new(
            "category",
            format!("Category name cannot exceed {} characters", MAX_CATEGORY_LEN),
        ));
    }
    if !CATEGORY_CHARS.is_match(category) {
        return Err(ValidationError::new(
            "category",
            "Category can only contain letters, numbers, spaces, hyphens, and underscores",
        ));
    }
    Ok(())
}

/// Field checks for a task arriving from a file rather than from the
/// command line: description, category, and due date.
pub fn validate_task_fields(task: &Task) -> Result<(), ValidationError> {
    validate_description(&task.description)?;
    validate_category(&task.category)?;
    if let Some(ref due) = task.due_date {
        validate_date(due)?;
    }
    Ok(())
}
