//! Core records: tasks, categories, priorities, statistics.

use crate::error::ValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Name of the category that always exists and cannot be deleted.
pub const DEFAULT_CATEGORY: &str = "General";

/// Task urgency. Stored as its capitalized name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// All levels, lowest first.
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Urgent => "Urgent",
        }
    }

    /// Case-insensitive lookup, for user input.
    pub fn parse_loose(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| {
                ValidationError::new(
                    "priority",
                    format!("Priority must be one of {}", priority_names()),
                )
            })
    }
}

/// Comma-separated list of the valid priority names.
pub fn priority_names() -> String {
    Priority::ALL
        .iter()
        .map(Priority::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Assigned by storage on insert.
    #[serde(default)]
    pub id: Option<i64>,
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl Task {
    /// Create an unsaved task. The description must not be blank.
    pub fn new(description: impl Into<String>) -> Result<Self, ValidationError> {
        let task = Self {
            id: None,
            description: description.into(),
            priority: Priority::default(),
            category: default_category(),
            due_date: None,
            completed: false,
            created_at: None,
            updated_at: None,
            completed_at: None,
        };
        task.validate()?;
        Ok(task)
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    /// Check the model invariant: description must not be blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.description.trim().is_empty() {
            return Err(ValidationError::new(
                "description",
                "Task description cannot be empty",
            ));
        }
        Ok(())
    }

    /// True when the task is active and its due date is strictly before `today`.
    /// Unparseable due dates never count as overdue.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        if self.completed {
            return false;
        }
        self.due_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, crate::validate::DATE_FORMAT).ok())
            .is_some_and(|due| due < today)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.completed { "✓" } else { "○" };
        write!(f, "{} [{}] {}", status, self.priority, self.description)?;
        if let Some(ref due) = self.due_date {
            write!(f, " (Due: {})", due)?;
        }
        Ok(())
    }
}

/// A named grouping for tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::new("name", "Category name cannot be empty"));
        }
        Ok(Self {
            id: None,
            name,
            description: None,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_CATEGORY
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Criteria for the combined task view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Case-insensitive substring of the description.
    pub search: Option<String>,
    pub category: Option<String>,
    pub priority: Option<Priority>,
    pub include_completed: bool,
}

impl TaskFilter {
    pub fn is_empty(&self) -> bool {
        self.search.as_deref().is_none_or(str::is_empty)
            && self.category.is_none()
            && self.priority.is_none()
    }
}

/// Column a task listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SortKey {
    Id,
    Description,
    Priority,
    Category,
    Due,
    Created,
}

impl SortKey {
    /// Stable ascending sort on this column, or descending when `reverse`.
    /// Tasks without a due date sort after dated ones.
    pub fn sort(self, tasks: &mut [Task], reverse: bool) {
        tasks.sort_by(|a, b| {
            let ord = match self {
                SortKey::Id => a.id.cmp(&b.id),
                SortKey::Description => a
                    .description
                    .to_lowercase()
                    .cmp(&b.description.to_lowercase()),
                SortKey::Priority => a.priority.cmp(&b.priority),
                SortKey::Category => a.category.cmp(&b.category),
                SortKey::Due => (a.due_date.is_none(), &a.due_date)
                    .cmp(&(b.due_date.is_none(), &b.due_date)),
                SortKey::Created => (&a.created_at, a.id).cmp(&(&b.created_at, b.id)),
            };
            if reverse { ord.reverse() } else { ord }
        });
    }
}

/// Aggregate counts over the task table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub total: i64,
    pub completed: i64,
    pub active: i64,
    /// Active tasks per priority.
    pub by_priority: BTreeMap<Priority, i64>,
    /// Active tasks per category name.
    pub by_category: BTreeMap<String, i64>,
    /// Active tasks whose due date is strictly before today.
    pub overdue: i64,
}

impl Statistics {
    pub fn priority_count(&self, priority: Priority) -> i64 {
        self.by_priority.get(&priority).copied().unwrap_or(0)
    }
}
