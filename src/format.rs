//! Output formatting for task views, categories, and statistics.

use crate::config::{Theme, UiConfig};
use crate::types::{Category, Priority, Statistics, Task};
use chrono::NaiveDate;
use serde::Serialize;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Rendering parameters for a tabular task view.
#[derive(Debug, Clone)]
pub struct View {
    pub columns: usize,
    pub rows: usize,
    pub theme: Theme,
    pub today: NaiveDate,
}

impl View {
    pub fn new(ui: &UiConfig, today: NaiveDate) -> Self {
        Self {
            columns: ui.columns(),
            rows: ui.rows(),
            theme: ui.theme,
            today,
        }
    }

    fn status_glyph(&self, task: &Task) -> &'static str {
        match (self.theme, task.completed) {
            (Theme::Default, true) => "✓",
            (Theme::Default, false) => "○",
            (Theme::Ascii, true) => "x",
            (Theme::Ascii, false) => "-",
        }
    }
}

const ID_WIDTH: usize = 5;
const PRIORITY_WIDTH: usize = 7;
const CATEGORY_WIDTH: usize = 14;
const DUE_WIDTH: usize = 11;

/// Shorten `s` to at most `width` characters, marking the cut.
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let keep = width.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Render a task list as a fixed-width table followed by a status line.
///
/// `total` is the size of the unfiltered view, for the
/// `Showing N of M tasks` line.
pub fn render_task_table(tasks: &[Task], total: usize, view: &View) -> String {
    let fixed = 2 + ID_WIDTH + 1 + PRIORITY_WIDTH + 1 + CATEGORY_WIDTH + 1 + DUE_WIDTH + 1;
    let desc_width = view.columns.saturating_sub(fixed).max(10);

    let mut out = String::new();
    out.push_str(&format!(
        "  {:<ID_WIDTH$} {:<PRIORITY_WIDTH$} {:<CATEGORY_WIDTH$} {:<DUE_WIDTH$} {}\n",
        "ID", "Pri", "Category", "Due", "Description"
    ));

    for task in tasks.iter().take(view.rows) {
        let id = task.id.map(|id| id.to_string()).unwrap_or_default();
        let mut due = task.due_date.clone().unwrap_or_default();
        if task.is_overdue(view.today) {
            due.push('!');
        }
        out.push_str(&format!(
            "{} {:<ID_WIDTH$} {:<PRIORITY_WIDTH$} {:<CATEGORY_WIDTH$} {:<DUE_WIDTH$} {}\n",
            view.status_glyph(task),
            id,
            task.priority.as_str(),
            truncate(&task.category, CATEGORY_WIDTH),
            due,
            truncate(&task.description, desc_width),
        ));
    }

    if tasks.len() > view.rows {
        out.push_str(&format!("  ... {} more\n", tasks.len() - view.rows));
    }
    out.push_str(&format!("Showing {} of {} tasks\n", tasks.len(), total));
    out
}

/// Render one task with all its fields.
pub fn render_task_detail(task: &Task) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", task));
    if let Some(id) = task.id {
        out.push_str(&format!("  id:           {}\n", id));
    }
    out.push_str(&format!("  priority:     {}\n", task.priority));
    out.push_str(&format!("  category:     {}\n", task.category));
    if let Some(ref due) = task.due_date {
        out.push_str(&format!("  due:          {}\n", due));
    }
    out.push_str(&format!("  completed:    {}\n", if task.completed { "yes" } else { "no" }));
    if let Some(ref ts) = task.created_at {
        out.push_str(&format!("  created:      {}\n", ts));
    }
    if let Some(ref ts) = task.updated_at {
        out.push_str(&format!("  updated:      {}\n", ts));
    }
    if let Some(ref ts) = task.completed_at {
        out.push_str(&format!("  completed at: {}\n", ts));
    }
    out
}

pub fn render_categories(categories: &[Category]) -> String {
    let mut out = String::new();
    for category in categories {
        out.push_str(&category.name);
        if category.is_default() {
            out.push_str(" (default)");
        }
        if let Some(d) = category.description.as_deref().filter(|d| !d.is_empty()) {
            out.push_str(&format!(" - {}", d));
        }
        out.push('\n');
    }
    out
}

/// Full statistics report. Priorities are listed in enum order, including
/// levels with no tasks.
pub fn render_statistics(stats: &Statistics) -> String {
    let mut out = String::from("Task Statistics:\n\n");
    out.push_str(&format!("Total Tasks: {}\n", stats.total));
    out.push_str(&format!("Active Tasks: {}\n", stats.active));
    out.push_str(&format!("Completed Tasks: {}\n", stats.completed));
    out.push_str(&format!("Overdue Tasks: {}\n", stats.overdue));

    out.push_str("\nTasks by Priority:\n");
    for priority in Priority::ALL {
        out.push_str(&format!("  {}: {}\n", priority, stats.priority_count(priority)));
    }

    out.push_str("\nTasks by Category:\n");
    for (category, count) in &stats.by_category {
        out.push_str(&format!("  {}: {}\n", category, count));
    }
    out
}

/// One-line summary for the status line after mutations.
pub fn status_summary(stats: &Statistics) -> String {
    let mut line = format!("Active: {} | Completed: {}", stats.active, stats.completed);
    if stats.overdue > 0 {
        line.push_str(&format!(" | Overdue: {}", stats.overdue));
    }
    line
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}
