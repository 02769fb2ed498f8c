//! Configuration loading and management.
//!
//! Built once at startup and passed to each component. Sources, lowest to
//! highest precedence:
//! 1. Built-in defaults
//! 2. YAML file (`--config`, else `task-manager.yaml` in the working directory)
//! 3. Environment variables
//!
//! ## Environment Variables
//! - `TASK_MANAGER_DB` - Database file (relative paths resolve against the data dir)
//! - `TASK_MANAGER_DATA_DIR` - Data directory (exports and backups live under it)
//! - `LOG_LEVEL` - Log filter, e.g. `info` or `debug`
//! - `WINDOW_WIDTH` / `WINDOW_HEIGHT` - View dimensions
//! - `THEME` - `default` or `ascii`

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "task-manager.yaml";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub ui: UiConfig,
}

/// Database settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file. Relative paths resolve against the data directory.
    #[serde(default = "default_db_file")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_file(),
        }
    }
}

fn default_db_file() -> PathBuf {
    PathBuf::from("tasks.db")
}

/// Filesystem locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("task-manager"))
        .unwrap_or_else(|| PathBuf::from("data"))
}

impl PathsConfig {
    pub fn exports_dir(&self) -> PathBuf {
        self.data_dir.join("exports")
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.data_dir.join("backups")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Glyph set for rendering views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Default,
    Ascii,
}

impl Theme {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "default" => Some(Theme::Default),
            "ascii" => Some(Theme::Ascii),
            _ => None,
        }
    }
}

/// View settings. Dimensions are in pixels and scaled to character cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub theme: Theme,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            theme: Theme::default(),
        }
    }
}

fn default_width() -> u32 {
    1000
}

fn default_height() -> u32 {
    700
}

/// Approximate pixel size of one character cell.
const CELL_WIDTH_PX: u32 = 8;
const CELL_HEIGHT_PX: u32 = 20;

impl UiConfig {
    /// Line width of rendered views, in characters.
    pub fn columns(&self) -> usize {
        (self.width / CELL_WIDTH_PX).max(40) as usize
    }

    /// Maximum task rows per rendered view.
    pub fn rows(&self) -> usize {
        (self.height / CELL_HEIGHT_PX).max(5) as usize
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Load from the explicit file, or the default file if present, or
    /// defaults; then apply environment overrides.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Self::load(DEFAULT_CONFIG_FILE)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply environment-style overrides. Unparseable numbers are ignored.
    pub fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = var("TASK_MANAGER_DATA_DIR") {
            self.paths.data_dir = PathBuf::from(dir);
        }
        if let Some(db) = var("TASK_MANAGER_DB") {
            self.database.path = PathBuf::from(db);
        }
        if let Some(level) = var("LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }
        if let Some(width) = var("WINDOW_WIDTH").and_then(|w| w.parse().ok()) {
            self.ui.width = width;
        }
        if let Some(height) = var("WINDOW_HEIGHT").and_then(|h| h.parse().ok()) {
            self.ui.height = height;
        }
        if let Some(theme) = var("THEME").as_deref().and_then(Theme::parse) {
            self.ui.theme = theme;
        }
    }

    /// Resolved database file path.
    pub fn db_path(&self) -> PathBuf {
        if self.database.path.is_absolute() {
            self.database.path.clone()
        } else {
            self.paths.data_dir.join(&self.database.path)
        }
    }

    /// Create the data, exports, and backups directories.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [
            self.paths.data_dir.clone(),
            self.paths.exports_dir(),
            self.paths.backups_dir(),
        ] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.database.path, PathBuf::from("tasks.db"));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.ui.width, 1000);
        assert_eq!(config.ui.height, 700);
        assert_eq!(config.ui.theme, Theme::Default);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = Config::default();
        config.apply_overrides(vars(&[
            ("TASK_MANAGER_DB", "work.db"),
            ("TASK_MANAGER_DATA_DIR", "/srv/tasks"),
            ("LOG_LEVEL", "DEBUG"),
            ("WINDOW_WIDTH", "1280"),
            ("WINDOW_HEIGHT", "not-a-number"),
            ("THEME", "ascii"),
        ]));

        assert_eq!(config.db_path(), PathBuf::from("/srv/tasks/work.db"));
        assert_eq!(config.paths.backups_dir(), PathBuf::from("/srv/tasks/backups"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.ui.width, 1280);
        assert_eq!(config.ui.height, 700);
        assert_eq!(config.ui.theme, Theme::Ascii);
    }

    #[test]
    fn absolute_db_path_ignores_data_dir() {
        let mut config = Config::default();
        config.database.path = PathBuf::from("/tmp/elsewhere.db");
        assert_eq!(config.db_path(), PathBuf::from("/tmp/elsewhere.db"));
    }

    #[test]
    fn load_partial_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("task-manager.yaml");
        std::fs::write(
            &path,
            "database:\n  path: personal.db\nui:\n  theme: ascii\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.database.path, PathBuf::from("personal.db"));
        assert_eq!(config.ui.theme, Theme::Ascii);
        assert_eq!(config.ui.width, 1000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn view_dimensions_scale_from_pixels() {
        let ui = UiConfig::default();
        assert_eq!(ui.columns(), 125);
        assert_eq!(ui.rows(), 35);

        let tiny = UiConfig {
            width: 10,
            height: 10,
            theme: Theme::Default,
        };
        assert_eq!(tiny.columns(), 40);
        assert_eq!(tiny.rows(), 5);
    }
}
