//! Configuration handling for statusflow
//!
//! Settings are stored in `.statusflow/config.toml` (project) and
//! `~/.config/statusflow/config.toml` (global). A project file replaces the
//! global one as a whole.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{DateError, DateSettings, ModelError, StatusModel};

/// Directory marking a statusflow project
pub const PROJECT_DIR: &str = ".statusflow";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Invalid status model: {0}")]
    Model(#[from] ModelError),

    #[error("Invalid date settings: {0}")]
    Dates(#[from] DateError),
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Everything the pipeline consumes
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Default output format (text or json)
    pub default_format: OutputFormat,

    /// Status names, markers and cycles
    pub statuses: StatusModel,

    /// Lifecycle date stamping
    pub dates: DateSettings,
}

impl Settings {
    /// Parses settings from TOML and validates them
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let settings: Settings =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.statuses.statuses.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one status is required".to_string(),
            ));
        }
        for kind in crate::domain::LifecycleDate::ALL {
            let stamp = self.dates.stamp(kind);
            if stamp.marker.trim().is_empty() || stamp.field.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "{kind} date needs a marker and a field name"
                )));
            }
        }

        self.statuses.validate()?;
        self.dates.validate()?;
        Ok(())
    }
}

/// Loaded settings and where they came from
#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    pub project_root: Option<PathBuf>,
    /// File the settings were read from, if any
    pub source: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from default locations
    pub fn load() -> Result<Self> {
        match Self::find_project_root() {
            Some(root) => Self::for_project(&root),
            None => Self::global(),
        }
    }

    /// Loads configuration for a specific project
    pub fn for_project(project_root: &Path) -> Result<Self> {
        let path = project_root.join(PROJECT_DIR).join("config.toml");
        if !path.exists() {
            let mut config = Self::global()?;
            config.project_root = Some(project_root.to_path_buf());
            return Ok(config);
        }

        Ok(Self {
            settings: Self::from_path(&path)?,
            project_root: Some(project_root.to_path_buf()),
            source: Some(path),
        })
    }

    /// Loads only the global configuration
    fn global() -> Result<Self> {
        let path = Self::global_config_dir()
            .map(|dir| dir.join("config.toml"))
            .filter(|path| path.exists());

        let settings = match &path {
            Some(path) => Self::from_path(path)?,
            None => Settings::default(),
        };

        Ok(Self {
            settings,
            project_root: None,
            source: path,
        })
    }

    /// Reads and validates a settings file
    pub fn from_path(path: &Path) -> Result<Settings> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        Settings::from_toml(&content)
            .with_context(|| format!("Failed to load config: {}", path.display()))
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "statusflow", "statusflow")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Finds the project root by looking for a `.statusflow/` directory
    pub fn find_project_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::find_project_root_from(&current)
    }

    pub fn find_project_root_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Writes default settings to a new project
    pub fn init_project(project_root: &Path) -> Result<PathBuf> {
        let dir = project_root.join(PROJECT_DIR);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

        let path = dir.join("config.toml");
        let content =
            toml::to_string_pretty(&Settings::default()).context("Failed to serialize settings")?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;

        Ok(path)
    }
}
