use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::classify::format_timestamp;
use crate::model::Role;
use crate::tracker::DEFAULT_TIMESTAMP_FORMAT;

/// A validation error in the configuration
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]: {}", self.field, self.message)
    }
}

/// Who is at the keyboard
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct SessionConfig {
    /// "Admin" or "Employee"
    #[serde(default)]
    pub role: Option<String>,
}

/// Where tracker data lives
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DisplayConfig {
    /// chrono strftime pattern for record timestamps
    #[serde(default)]
    pub timestamp_format: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ScannerConfig {
    /// Ignore a repeat of the same code within this many milliseconds
    #[serde(default)]
    pub cooldown_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct JournalConfig {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub journal: JournalConfig,
}

impl Config {
    /// Load configuration from default paths
    /// Priority: local (.rollcall/config.local.toml) > project (.rollcall/config.toml)
    /// > user (~/.rollcall/config.toml)
    pub fn load() -> Result<Self> {
        Self::load_layered(dirs::home_dir().as_deref(), Path::new("."))
    }

    /// Layered load with explicit home and project roots
    pub fn load_layered(home: Option<&Path>, root: &Path) -> Result<Self> {
        let mut config = Self::default();

        if let Some(home) = home {
            let user_config = home.join(".rollcall").join("config.toml");
            if user_config.exists() {
                config.merge(Self::load_from(&user_config)?);
            }
        }

        let project_config = root.join(".rollcall").join("config.toml");
        if project_config.exists() {
            config.merge(Self::load_from(&project_config)?);
        }

        // Should be gitignored
        let local_config = root.join(".rollcall").join("config.local.toml");
        if local_config.exists() {
            config.merge(Self::load_from(&local_config)?);
        }

        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Merge another config into this one (other takes priority where set)
    pub fn merge(&mut self, other: Config) {
        if other.session.role.is_some() {
            self.session.role = other.session.role;
        }
        if other.storage.data_dir.is_some() {
            self.storage.data_dir = other.storage.data_dir;
        }
        if other.display.timestamp_format.is_some() {
            self.display.timestamp_format = other.display.timestamp_format;
        }
        if other.scanner.cooldown_ms.is_some() {
            self.scanner.cooldown_ms = other.scanner.cooldown_ms;
        }
        if other.journal.enabled.is_some() {
            self.journal.enabled = other.journal.enabled;
        }
        if other.journal.dir.is_some() {
            self.journal.dir = other.journal.dir;
        }
    }

    /// Session role; Admin unless configured otherwise
    pub fn role(&self) -> Role {
        self.session
            .role
            .as_deref()
            .and_then(Role::from_str)
            .unwrap_or_default()
    }

    pub fn data_dir(&self, root: &Path) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(|| root.join(".rollcall").join("data"))
    }

    pub fn journal_dir(&self, root: &Path) -> PathBuf {
        self.journal
            .dir
            .clone()
            .unwrap_or_else(|| root.join(".rollcall").join("journal"))
    }

    pub fn journal_enabled(&self) -> bool {
        self.journal.enabled.unwrap_or(true)
    }

    pub fn timestamp_format(&self) -> &str {
        self.display
            .timestamp_format
            .as_deref()
            .unwrap_or(DEFAULT_TIMESTAMP_FORMAT)
    }

    pub fn cooldown_ms(&self) -> u64 {
        self.scanner.cooldown_ms.unwrap_or(0)
    }

    /// Validate configuration and return any errors found
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Some(role) = &self.session.role {
            if Role::from_str(role).is_none() {
                errors.push(ValidationError {
                    field: "session.role".to_string(),
                    message: format!("Unknown role '{}', expected Admin or Employee", role),
                });
            }
        }

        if let Some(format) = &self.display.timestamp_format {
            if format.trim().is_empty() {
                errors.push(ValidationError {
                    field: "display.timestamp_format".to_string(),
                    message: "Format must not be empty".to_string(),
                });
            } else if !is_valid_timestamp_format(format) {
                errors.push(ValidationError {
                    field: "display.timestamp_format".to_string(),
                    message: format!("Invalid strftime pattern '{}'", format),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// True if `format` renders a local wall-clock instant
pub fn is_valid_timestamp_format(format: &str) -> bool {
    NaiveDate::from_ymd_opt(2024, 1, 31)
        .and_then(|d| d.and_hms_milli_opt(23, 59, 59, 999))
        .and_then(|sample| format_timestamp(sample, format))
        .is_some()
}
