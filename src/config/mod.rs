//! Settings
//!
//! Loaded from `~/.config/report-kit/settings.json` when present (defaults
//! otherwise), then overridden by environment variables. `.env` files are read
//! in `run()` before this happens, so they participate as environment.
//!
//! | Variable                     | Setting          |
//! |------------------------------|------------------|
//! | `REPORT_KIT_LOCALE`          | `locale`         |
//! | `REPORT_KIT_WORKERS`         | `workers`        |
//! | `REPORT_KIT_PAGE_SEPARATOR`  | `pageSeparator`  |
//! | `REPORT_KIT_MAX_TEXT_LENGTH` | `maxTextLength`  |

use crate::extract::{ExtractorOptions, DEFAULT_MAX_TEXT_LENGTH, DEFAULT_PAGE_SEPARATOR};
use crate::lexicon::MonthLocale;
use crate::template::{GeneratedTable, TemplateOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Error, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigError {
    #[error("Failed to read settings {}: {}", .path.display(), .message)]
    Io { path: PathBuf, message: String },

    #[error("Invalid settings file {}: {}", .path.display(), .message)]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue { name: String, value: String },

    #[error("Invalid settings: {message}")]
    Invalid { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Language of month names written into filenames
    pub locale: MonthLocale,
    /// Parallel PDF extraction workers
    pub workers: usize,
    pub page_separator: String,
    pub max_text_length: usize,
    /// Markers whose paragraphs are justified after substitution
    pub justified_markers: Vec<String>,
    pub title_table: GeneratedTable,
    pub description_table: GeneratedTable,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            locale: MonthLocale::default(),
            workers: num_cpus::get(),
            page_separator: DEFAULT_PAGE_SEPARATOR.to_string(),
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
            justified_markers: vec![
                "activities".to_string(),
                "conclusions".to_string(),
                "recommendations".to_string(),
            ],
            title_table: GeneratedTable::title_default(),
            description_table: GeneratedTable::description_default(),
        }
    }
}

impl Settings {
    /// Default settings file (~/.config/report-kit/settings.json)
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("report-kit")
            .join("settings.json")
    }

    /// Settings file (if any) plus process environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);
        let mut settings = if path.exists() {
            Self::from_path(&path)?
        } else {
            tracing::debug!("[Settings] No settings file at {}, using defaults", path.display());
            Self::default()
        };

        settings.apply_overrides(|name| std::env::var(name).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let settings = serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        tracing::debug!("[Settings] Loaded {}", path.display());
        Ok(settings)
    }

    /// Apply `REPORT_KIT_*` overrides read through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("REPORT_KIT_LOCALE") {
            self.locale = MonthLocale::from_code(&value).ok_or_else(|| ConfigError::InvalidValue {
                name: "REPORT_KIT_LOCALE".to_string(),
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup("REPORT_KIT_WORKERS") {
            self.workers = parse_number("REPORT_KIT_WORKERS", &value)?;
        }
        if let Some(value) = lookup("REPORT_KIT_PAGE_SEPARATOR") {
            // Allow "\n" escapes from shells and .env files
            self.page_separator = value.replace("\\n", "\n");
        }
        if let Some(value) = lookup("REPORT_KIT_MAX_TEXT_LENGTH") {
            self.max_text_length = parse_number("REPORT_KIT_MAX_TEXT_LENGTH", &value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid {
                message: "workers must be at least 1".to_string(),
            });
        }
        if self.max_text_length == 0 {
            return Err(ConfigError::Invalid {
                message: "maxTextLength must be at least 1".to_string(),
            });
        }
        for (name, table, fields) in [
            ("titleTable", &self.title_table, 2),
            ("descriptionTable", &self.description_table, 3),
        ] {
            if table.headers.len() != fields || table.widths.len() != fields {
                return Err(ConfigError::Invalid {
                    message: format!("{} needs {} headers and {} widths", name, fields, fields),
                });
            }
        }
        Ok(())
    }

    pub fn extractor_options(&self) -> ExtractorOptions {
        ExtractorOptions {
            page_separator: self.page_separator.clone(),
            max_text_length: self.max_text_length,
            workers: self.workers,
        }
    }

    pub fn template_options(&self) -> TemplateOptions {
        TemplateOptions {
            justified_markers: self.justified_markers.iter().cloned().collect(),
            title_table: self.title_table.clone(),
            description_table: self.description_table.clone(),
        }
    }
}

fn parse_number(name: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
    })
}
