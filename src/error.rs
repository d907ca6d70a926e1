//! Crate-level error types.
//!
//! Each component owns its own error enum; this module holds the shared
//! `PathError` and the aggregate `Error` the command layer returns.

use crate::config::ConfigError;
use crate::fileops::DuplicationError;
use crate::template::TemplateError;
use crate::weather::WeatherError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Call-level failure on the folder an operation was pointed at
#[derive(Debug, Clone, Error, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PathError {
    #[error("Path not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("Not a directory: {}", .path.display())]
    NotADirectory { path: PathBuf },

    #[error("I/O error on {}: {}", .path.display(), .message)]
    Io { path: PathBuf, message: String },
}

impl PathError {
    pub fn io(path: &Path, err: std::io::Error) -> Self {
        PathError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

/// Fail unless `path` exists and is a directory
pub fn require_dir(path: &Path) -> Result<(), PathError> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(PathError::NotADirectory {
            path: path.to_path_buf(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(PathError::NotFound {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(PathError::io(path, e)),
    }
}

/// Any error a command can end with
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Error {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Duplication(#[from] DuplicationError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Weather(#[from] WeatherError),

    #[error("Invalid input: {message}")]
    Input { message: String },

    #[error("Background task failed: {message}")]
    Task { message: String },
}

impl Error {
    pub fn input(message: impl Into<String>) -> Self {
        Error::Input {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::input(format!("Invalid JSON: {}", err))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_require_dir_classifies_paths() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, b"x").unwrap();

        assert!(require_dir(dir.path()).is_ok());
        assert!(matches!(require_dir(&file), Err(PathError::NotADirectory { .. })));
        assert!(matches!(
            require_dir(&dir.path().join("missing")),
            Err(PathError::NotFound { .. })
        ));
    }

    #[test]
    fn test_errors_serialize_with_kind_tags() {
        let err = Error::from(PathError::NotFound {
            path: PathBuf::from("/nope"),
        });
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "PATH");
        assert_eq!(json["kind"], "NOT_FOUND");
        assert_eq!(json["path"], "/nope");
    }
}
