//! Shared data model: per-entry batch outcomes and activity table rows.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Outcome of processing one filesystem entry in a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FileOperationResult<D> {
    Success { path: PathBuf, detail: D },
    Failure { path: PathBuf, reason: FailureReason },
}

impl<D> FileOperationResult<D> {
    pub fn path(&self) -> &Path {
        match self {
            FileOperationResult::Success { path, .. } | FileOperationResult::Failure { path, .. } => {
                path
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FileOperationResult::Success { .. })
    }

    pub fn detail(&self) -> Option<&D> {
        match self {
            FileOperationResult::Success { detail, .. } => Some(detail),
            FileOperationResult::Failure { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&FailureReason> {
        match self {
            FileOperationResult::Success { .. } => None,
            FileOperationResult::Failure { reason, .. } => Some(reason),
        }
    }
}

/// Why a single entry was not processed
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    #[error("No month name found in file name")]
    NoMonthTokenFound,

    #[error("Target name already taken: {}", .target.display())]
    NameCollision { target: PathBuf },

    #[error("I/O error: {message}")]
    Io { message: String },
}

/// Row of the activities summary table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityTitleRow {
    #[serde(alias = "actividad")]
    pub activity: String,
    #[serde(alias = "mes")]
    pub month: String,
}

impl ActivityTitleRow {
    pub fn cells(&self) -> Vec<&str> {
        vec![&self.activity, &self.month]
    }
}

/// Row of the planned/executed/verifier detail table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDescriptionRow {
    #[serde(alias = "actividad")]
    pub activity: String,
    #[serde(alias = "descripcion", alias = "descripción")]
    pub description: String,
    #[serde(alias = "verificador")]
    pub verifier: String,
}

impl ActivityDescriptionRow {
    pub fn cells(&self) -> Vec<&str> {
        vec![&self.activity, &self.description, &self.verifier]
    }
}
