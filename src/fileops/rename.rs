//! File Renamer
//!
//! Rewrites the month name embedded in each filename of a folder to the
//! current month ("informe_marzo.pdf" → "informe_ABRIL.pdf"). Runs as one
//! coordinating pass: every target name is checked against the disk and
//! against names already claimed earlier in the same batch before anything
//! is renamed, so two entries can never end up on the same name.

use crate::error::{require_dir, PathError};
use crate::lexicon::{MonthLexicon, MonthToken};
use crate::models::{FailureReason, FileOperationResult};
use serde::Serialize;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenameMode {
    #[default]
    Apply,
    /// Compute outcomes without touching the filesystem
    DryRun,
}

/// Detail of a successful (or previewed) rename
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Renamed {
    pub from: String,
    pub to: String,
    pub month: MonthToken,
    /// False for dry runs and for names that were already current
    pub applied: bool,
}

#[derive(Debug, Clone)]
pub struct FileRenamer {
    lexicon: MonthLexicon,
}

impl FileRenamer {
    pub fn new(lexicon: MonthLexicon) -> Self {
        Self { lexicon }
    }

    /// New name for `file_name` with its month replaced by the current one
    pub fn plan_name(&self, file_name: &str) -> Option<(String, MonthToken)> {
        let found = MonthLexicon::find_in(file_name)?;
        let current = self.lexicon.display_form(self.lexicon.current());
        let mut renamed = String::with_capacity(file_name.len() + current.len());
        renamed.push_str(&file_name[..found.range.start]);
        renamed.push_str(current);
        renamed.push_str(&file_name[found.range.end..]);
        Some((renamed, found.token))
    }

    /// Rename every regular file directly inside `folder`
    pub fn rename_by_month(
        &self,
        folder: &Path,
        mode: RenameMode,
    ) -> Result<Vec<FileOperationResult<Renamed>>, PathError> {
        require_dir(folder)?;
        let files = list_files(folder)?;

        tracing::info!(
            "[FileRenamer] {} files in {} ({:?}), current month {}",
            files.len(),
            folder.display(),
            mode,
            self.lexicon.display_form(self.lexicon.current())
        );

        // Target names handed out earlier in this pass
        let mut claimed: HashSet<OsString> = HashSet::new();
        let mut results = Vec::with_capacity(files.len());

        for path in files {
            let result = self.rename_one(folder, path, mode, &mut claimed);
            if let FileOperationResult::Failure { path, reason } = &result {
                tracing::warn!("[FileRenamer] {}: {}", path.display(), reason);
            }
            results.push(result);
        }

        let renamed = results.iter().filter(|r| r.is_success()).count();
        tracing::info!(
            "[FileRenamer] Done: {} succeeded, {} failed",
            renamed,
            results.len() - renamed
        );
        Ok(results)
    }

    fn rename_one(
        &self,
        folder: &Path,
        path: PathBuf,
        mode: RenameMode,
        claimed: &mut HashSet<OsString>,
    ) -> FileOperationResult<Renamed> {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()).map(str::to_owned) else {
            return FileOperationResult::Failure {
                path,
                reason: FailureReason::Io {
                    message: "File name is not valid UTF-8".to_string(),
                },
            };
        };

        let Some((new_name, month)) = self.plan_name(&file_name) else {
            return FileOperationResult::Failure {
                path,
                reason: FailureReason::NoMonthTokenFound,
            };
        };

        if new_name == file_name {
            claimed.insert(OsString::from(&new_name));
            return FileOperationResult::Success {
                path,
                detail: Renamed {
                    from: file_name,
                    to: new_name,
                    month,
                    applied: false,
                },
            };
        }

        let target = folder.join(&new_name);
        let taken = claimed.contains(&OsString::from(&new_name))
            || fs::symlink_metadata(&target).is_ok();
        if taken {
            return FileOperationResult::Failure {
                path,
                reason: FailureReason::NameCollision { target },
            };
        }

        claimed.insert(OsString::from(&new_name));

        if mode == RenameMode::Apply {
            if let Err(e) = fs::rename(&path, &target) {
                claimed.remove(&OsString::from(&new_name));
                return FileOperationResult::Failure {
                    path,
                    reason: FailureReason::Io {
                        message: format!("Failed to rename to {}: {}", new_name, e),
                    },
                };
            }
            tracing::debug!("[FileRenamer] {} -> {}", file_name, new_name);
        }

        FileOperationResult::Success {
            path,
            detail: Renamed {
                from: file_name,
                to: new_name,
                month,
                applied: mode == RenameMode::Apply,
            },
        }
    }
}

/// Regular files directly inside `folder`, sorted by name
fn list_files(folder: &Path) -> Result<Vec<PathBuf>, PathError> {
    let entries = fs::read_dir(folder).map_err(|e| PathError::io(folder, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PathError::io(folder, e))?;
        let file_type = entry.file_type().map_err(|e| PathError::io(&entry.path(), e))?;
        if file_type.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}
