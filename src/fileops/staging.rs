//! Stage-then-commit for anything that replaces or creates a path.
//!
//! Work is written to a hidden sibling (`.{name}.staging-{uuid}`) and renamed
//! onto the target only once it is complete. Dropping an uncommitted stage
//! removes it, so a failed write never leaves partial output behind.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug)]
pub struct StagedPath {
    path: PathBuf,
    committed: bool,
}

impl StagedPath {
    /// Reserve a staging location in the same directory as `target`
    pub fn beside(target: &Path) -> Self {
        let parent = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());

        Self {
            path: parent.join(format!(".{}.staging-{}", name, Uuid::new_v4())),
            committed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomically move the staged entry onto `target`
    pub fn commit(mut self, target: &Path) -> io::Result<()> {
        fs::rename(&self.path, target)?;
        self.committed = true;
        tracing::debug!("[Staging] Committed {} -> {}", self.path.display(), target.display());
        Ok(())
    }
}

impl Drop for StagedPath {
    fn drop(&mut self) {
        if self.committed {
            return;
        }

        let result = match fs::symlink_metadata(&self.path) {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(&self.path),
            Ok(_) => fs::remove_file(&self.path),
            Err(_) => return,
        };

        match result {
            Ok(()) => tracing::debug!("[Staging] Rolled back {}", self.path.display()),
            Err(e) => tracing::warn!(
                "[Staging] Failed to remove staging path {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_staging_name_is_hidden_sibling() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("report.docx");
        let staged = StagedPath::beside(&target);

        assert_eq!(staged.path().parent(), Some(dir.path()));
        let name = staged.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(".report.docx.staging-"));
    }

    #[test]
    fn test_commit_replaces_target() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("out.txt");
        fs::write(&target, "old").unwrap();

        let staged = StagedPath::beside(&target);
        fs::write(staged.path(), "new").unwrap();
        staged.commit(&target).unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_drop_rolls_back_directory() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("copy");
        let staged_path = {
            let staged = StagedPath::beside(&target);
            fs::create_dir_all(staged.path().join("nested")).unwrap();
            fs::write(staged.path().join("nested/file.txt"), "x").unwrap();
            staged.path().to_path_buf()
        };

        assert!(!staged_path.exists());
        assert!(!target.exists());
    }
}
