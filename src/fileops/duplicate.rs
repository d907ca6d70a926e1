//! Folder Duplicator
//!
//! Recursive copy of a directory tree. The copy is built in a hidden staging
//! directory next to the destination and renamed into place only after every
//! entry (and, optionally, every checksum) has been written. Any failure
//! removes the staging directory, so the destination either appears complete
//! or not at all.

use super::checksum::same_contents;
use super::staging::StagedPath;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Clone, Error, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DuplicationError {
    #[error("Source folder not found: {}", .path.display())]
    SourceNotFound { path: PathBuf },

    #[error("Source is not a folder: {}", .path.display())]
    SourceNotDirectory { path: PathBuf },

    #[error("Destination already exists: {}", .path.display())]
    DestinationExists { path: PathBuf },

    #[error(
        "Destination {} is inside source folder {}",
        .destination.display(),
        .source_dir.display()
    )]
    DestinationInsideSource {
        source_dir: PathBuf,
        destination: PathBuf,
    },

    #[error("Copied file does not match its source: {}", .path.display())]
    VerificationFailed { path: PathBuf },

    #[error("Failed to write copy: {message}")]
    WriteError { message: String },
}

impl DuplicationError {
    fn write(context: &str, path: &Path, err: impl std::fmt::Display) -> Self {
        DuplicationError::WriteError {
            message: format!("{} {}: {}", context, path.display(), err),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DuplicateOptions {
    /// Compare SHA-256 of every copied file before committing
    pub verify: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicationSummary {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub files_copied: usize,
    pub directories_copied: usize,
    pub bytes_copied: u64,
    pub verified: bool,
}

/// Copy `source` to a new folder at `destination`
pub fn duplicate(
    source: &Path,
    destination: &Path,
    options: DuplicateOptions,
) -> Result<DuplicationSummary, DuplicationError> {
    let meta = fs::metadata(source).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => DuplicationError::SourceNotFound {
            path: source.to_path_buf(),
        },
        _ => DuplicationError::write("Failed to read", source, e),
    })?;
    if !meta.is_dir() {
        return Err(DuplicationError::SourceNotDirectory {
            path: source.to_path_buf(),
        });
    }
    if fs::symlink_metadata(destination).is_ok() {
        return Err(DuplicationError::DestinationExists {
            path: destination.to_path_buf(),
        });
    }
    check_not_nested(source, destination)?;

    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| DuplicationError::write("Failed to create", parent, e))?;
    }

    tracing::info!(
        "[FolderDuplicator] Copying {} -> {}",
        source.display(),
        destination.display()
    );

    let staged = StagedPath::beside(destination);
    fs::create_dir(staged.path())
        .map_err(|e| DuplicationError::write("Failed to create", staged.path(), e))?;

    let mut summary = DuplicationSummary {
        source: source.to_path_buf(),
        destination: destination.to_path_buf(),
        files_copied: 0,
        directories_copied: 0,
        bytes_copied: 0,
        verified: false,
    };
    copy_tree(source, staged.path(), &mut summary)?;

    if options.verify {
        verify_tree(source, staged.path())?;
        summary.verified = true;
    }

    // Someone may have created the destination while we were copying
    if fs::symlink_metadata(destination).is_ok() {
        return Err(DuplicationError::DestinationExists {
            path: destination.to_path_buf(),
        });
    }
    staged
        .commit(destination)
        .map_err(|e| DuplicationError::write("Failed to move copy into", destination, e))?;

    tracing::info!(
        "[FolderDuplicator] Copied {} files, {} folders ({} bytes){}",
        summary.files_copied,
        summary.directories_copied,
        summary.bytes_copied,
        if summary.verified { ", verified" } else { "" }
    );
    Ok(summary)
}

fn copy_tree(
    source: &Path,
    staging: &Path,
    summary: &mut DuplicationSummary,
) -> Result<(), DuplicationError> {
    for entry in WalkDir::new(source).min_depth(1).follow_links(false) {
        let entry = entry.map_err(|e| DuplicationError::WriteError {
            message: format!("Failed to walk {}: {}", source.display(), e),
        })?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| DuplicationError::write("Unexpected entry", entry.path(), e))?;
        let target = staging.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir(&target)
                .map_err(|e| DuplicationError::write("Failed to create", &target, e))?;
            summary.directories_copied += 1;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
            summary.files_copied += 1;
        } else {
            let bytes = fs::copy(entry.path(), &target)
                .map_err(|e| DuplicationError::write("Failed to copy", entry.path(), e))?;
            summary.files_copied += 1;
            summary.bytes_copied += bytes;
        }
        tracing::debug!("[FolderDuplicator] {}", relative.display());
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> Result<(), DuplicationError> {
    let points_to =
        fs::read_link(link).map_err(|e| DuplicationError::write("Failed to read link", link, e))?;
    std::os::unix::fs::symlink(&points_to, target)
        .map_err(|e| DuplicationError::write("Failed to create link", target, e))
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, target: &Path) -> Result<(), DuplicationError> {
    fs::copy(link, target)
        .map(|_| ())
        .map_err(|e| DuplicationError::write("Failed to copy", link, e))
}

fn verify_tree(source: &Path, staging: &Path) -> Result<(), DuplicationError> {
    for entry in WalkDir::new(source).min_depth(1).follow_links(false) {
        let entry = entry.map_err(|e| DuplicationError::WriteError {
            message: format!("Failed to walk {}: {}", source.display(), e),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| DuplicationError::write("Unexpected entry", entry.path(), e))?;

        let matches = same_contents(entry.path(), &staging.join(relative))
            .map_err(|e| DuplicationError::write("Failed to verify", entry.path(), e))?;
        if !matches {
            return Err(DuplicationError::VerificationFailed {
                path: relative.to_path_buf(),
            });
        }
    }
    Ok(())
}

/// Reject copying a folder into itself or one of its descendants
fn check_not_nested(source: &Path, destination: &Path) -> Result<(), DuplicationError> {
    let source_real = fs::canonicalize(source)
        .map_err(|e| DuplicationError::write("Failed to resolve", source, e))?;
    let destination_real = resolve_existing_prefix(destination)
        .map_err(|e| DuplicationError::write("Failed to resolve", destination, e))?;

    if destination_real.starts_with(&source_real) {
        return Err(DuplicationError::DestinationInsideSource {
            source_dir: source.to_path_buf(),
            destination: destination.to_path_buf(),
        });
    }
    Ok(())
}

/// Canonicalize the deepest existing ancestor and re-append the rest
fn resolve_existing_prefix(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut missing = Vec::new();
    let mut cursor = absolute.as_path();
    loop {
        if let Ok(real) = fs::canonicalize(cursor) {
            let mut resolved = real;
            for part in missing.iter().rev() {
                resolved.push(part);
            }
            return Ok(resolved);
        }
        match (cursor.parent(), cursor.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                cursor = parent;
            }
            _ => return Ok(absolute),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_tree(root: &Path) {
        fs::create_dir_all(root.join("docs/2024")).unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::write(root.join("readme.txt"), "hola").unwrap();
        fs::write(root.join("docs/acta.pdf"), vec![1u8; 4096]).unwrap();
        fs::write(root.join("docs/2024/informe.docx"), vec![2u8; 100]).unwrap();
    }

    fn staging_leftovers(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .unwrap()
                    .file_name()
                    .to_string_lossy()
                    .contains(".staging-")
            })
            .count()
    }

    #[test]
    fn test_duplicate_copies_tree() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("marzo");
        let destination = dir.path().join("abril");
        sample_tree(&source);

        let summary = duplicate(&source, &destination, DuplicateOptions::default()).unwrap();

        assert_eq!(summary.files_copied, 3);
        assert_eq!(summary.directories_copied, 3);
        assert_eq!(summary.bytes_copied, 4 + 4096 + 100);
        assert!(!summary.verified);
        assert_eq!(fs::read(destination.join("docs/acta.pdf")).unwrap(), vec![1u8; 4096]);
        assert_eq!(fs::read_to_string(destination.join("readme.txt")).unwrap(), "hola");
        assert!(destination.join("empty").is_dir());
        assert_eq!(staging_leftovers(dir.path()), 0);
    }

    #[test]
    fn test_duplicate_with_verification() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("src");
        sample_tree(&source);

        let options = DuplicateOptions { verify: true };
        let summary = duplicate(&source, &dir.path().join("out/copy"), options).unwrap();
        assert!(summary.verified);
        assert!(dir.path().join("out/copy/docs/2024/informe.docx").is_file());
    }

    #[test]
    fn test_existing_destination_untouched() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("src");
        let destination = dir.path().join("dst");
        sample_tree(&source);
        fs::create_dir(&destination).unwrap();
        fs::write(destination.join("keep.txt"), "mine").unwrap();

        let err = duplicate(&source, &destination, DuplicateOptions::default()).unwrap_err();

        assert!(matches!(err, DuplicationError::DestinationExists { .. }));
        assert_eq!(fs::read_dir(&destination).unwrap().count(), 1);
        assert_eq!(fs::read_to_string(destination.join("keep.txt")).unwrap(), "mine");
    }

    #[test]
    fn test_source_errors() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();

        let missing = duplicate(&dir.path().join("nope"), &dir.path().join("a"), Default::default());
        assert!(matches!(missing, Err(DuplicationError::SourceNotFound { .. })));

        let not_dir = duplicate(&file, &dir.path().join("b"), Default::default());
        assert!(matches!(not_dir, Err(DuplicationError::SourceNotDirectory { .. })));
    }

    #[test]
    fn test_destination_inside_source_rejected() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("src");
        sample_tree(&source);

        let err = duplicate(&source, &source.join("docs/copy"), Default::default()).unwrap_err();
        assert!(matches!(err, DuplicationError::DestinationInsideSource { .. }));
        assert!(!source.join("docs/copy").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_copy_leaves_no_destination() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("src");
        let destination = dir.path().join("dst");
        sample_tree(&source);
        // Sockets cannot be opened for reading, so copying one fails
        let _listener = std::os::unix::net::UnixListener::bind(source.join("sock")).unwrap();

        let err = duplicate(&source, &destination, Default::default()).unwrap_err();

        assert!(matches!(err, DuplicationError::WriteError { .. }));
        assert!(!destination.exists());
        assert_eq!(staging_leftovers(dir.path()), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_recreated() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("src");
        sample_tree(&source);
        std::os::unix::fs::symlink("readme.txt", source.join("link.txt")).unwrap();

        let destination = dir.path().join("dst");
        duplicate(&source, &destination, Default::default()).unwrap();

        let link = destination.join("link.txt");
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_link(&link).unwrap(), PathBuf::from("readme.txt"));
    }
}
