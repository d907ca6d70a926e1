//! Filesystem batch operations: folder duplication and month renaming.

pub mod checksum;
mod duplicate;
mod rename;
pub mod staging;

pub use duplicate::{duplicate, DuplicateOptions, DuplicationError, DuplicationSummary};
pub use rename::{FileRenamer, RenameMode, Renamed};
