//! Hierarchical storage backend abstraction.
//!
//! A backend exposes a folder tree whose only lookup primitive is listing the
//! children of a folder by exact name. Two implementations ship with the crate:
//! - `memory`: in-process tree, used by tests
//! - `local`: a directory on the local filesystem

pub mod local;
pub mod memory;

use std::fmt;

use thiserror::Error;

pub use local::LocalStore;
pub use memory::{FileId, FolderId, MemoryStore, Operation, StoreStats};

/// Errors raised by a backend.
///
/// These pass through the storage layer unmodified.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Stale handle: {0}")]
    StaleHandle(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Backend capability consumed by [`crate::storage::PathStorage`].
///
/// Folder and file handles are opaque references owned by the backend. Moving
/// or renaming a file consumes the old handle and returns one for the same
/// underlying file.
///
/// The by-name listings are single-pass iterators. When a backend permits
/// several children with the same name, their enumeration order is the
/// backend's to define.
pub trait HierarchicalStore {
    type Folder: Clone + fmt::Debug;
    type File: Clone + fmt::Debug;
    type Folders: Iterator<Item = Self::Folder>;
    type Files: Iterator<Item = Self::File>;

    /// The top of the tree.
    fn root_folder(&self) -> Result<Self::Folder, BackendError>;

    /// Child folders of `parent` named exactly `name`.
    fn folders_by_name(
        &self,
        parent: &Self::Folder,
        name: &str,
    ) -> Result<Self::Folders, BackendError>;

    /// Files directly inside `parent` named exactly `name`.
    fn files_by_name(&self, parent: &Self::Folder, name: &str)
        -> Result<Self::Files, BackendError>;

    fn create_folder(&self, parent: &Self::Folder, name: &str)
        -> Result<Self::Folder, BackendError>;

    fn create_file(
        &self,
        parent: &Self::Folder,
        name: &str,
        content: &[u8],
    ) -> Result<Self::File, BackendError>;

    /// Relocate `file` into `folder`, keeping its name.
    fn move_to(&self, file: Self::File, folder: &Self::Folder) -> Result<Self::File, BackendError>;

    /// Rename `file` in place.
    fn set_name(&self, file: Self::File, name: &str) -> Result<Self::File, BackendError>;

    fn folder_name(&self, folder: &Self::Folder) -> Result<String, BackendError>;

    fn file_name(&self, file: &Self::File) -> Result<String, BackendError>;

    fn read_file(&self, file: &Self::File) -> Result<Vec<u8>, BackendError>;

    /// Content length in bytes, without reading the content.
    fn file_size(&self, file: &Self::File) -> Result<u64, BackendError>;
}

/// Reject names that cannot denote a single child entry.
pub(crate) fn validate_name(name: &str) -> Result<(), BackendError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(BackendError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name_accepts_plain_names() {
        assert!(validate_name("report.pdf").is_ok());
        assert!(validate_name("__tmp_1700000000000_42").is_ok());
        assert!(validate_name(".hidden").is_ok());
    }

    #[test]
    fn test_validate_name_rejects_separators_and_dots() {
        for bad in ["", ".", "..", "a/b", "a\\b"] {
            assert!(
                matches!(validate_name(bad), Err(BackendError::InvalidName(_))),
                "expected {:?} to be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::AlreadyExists("docs".to_string());
        assert_eq!(err.to_string(), "Already exists: docs");
    }
}
