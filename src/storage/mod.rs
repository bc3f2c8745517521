//! Path-addressable storage.
//!
//! Resolves slash-delimited paths (`folder1/folder2/file.ext`) against a
//! [`HierarchicalStore`](crate::backend::HierarchicalStore):
//! - `path`: parsing and validation of path strings
//! - `resolver`: folder lookup, recursive creation, file lookup, move, create
//! - `temp_name`: candidate names for temporary root-level files

pub mod path;
pub mod resolver;
pub mod temp_name;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::BackendError;

pub use path::StoragePath;
pub use resolver::PathStorage;
pub use temp_name::TempNameGenerator;

/// Errors that can occur during path operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Folder not found: {0}")]
    NotFound(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid path: {0:?}")]
    InvalidPath(String),

    #[error("Could not generate a temp file name after {0} attempts")]
    ResourceExhausted(usize),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Tunables for [`PathStorage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageOptions {
    /// Prefix of temporary file names
    #[serde(default = "default_temp_prefix")]
    pub temp_prefix: String,

    /// Upper bound on temporary name candidates tried before giving up
    #[serde(default = "default_temp_name_attempts")]
    pub temp_name_attempts: usize,
}

fn default_temp_prefix() -> String {
    "__tmp_".to_string()
}

fn default_temp_name_attempts() -> usize {
    100
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            temp_prefix: default_temp_prefix(),
            temp_name_attempts: default_temp_name_attempts(),
        }
    }
}
