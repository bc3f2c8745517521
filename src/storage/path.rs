//! Slash-delimited storage paths.

use std::fmt;
use std::str::FromStr;

use super::StorageError;

/// A parsed `segment/segment/.../leaf` path.
///
/// Always holds at least one segment and never an empty one. The last segment
/// names the leaf (file or target folder); the rest are the folders descended
/// through from the backend root, in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoragePath {
    raw: String,
    segments: Vec<String>,
}

impl StoragePath {
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        if raw.is_empty() {
            return Err(StorageError::InvalidPath(raw.to_string()));
        }

        let segments: Vec<String> = raw.split('/').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(StorageError::InvalidPath(raw.to_string()));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Folder names between the root and the leaf.
    pub fn parents(&self) -> &[String] {
        &self.segments[..self.segments.len() - 1]
    }

    pub fn leaf(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Number of segments, leaf included.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl FromStr for StoragePath {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
