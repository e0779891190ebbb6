//! Artifact archive domain types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One declared pattern and the archived files it resolved to
///
/// A pattern that matched nothing is a valid, empty entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactEntry {
    pub pattern: String,
    pub files: Vec<PathBuf>,
}

/// Set of resolved artifact patterns for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSet {
    pub entries: Vec<ArtifactEntry>,
}

impl ArtifactSet {
    pub fn total_files(&self) -> usize {
        self.entries.iter().map(|entry| entry.files.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_files() == 0
    }

    /// Archived file paths across all patterns, for attachment lists.
    pub fn files(&self) -> impl Iterator<Item = &PathBuf> {
        self.entries.iter().flat_map(|entry| entry.files.iter())
    }
}
