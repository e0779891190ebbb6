//! Artifact collection
//!
//! Gathers files matching the declared glob patterns into the run's
//! archive directory. Patterns resolve independently; a pattern with no
//! matches contributes an empty entry instead of failing the collection.
//! Destination names are stable, so re-running over unchanged inputs
//! yields an equivalent set.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use drydock_core::domain::artifact::{ArtifactEntry, ArtifactSet};

/// Resolves `patterns` relative to `workspace` and copies the matches
/// into `archive_dir`
pub fn collect(workspace: &Path, patterns: &[String], archive_dir: &Path) -> ArtifactSet {
    let entries = patterns
        .iter()
        .map(|pattern| collect_pattern(workspace, pattern, archive_dir))
        .collect();

    ArtifactSet { entries }
}

fn collect_pattern(workspace: &Path, pattern: &str, archive_dir: &Path) -> ArtifactEntry {
    let empty = ArtifactEntry {
        pattern: pattern.to_string(),
        files: Vec::new(),
    };

    let full_pattern = workspace.join(pattern);
    let paths = match glob::glob(&full_pattern.to_string_lossy()) {
        Ok(paths) => paths,
        Err(e) => {
            warn!("Invalid artifact pattern `{}`: {}", pattern, e);
            return empty;
        }
    };

    let mut files = Vec::new();
    for entry in paths {
        let source = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!("Skipping unreadable match for `{}`: {}", pattern, e);
                continue;
            }
        };

        if !source.is_file() {
            continue;
        }

        match archive_file(&source, archive_dir) {
            Ok(dest) => {
                debug!("Archived {} -> {}", source.display(), dest.display());
                files.push(dest);
            }
            Err(e) => warn!("Failed to archive {}: {}", source.display(), e),
        }
    }

    if files.is_empty() {
        debug!("Artifact pattern `{}` matched no files", pattern);
    }

    ArtifactEntry {
        pattern: pattern.to_string(),
        files,
    }
}

fn archive_file(source: &Path, archive_dir: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(archive_dir)?;

    let name = source.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "source has no file name")
    })?;

    let dest = archive_dir.join(name);
    std::fs::copy(source, &dest)?;
    Ok(dest)
}
