use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::models::error::RecorderError;

/// A validated, writable regular file that a capture engine can encode into.
///
/// The core never writes to the file itself; it only guarantees the path is
/// usable before an engine is started against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    path: PathBuf,
}

impl OutputTarget {
    /// Accept `path` only if it already exists as a writable regular file.
    pub fn existing(path: impl Into<PathBuf>) -> Result<Self, RecorderError> {
        let path = path.into();
        let metadata = fs::metadata(&path).map_err(|e| invalid(&path, &e.to_string()))?;
        if !metadata.is_file() {
            return Err(invalid(&path, "not a regular file"));
        }
        ensure_writable(&path)?;
        Ok(Self { path })
    }

    /// Accept `path`, creating missing parent directories and an empty file
    /// when needed. Existing content is left untouched.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, RecorderError> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|e| invalid(&path, &format!("failed to create directory: {}", e)))?;
                log::debug!("Created output directory {}", parent.display());
            }
        }

        if !path.exists() {
            OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(false)
                .open(&path)
                .map_err(|e| invalid(&path, &format!("failed to create file: {}", e)))?;
            log::debug!("Created output file {}", path.display());
        }

        Self::existing(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn ensure_writable(path: &Path) -> Result<(), RecorderError> {
    OpenOptions::new()
        .write(true)
        .open(path)
        .map(|_| ())
        .map_err(|e| invalid(path, &format!("not writable: {}", e)))
}

fn invalid(path: &Path, reason: &str) -> RecorderError {
    RecorderError::InvalidOutputTarget(format!("{}: {}", path.display(), reason))
}
