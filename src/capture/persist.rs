//! Snapshot persistence.
//!
//! # Responsibilities
//! - Serialize the full capture sequence as indented JSON
//! - Overwrite the snapshot file after every capture
//!
//! # Design Decisions
//! - Whole-file rewrite, O(n) per capture, no append log
//! - Direct overwrite unless `atomic` is set, then temp file + rename
//! - Non-ASCII text is written verbatim (serde_json never escapes it)

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::capture::record::CapturedRequest;

/// Error type for snapshot writes.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to write snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Sink for the full capture sequence.
pub trait Persister: Send {
    /// Replace whatever was stored before with `entries`.
    fn flush(&self, entries: &[CapturedRequest]) -> Result<(), PersistError>;

    /// Location of the snapshot, for operator messages.
    fn location(&self) -> &Path;
}

/// JSON array snapshot on the local filesystem.
#[derive(Debug, Clone)]
pub struct JsonSnapshot {
    path: PathBuf,
    atomic: bool,
}

impl JsonSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            atomic: false,
        }
    }

    /// Write through a sibling temp file and rename it over the snapshot.
    pub fn atomic(mut self, atomic: bool) -> Self {
        self.atomic = atomic;
        self
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_to(&self, target: &Path, entries: &[CapturedRequest]) -> Result<(), PersistError> {
        let io_err = |source| PersistError::Io {
            path: target.to_path_buf(),
            source,
        };

        let file = File::create(target).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, entries)?;
        writer.flush().map_err(io_err)?;
        Ok(())
    }
}

impl Persister for JsonSnapshot {
    fn flush(&self, entries: &[CapturedRequest]) -> Result<(), PersistError> {
        if !self.atomic {
            return self.write_to(&self.path, entries);
        }

        let temp = self.temp_path();
        self.write_to(&temp, entries)?;
        fs::rename(&temp, &self.path).map_err(|source| PersistError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.path
    }
}
