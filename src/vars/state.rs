//! Where build state lives between invocations.

use crate::vars::snapshot::Snapshot;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("build state I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed snapshot in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Persistence and staleness signalling for the variable differ.
pub trait BuildState {
    /// Snapshot saved by the previous build.
    fn load(&self) -> Result<Snapshot, StateError>;

    /// Replace the saved snapshot.
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), StateError>;

    /// Mark dependent build steps as out of date.
    fn touch(&mut self) -> Result<(), StateError>;
}

/// [`BuildState`] backed by a JSON snapshot file and a touch target whose
/// modification time make compares against.
#[derive(Debug, Clone)]
pub struct FileBuildState {
    snapshot_path: PathBuf,
    touch_target: PathBuf,
}

impl FileBuildState {
    pub fn new(snapshot_path: impl Into<PathBuf>, touch_target: impl Into<PathBuf>) -> Self {
        Self {
            snapshot_path: snapshot_path.into(),
            touch_target: touch_target.into(),
        }
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn touch_target(&self) -> &Path {
        &self.touch_target
    }
}

impl BuildState for FileBuildState {
    fn load(&self) -> Result<Snapshot, StateError> {
        let path = &self.snapshot_path;
        let bytes = fs::read(path).map_err(|source| StateError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| StateError::Json {
            path: path.clone(),
            source,
        })
    }

    /// Replace the snapshot file atomically: the JSON is written to a hidden
    /// sibling, synced, then renamed over the old snapshot.
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), StateError> {
        let path = &self.snapshot_path;
        let io = |source: std::io::Error| StateError::Io {
            path: path.clone(),
            source,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged = tempfile::Builder::new()
            .prefix(".build-vars")
            .suffix(".json")
            .tempfile_in(dir)
            .map_err(io)?;

        let mut writer = BufWriter::new(&mut staged);
        serde_json::to_writer_pretty(&mut writer, snapshot).map_err(|source| StateError::Json {
            path: path.clone(),
            source,
        })?;
        writer.flush().map_err(io)?;
        drop(writer);

        staged.as_file().sync_all().map_err(io)?;
        staged.persist(path).map_err(|err| io(err.error))?;
        Ok(())
    }

    fn touch(&mut self) -> Result<(), StateError> {
        let now = filetime::FileTime::now();
        filetime::set_file_times(&self.touch_target, now, now).map_err(|source| StateError::Io {
            path: self.touch_target.clone(),
            source,
        })
    }
}
