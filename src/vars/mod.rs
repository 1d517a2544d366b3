//! Build variable change detection.
//!
//! Make passes the variables it was invoked with; they are filtered into a
//! [`Snapshot`] and compared with the one saved by the previous build. When
//! they differ the new snapshot is saved and the touch target's mtime is
//! bumped so dependent rules re-run. A dry run (`make -n`) reports the change
//! but writes nothing.
//!
//! Build state failures are never fatal: an unreadable snapshot counts as
//! empty, and failed writes are logged.

pub mod filter;
pub mod snapshot;
pub mod state;

pub use snapshot::{compute_snapshot, process_environment, CurrentVariables, Snapshot};
pub use state::{BuildState, FileBuildState, StateError};

use std::ffi::OsString;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Compare `current` with the saved snapshot and record it if it changed.
///
/// Returns whether the variables changed. Unless `noop` is set, a change
/// saves `current` and touches the target.
pub fn decide<S: BuildState>(current: &Snapshot, noop: bool, state: &mut S) -> bool {
    let prior = state.load().unwrap_or_else(|err| {
        debug!(error = %err, "no usable prior snapshot, treating as empty");
        Snapshot::default()
    });

    if *current == prior {
        debug!(variables = current.len(), "build variables unchanged");
        return false;
    }

    info!(changed = ?current.changed_names(&prior), noop, "build variables changed");
    if noop {
        return true;
    }

    if let Err(err) = state.save(current) {
        warn!(error = %err, "failed to save build variables");
    }
    if let Err(err) = state.touch() {
        warn!(error = %err, "failed to touch build target");
    }
    true
}

/// Run the differ against the process environment and files on disk.
pub fn check_and_save<I, S>(
    snapshot_path: impl Into<PathBuf>,
    touch_target: impl Into<PathBuf>,
    raw: I,
) -> bool
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let current = compute_snapshot(raw, process_environment);
    let mut state = FileBuildState::new(snapshot_path, touch_target);
    decide(&current.snapshot, current.noop, &mut state)
}
