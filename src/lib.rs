//! Build Utils: small helpers for makefile-driven macOS builds
//!
//! Two independent, one-shot operations:
//!
//! - **Property list patching**: decode a property list, run an ordered list
//!   of key edits against its top-level dictionary and re-encode it. Each
//!   edit's transform sees the key's current value (or `None`) and answers
//!   with an [`Outcome`]: keep a new value or delete the key.
//! - **Build variable change detection**: filter the variables make was
//!   invoked with into a [`Snapshot`], compare it with the one saved by the
//!   previous build and, on change, save it and touch a file so dependent
//!   rules re-run.
//!
//! # Encoding boundary
//!
//! Decoded documents hold UTF-8 `String` text. Transforms receive the same
//! tree with native `OsString` text, so values can flow to and from paths,
//! arguments and the environment without lossy conversions.
//!
//! # Example
//!
//! ```no_run
//! use build_utils::{patch_file, Edit, Format};
//!
//! let edits = Edit::from_pairs([
//!     "LSUIElement", "bool('yes')",
//!     "LimitLoadToSessionType", "list('Aqua, LoginWindow')",
//!     "NSSupportsSuddenTermination",
//! ])?;
//! let bytes = patch_file("Info.plist", &edits, Format::Xml)?;
//! # Ok::<(), build_utils::PatchError>(())
//! ```

pub mod argv;
pub mod config;
pub mod document;
pub mod escape;
pub mod list;
pub mod patch;
pub mod vars;

// Re-exports
pub use argv::{build_argv, program_arguments, ArgvError};
pub use config::{load_from_path, load_from_str, read_edits, ConfigError, EditConfig};
pub use document::{decode, encode, CodecError, Document, Format, NativeNode, Node};
pub use escape::escape_make_value;
pub use list::{normalize, Normalized};
pub use patch::{
    apply_edits, patch_file, transform_fn, Edit, EvalError, ExprError, Expression, Outcome,
    PatchError, Transform,
};
pub use vars::{
    check_and_save, compute_snapshot, decide, BuildState, CurrentVariables, FileBuildState,
    Snapshot, StateError,
};
