pub mod edit;
pub mod engine;
pub mod errors;
pub mod expr;

pub use edit::{transform_fn, Edit, Outcome, Transform};
pub use engine::{apply_edits, patch_file, read_document};
pub use errors::{EvalError, ExprError, PatchError};
pub use expr::Expression;
