pub mod loader;
pub mod schema;

pub use loader::{load_from_path, load_from_str, parse, read_edits, ConfigError, Origin};
pub use schema::{EditConfig, EditDefinition, Metadata, ValidationError, ValidationIssue};
