//! Reading edit files.

use crate::config::schema::{EditConfig, ValidationError};
use crate::patch::{Edit, PatchError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Where edit-file text came from, for error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Inline,
    File(PathBuf),
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Inline => f.write_str("edit file"),
            Origin::File(path) => write!(f, "edit file {}", path.display()),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read edit file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{origin} is not valid TOML: {source}")]
    Toml {
        origin: Origin,
        source: toml_edit::de::Error,
    },

    #[error("{origin} is invalid: {source}")]
    Validation {
        origin: Origin,
        source: ValidationError,
    },
}

/// Parse and validate edit-file text. Errors name `origin`.
pub fn parse(input: &str, origin: Origin) -> Result<EditConfig, ConfigError> {
    let config: EditConfig = match toml_edit::de::from_str(input) {
        Ok(config) => config,
        Err(source) => return Err(ConfigError::Toml { origin, source }),
    };
    match config.validate() {
        Ok(()) => Ok(config),
        Err(source) => Err(ConfigError::Validation { origin, source }),
    }
}

pub fn load_from_str(input: &str) -> Result<EditConfig, ConfigError> {
    parse(input, Origin::Inline)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<EditConfig, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text, Origin::File(path.to_path_buf()))
}

/// Read the edit file at `path` and compile its edits in file order.
///
/// Every expression is parsed here, so a bad edit file fails before any
/// document is touched.
pub fn read_edits(path: impl AsRef<Path>) -> Result<Vec<Edit>, PatchError> {
    let path = path.as_ref();
    let config = load_from_path(path)?;
    let edits = config
        .to_edits()
        .map_err(|source| ConfigError::Validation {
            origin: Origin::File(path.to_path_buf()),
            source,
        })?;
    debug!(
        file = %path.display(),
        count = edits.len(),
        description = config.meta.description.as_deref().unwrap_or(""),
        "loaded edit file"
    );
    Ok(edits)
}
