use crate::argv::ArgvError;
use crate::config::ConfigError;
use crate::document::CodecError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a patch operation.
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("invalid expression for key '{key}': {source}")]
    Expression { key: String, source: ExprError },

    #[error("evaluation failed for key '{key}': {source}")]
    Evaluation { key: String, source: EvalError },

    #[error("cannot edit keys of a document whose root is {kind}, expected dictionary")]
    RootNotDictionary { kind: &'static str },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Problems found while parsing an expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error("syntax error at offset {position} in {input:?}: {message}")]
    Parse {
        input: String,
        position: usize,
        message: String,
    },

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("{function}() takes {expected} argument(s), got {found}")]
    Arity {
        function: &'static str,
        expected: usize,
        found: usize,
    },
}

/// Failures raised while a transform runs.
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("{function}() expected {expected}, got {found}")]
    TypeMismatch {
        function: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid truth value {0:?}")]
    InvalidBoolean(String),

    #[error("null cannot be stored inside a {0}")]
    NullInContainer(&'static str),

    #[error("invalid integer {0:?}")]
    InvalidInteger(String),

    #[error("{function}() received text that is not valid UTF-8")]
    NonUnicodeText { function: &'static str },

    #[error(transparent)]
    Argv(#[from] ArgvError),

    #[error("{0}")]
    Custom(String),
}
