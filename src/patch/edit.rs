use crate::document::NativeNode;
use crate::patch::errors::{EvalError, PatchError};
use crate::patch::expr::Expression;

/// What a transform wants done with its key.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "Outcome decides whether the key is stored or removed"]
pub enum Outcome {
    /// Store this value, creating or overwriting the key.
    Keep(NativeNode),
    /// Remove the key. Removing an absent key is a no-op.
    Delete,
}

impl From<Option<NativeNode>> for Outcome {
    fn from(value: Option<NativeNode>) -> Self {
        match value {
            Some(node) => Outcome::Keep(node),
            None => Outcome::Delete,
        }
    }
}

/// A per-key transformation: receives the current value (or `None` if the
/// key is absent) and decides the replacement.
pub trait Transform {
    fn apply(&self, current: Option<NativeNode>) -> Result<Outcome, EvalError>;
}

impl<F> Transform for F
where
    F: Fn(Option<NativeNode>) -> Result<Outcome, EvalError>,
{
    fn apply(&self, current: Option<NativeNode>) -> Result<Outcome, EvalError> {
        self(current)
    }
}

/// Pin a closure to the [`Transform`] signature so its argument and error
/// types are inferred.
pub fn transform_fn<F>(f: F) -> F
where
    F: Fn(Option<NativeNode>) -> Result<Outcome, EvalError>,
{
    f
}

/// One top-level key and the transform to run against it.
#[derive(Debug, Clone, PartialEq)]
pub struct Edit<X = Expression> {
    pub key: String,
    pub transform: X,
}

impl<X: Transform> Edit<X> {
    pub fn new(key: impl Into<String>, transform: X) -> Self {
        Self {
            key: key.into(),
            transform,
        }
    }
}

impl Edit<Expression> {
    /// Parse `expression` for `key`.
    pub fn parse(key: impl Into<String>, expression: &str) -> Result<Self, PatchError> {
        let key = key.into();
        match Expression::parse(expression) {
            Ok(transform) => Ok(Self { key, transform }),
            Err(source) => Err(PatchError::Expression { key, source }),
        }
    }

    /// An edit that removes `key`.
    pub fn delete(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            transform: Expression::delete(),
        }
    }

    /// Build edits from a flat `[key, expression, key, expression, ...]`
    /// list. A trailing key without an expression is deleted.
    pub fn from_pairs<I, S>(raw: I) -> Result<Vec<Self>, PatchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut edits = Vec::new();
        let mut raw = raw.into_iter();
        while let Some(key) = raw.next() {
            let edit = match raw.next() {
                Some(expression) => Self::parse(key.as_ref(), expression.as_ref())?,
                None => Self::delete(key.as_ref()),
            };
            edits.push(edit);
        }
        Ok(edits)
    }
}
