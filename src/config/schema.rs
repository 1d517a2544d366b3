use crate::patch::{Edit, Expression};
use serde::Deserialize;
use std::fmt;

/// An edit file: an ordered list of key/expression edits.
///
/// ```toml
/// [meta]
/// description = "release tweaks"
///
/// [[edits]]
/// key = "LSUIElement"
/// expression = "bool('yes')"
///
/// [[edits]]
/// key = "NSSupportsSuddenTermination"
/// ```
#[derive(Debug, Deserialize, Default, Clone)]
pub struct EditConfig {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub edits: Vec<EditDefinition>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EditDefinition {
    pub key: String,
    /// Omitted expressions delete the key.
    #[serde(default)]
    pub expression: Option<String>,
}

impl EditConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.edits.is_empty() {
            issues.push(ValidationIssue::EmptyEditList);
        }

        for (index, edit) in self.edits.iter().enumerate() {
            if edit.key.is_empty() {
                issues.push(ValidationIssue::MissingKey { index });
            }
            if let Some(expression) = &edit.expression {
                if let Err(err) = Expression::parse(expression) {
                    issues.push(ValidationIssue::InvalidExpression {
                        key: edit.key.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Compile the definitions into edits, in file order.
    pub fn to_edits(&self) -> Result<Vec<Edit>, ValidationError> {
        self.validate()?;
        self.edits
            .iter()
            .map(|def| match &def.expression {
                Some(expression) => Edit::parse(def.key.as_str(), expression).map_err(|err| {
                    ValidationError {
                        issues: vec![ValidationIssue::InvalidExpression {
                            key: def.key.clone(),
                            message: err.to_string(),
                        }],
                    }
                }),
                None => Ok(Edit::delete(def.key.as_str())),
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    EmptyEditList,
    MissingKey { index: usize },
    InvalidExpression { key: String, message: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyEditList => write!(f, "edit file contains no edits"),
            ValidationIssue::MissingKey { index } => {
                write!(f, "edit #{} has an empty key", index + 1)
            }
            ValidationIssue::InvalidExpression { key, message } => {
                write!(f, "edit for '{key}' has an invalid expression: {message}")
            }
        }
    }
}
