//! Comma-separated list normalization.

/// A non-empty normalized list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// Exactly one token; callers store it as a scalar.
    One(String),
    /// Two or more tokens in input order.
    Many(Vec<String>),
}

/// Split `input` on `,`, trim ASCII whitespace and drop empty tokens.
///
/// Returns `None` when nothing is left.
///
/// ```
/// use build_utils::list::{normalize, Normalized};
///
/// assert_eq!(normalize(""), None);
/// assert_eq!(normalize("a"), Some(Normalized::One("a".to_string())));
/// assert_eq!(
///     normalize("a,,b ,"),
///     Some(Normalized::Many(vec!["a".to_string(), "b".to_string()]))
/// );
/// ```
pub fn normalize(input: &str) -> Option<Normalized> {
    let mut tokens: Vec<String> = input
        .split(',')
        .map(|token| token.trim_matches(|c: char| c.is_ascii_whitespace()))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect();

    match tokens.len() {
        0 => None,
        1 => tokens.pop().map(Normalized::One),
        _ => Some(Normalized::Many(tokens)),
    }
}
