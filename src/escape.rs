//! Escaping values for re-embedding in make variable assignments.

/// Escape `value` so make keeps embedded whitespace and trailing backslashes.
///
/// A run of backslashes directly before a space or tab is doubled and one
/// more backslash is added in front of the whitespace. A run of backslashes
/// at the very end is doubled.
///
/// ```
/// use build_utils::escape::escape_make_value;
///
/// assert_eq!(escape_make_value("a b"), r"a\ b");
/// assert_eq!(escape_make_value(r"dir\"), r"dir\\");
/// ```
pub fn escape_make_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 8);
    let mut pending = 0usize;

    for ch in value.chars() {
        match ch {
            '\\' => pending += 1,
            ' ' | '\t' => {
                push_backslashes(&mut out, pending * 2 + 1);
                pending = 0;
                out.push(ch);
            }
            _ => {
                push_backslashes(&mut out, pending);
                pending = 0;
                out.push(ch);
            }
        }
    }
    push_backslashes(&mut out, pending * 2);
    out
}

fn push_backslashes(out: &mut String, count: usize) {
    out.extend(std::iter::repeat('\\').take(count));
}
