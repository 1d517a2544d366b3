//! Program argument vectors that survive a change of home directory.
//!
//! Executables that live under the user's home directory are launched
//! through `/bin/sh` so `$HOME` is expanded when the command runs, not when
//! it was built. Everything else is passed through as an absolute path.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Shell used to expand `$HOME` at execution time.
pub const SHELL: &str = "/bin/sh";

#[derive(Error, Debug)]
pub enum ArgvError {
    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUnicodePath(PathBuf),

    #[error("could not determine the home directory")]
    NoHomeDirectory,

    #[error("could not resolve relative path against the current directory: {0}")]
    CurrentDir(#[from] std::io::Error),
}

/// Build the argument vector for `executable` using the process home
/// directory.
pub fn program_arguments(executable: impl AsRef<Path>) -> Result<Vec<String>, ArgvError> {
    let home = home::home_dir().ok_or(ArgvError::NoHomeDirectory)?;
    build_argv(executable, home)
}

/// Build the argument vector for `executable` relative to `home`.
///
/// ```
/// use build_utils::argv::build_argv;
///
/// assert_eq!(
///     build_argv("/Users/me/bin/tool", "/Users/me").unwrap(),
///     ["/bin/sh", "-c", "exec \"$HOME/bin/tool\""]
/// );
/// assert_eq!(
///     build_argv("/usr/bin/tool", "/Users/me").unwrap(),
///     ["/usr/bin/tool"]
/// );
/// ```
pub fn build_argv(
    executable: impl AsRef<Path>,
    home: impl AsRef<Path>,
) -> Result<Vec<String>, ArgvError> {
    let executable = utf8(resolve(executable.as_ref())?)?;

    let home = home.as_ref();
    if home.as_os_str().is_empty() {
        return Ok(vec![executable]);
    }
    let home = utf8(resolve(home)?)?;

    let suffix = match executable.strip_prefix(home.as_str()) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => return Ok(vec![executable]),
    };

    Ok(vec![
        SHELL.to_string(),
        "-c".to_string(),
        format!("exec \"$HOME{}\"", escape_for_double_quotes(suffix)),
    ])
}

/// Backslash-escape the characters that stay special inside `"..."`.
fn escape_for_double_quotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '"' | '`' | '$') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Make `path` absolute and drop `.` and `..` components lexically.
/// Symlinks are left alone.
fn resolve(path: &Path) -> Result<PathBuf, ArgvError> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    Ok(out)
}

fn utf8(path: PathBuf) -> Result<String, ArgvError> {
    path.into_os_string()
        .into_string()
        .map_err(|raw| ArgvError::NonUnicodePath(PathBuf::from(raw)))
}
