//! Which make variables count as build inputs.

use lazy_static::lazy_static;
use regex::Regex;

/// Carries make's command-line flags; inspected for dry runs, never stored.
pub const FLAGS_VARIABLE: &str = "MFLAGS";

/// Make's list of command-line variable assignments.
pub const COMMAND_VARIABLES: &str = "-*-command-variables-*-";

/// Prefix of variables CoreFoundation exports into every process.
pub const RESERVED_PREFIX: &str = "__CF_";

/// Shell bookkeeping that changes from run to run.
pub const SESSION_VARIABLES: [&str; 3] = ["SHLVL", "OLDPWD", "_"];

lazy_static! {
    static ref DRY_RUN_FLAGS: Regex =
        Regex::new(r"^-(?-u:\w)*n").expect("dry-run pattern is valid");
}

/// True if `name` is make or shell noise rather than a build input.
pub fn is_excluded(name: &str) -> bool {
    name.starts_with('.')
        || name.starts_with("MAKE")
        || name == COMMAND_VARIABLES
        || name.starts_with(RESERVED_PREFIX)
        || SESSION_VARIABLES.contains(&name)
        || name.ends_with("DIR")
}

/// True if an `MFLAGS` value asks for a dry run (`-n` among the short flags).
pub fn requests_dry_run(flags: &str) -> bool {
    DRY_RUN_FLAGS.is_match(flags)
}
