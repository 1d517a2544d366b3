use anyhow::{Context, Result};
use build_utils::config::read_edits;
use build_utils::document::{encode, Format};
use build_utils::patch::{apply_edits, read_document, Edit};
use build_utils::{check_and_save, escape_make_value};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use similar::{DiffTag, TextDiff};
use std::ffi::{OsStr, OsString};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, warn, Level};

#[derive(Parser)]
#[command(name = "build-utils")]
#[command(about = "Property list patching and build variable tracking for make", long_about = None)]
#[command(version)]
struct Cli {
    /// Log more to stderr (-v info, -vv debug, -vvv trace); goes before the command
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Escape a value so make keeps its whitespace and trailing backslashes
    Escape {
        /// Taken verbatim, even when it looks like an option
        #[arg(allow_hyphen_values = true)]
        value: OsString,
    },

    /// Apply key edits to a property list and print the result
    Patch {
        /// Property list to read (left unmodified)
        file: PathBuf,

        /// TOML file of edits, applied before the ones on the command line
        #[arg(short, long)]
        edits: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Xml)]
        format: OutputFormat,

        /// Show a unified diff of the changes on stderr
        #[arg(short, long)]
        diff: bool,

        /// KEY EXPRESSION pairs; a trailing KEY without expression is deleted
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        pairs: Vec<OsString>,
    },

    /// Print `1` if build variables changed since the last run, and record them
    CheckVars {
        /// JSON file holding the previous snapshot
        snapshot: PathBuf,

        /// File whose modification time is bumped on change
        touch_target: PathBuf,

        /// NAME VALUE pairs as passed by make
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        variables: Vec<OsString>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Xml,
    Binary,
}

impl From<OutputFormat> for Format {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Xml => Format::Xml,
            OutputFormat::Binary => Format::Binary,
        }
    }
}

fn main() -> ExitCode {
    let args: Vec<OsString> = std::env::args_os().collect();

    // `escape VALUE` bypasses option parsing so values such as `--` or `-v`
    // reach the escaper unchanged.
    if let Some(value) = verbatim_escape_value(&args) {
        init_logging(0);
        return report(cmd_escape(value));
    }

    let cli = Cli::parse_from(args);
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Escape { value } => cmd_escape(&value),
        Commands::Patch {
            file,
            edits,
            format,
            diff,
            pairs,
        } => cmd_patch(&file, edits.as_deref(), format.into(), diff, pairs),
        Commands::CheckVars {
            snapshot,
            touch_target,
            variables,
        } => cmd_check_vars(snapshot, touch_target, variables),
    };
    report(result)
}

fn report(result: Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// The value of an `escape` invocation with exactly one argument.
fn verbatim_escape_value(args: &[OsString]) -> Option<&OsStr> {
    match args {
        [_, command, value] if command == "escape" => Some(value.as_os_str()),
        _ => None,
    }
}

fn cmd_escape(value: &OsStr) -> Result<()> {
    let value = value
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("value is not valid UTF-8: {:?}", value))?;
    write_stdout(escape_make_value(value).as_bytes())
}

fn cmd_patch(
    file: &Path,
    edit_file: Option<&Path>,
    format: Format,
    show_diff: bool,
    pairs: Vec<OsString>,
) -> Result<()> {
    // 1. Collect edits: edit file first, then command line pairs
    let mut edits = match edit_file {
        Some(path) => read_edits(path)?,
        None => Vec::new(),
    };
    let pairs = pairs
        .into_iter()
        .map(|arg| {
            arg.into_string()
                .map_err(|raw| anyhow::anyhow!("argument is not valid UTF-8: {:?}", raw))
        })
        .collect::<Result<Vec<_>>>()?;
    edits.extend(Edit::from_pairs(pairs)?);
    debug!(count = edits.len(), file = %file.display(), "applying edits");

    // 2. Decode and patch
    let original = read_document(file)?;
    let mut patched = original.clone();
    apply_edits(&mut patched, &edits)
        .with_context(|| format!("failed to patch {}", file.display()))?;

    // 3. Serialize everything before any output
    let bytes = encode(&patched, format)?;

    if show_diff {
        match (encode(&original, Format::Xml), encode(&patched, Format::Xml)) {
            (Ok(before), Ok(after)) => display_diff(
                file,
                &String::from_utf8_lossy(&before),
                &String::from_utf8_lossy(&after),
            ),
            _ => warn!("document cannot be rendered as XML, skipping diff"),
        }
    }

    write_stdout(&bytes)
}

fn cmd_check_vars(
    snapshot: PathBuf,
    touch_target: PathBuf,
    variables: Vec<OsString>,
) -> Result<()> {
    if check_and_save(snapshot, touch_target, variables) {
        write_stdout(b"1")?;
    }
    Ok(())
}

/// Print the XML change as unified diff hunks on stderr, colored by line kind.
fn display_diff(file: &Path, before: &str, after: &str) {
    let diff = TextDiff::from_lines(before, after);
    if diff.ops().iter().all(|op| op.tag() == DiffTag::Equal) {
        eprintln!("{}", format!("{}: no changes", file.display()).dimmed());
        return;
    }

    let old_name = format!("{} (original)", file.display());
    let new_name = format!("{} (patched)", file.display());
    let rendered = diff
        .unified_diff()
        .context_radius(3)
        .header(&old_name, &new_name)
        .to_string();

    for line in rendered.lines() {
        let styled = if line.starts_with("---") || line.starts_with("+++") {
            line.bold()
        } else if line.starts_with("@@") {
            line.cyan()
        } else if line.starts_with('-') {
            line.red()
        } else if line.starts_with('+') {
            line.green()
        } else {
            line.normal()
        };
        eprintln!("{styled}");
    }
}

/// Write the whole result in one go through a duplicate of the stdout
/// descriptor, leaving the process's own stdout handle alone.
fn write_stdout(bytes: &[u8]) -> Result<()> {
    io::stdout().flush()?;

    #[cfg(unix)]
    {
        use std::os::fd::AsFd;

        let fd = io::stdout().as_fd().try_clone_to_owned()?;
        let mut out = std::fs::File::from(fd);
        out.write_all(bytes)?;
        out.flush()?;
    }

    #[cfg(not(unix))]
    {
        let mut out = io::stdout().lock();
        out.write_all(bytes)?;
        out.flush()?;
    }

    Ok(())
}
