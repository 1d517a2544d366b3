//! Integration tests for the command-line interface
//!
//! Runs the built binary for the escape, patch and check-vars commands

use build_utils::{decode, Document, Node};
use filetime::FileTime;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const INFO_PLIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>CFBundleIdentifier</key>
	<string>org.example.Agent</string>
	<key>CFBundleVersion</key>
	<string>41</string>
	<key>NSSupportsSuddenTermination</key>
	<true/>
</dict>
</plist>
"#;

fn build_utils(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_build-utils"))
        .args(args)
        .output()
        .unwrap()
}

/// Helper to create a workspace holding an Info.plist
fn setup_plist() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Info.plist"), INFO_PLIST).unwrap();
    dir
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn root_entries(doc: &Document) -> &std::collections::BTreeMap<String, Document> {
    match doc {
        Node::Dictionary(entries) => entries,
        other => panic!("expected dictionary root, got {}", other.kind()),
    }
}

#[test]
fn test_help_lists_commands() {
    let output = build_utils(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("escape"));
    assert!(stdout.contains("patch"));
    assert!(stdout.contains("check-vars"));
}

#[test]
fn test_escape_prints_without_newline() {
    let output = build_utils(&["escape", r"C:\dir\ name\"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), r"C:\dir\\\ name\\");
}

#[test]
fn test_escape_accepts_leading_hyphen() {
    let output = build_utils(&["escape", "-O2 -g"]);
    assert!(output.status.success());
    assert_eq!(output.stdout, b"-O2 -g");
}

#[test]
fn test_escape_takes_option_like_values_verbatim() {
    for value in ["-v", "--", "-vv", "--verbose"] {
        let output = build_utils(&["escape", value]);
        assert!(
            output.status.success(),
            "escape {value}: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        assert_eq!(String::from_utf8_lossy(&output.stdout), value);
    }
}

#[test]
fn test_verbose_flag_goes_before_command() {
    let output = build_utils(&["-v", "escape", "a b"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), r"a\ b");
}

#[test]
fn test_patch_applies_pairs_in_order() {
    let workspace = setup_plist();
    let plist = workspace.path().join("Info.plist");

    let output = build_utils(&[
        "patch",
        path_str(&plist),
        "LSUIElement",
        "bool('yes')",
        "CFBundleVersion",
        "int(value)",
        "NSSupportsSuddenTermination",
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let doc = decode(&output.stdout).unwrap();
    let entries = root_entries(&doc);
    assert_eq!(entries.get("LSUIElement"), Some(&Node::Boolean(true)));
    assert_eq!(entries.get("CFBundleVersion"), Some(&Node::from(41_i64)));
    assert!(!entries.contains_key("NSSupportsSuddenTermination"));
    assert_eq!(
        entries.get("CFBundleIdentifier"),
        Some(&Node::Text("org.example.Agent".to_string()))
    );

    // Input is never rewritten
    assert_eq!(fs::read_to_string(&plist).unwrap(), INFO_PLIST);
}

#[test]
fn test_patch_without_edits_round_trips() {
    let workspace = setup_plist();
    let plist = workspace.path().join("Info.plist");

    let output = build_utils(&["patch", path_str(&plist)]);
    assert!(output.status.success());
    assert_eq!(
        decode(&output.stdout).unwrap(),
        decode(INFO_PLIST.as_bytes()).unwrap()
    );
}

#[test]
fn test_patch_binary_output() {
    let workspace = setup_plist();
    let plist = workspace.path().join("Info.plist");

    let output = build_utils(&["patch", "--format", "binary", path_str(&plist)]);
    assert!(output.status.success());
    assert!(output.stdout.starts_with(b"bplist00"));
    assert_eq!(
        decode(&output.stdout).unwrap(),
        decode(INFO_PLIST.as_bytes()).unwrap()
    );
}

#[test]
fn test_patch_edit_file_runs_before_pairs() {
    let workspace = setup_plist();
    let plist = workspace.path().join("Info.plist");
    let edits = workspace.path().join("edits.toml");
    fs::write(
        &edits,
        r#"[meta]
description = "agent tweaks"

[[edits]]
key = "LimitLoadToSessionType"
expression = "list('Aqua, LoginWindow')"

[[edits]]
key = "CFBundleVersion"
expression = "'42'"
"#,
    )
    .unwrap();

    let output = build_utils(&[
        "patch",
        "--edits",
        path_str(&edits),
        path_str(&plist),
        "CFBundleVersion",
        "int(value)",
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let doc = decode(&output.stdout).unwrap();
    let entries = root_entries(&doc);
    assert_eq!(entries.get("CFBundleVersion"), Some(&Node::from(42_i64)));
    assert_eq!(
        entries.get("LimitLoadToSessionType"),
        Some(&Node::Array(vec![
            Node::Text("Aqua".to_string()),
            Node::Text("LoginWindow".to_string()),
        ]))
    );
}

#[test]
fn test_patch_diff_goes_to_stderr() {
    let workspace = setup_plist();
    let plist = workspace.path().join("Info.plist");

    let output = build_utils(&["patch", "--diff", path_str(&plist), "LSUIElement", "true"]);
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("(original)"));
    assert!(stderr.contains("<key>LSUIElement</key>"));
    assert!(decode(&output.stdout).is_ok());
}

#[test]
fn test_patch_bad_expression_fails_without_output() {
    let workspace = setup_plist();
    let plist = workspace.path().join("Info.plist");

    let output = build_utils(&["patch", path_str(&plist), "LSUIElement", "bool("]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("LSUIElement"));
}

#[test]
fn test_patch_evaluation_error_fails_without_output() {
    let workspace = setup_plist();
    let plist = workspace.path().join("Info.plist");

    let output = build_utils(&["patch", path_str(&plist), "LSUIElement", "bool('maybe')"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_patch_missing_file_fails() {
    let workspace = TempDir::new().unwrap();
    let output = build_utils(&[
        "patch",
        path_str(&workspace.path().join("missing.plist")),
        "A",
        "1",
    ]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("error:"));
}

#[test]
fn test_patch_missing_edit_file_fails() {
    let workspace = setup_plist();
    let plist = workspace.path().join("Info.plist");
    let edits = workspace.path().join("missing.toml");

    let output = build_utils(&["patch", "--edits", path_str(&edits), path_str(&plist)]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing.toml"));
}

/// Helper: workspace with a Makefile whose mtime is far in the past
fn setup_build_dir() -> (TempDir, FileTime) {
    let dir = TempDir::new().unwrap();
    let makefile = dir.path().join("Makefile");
    fs::write(&makefile, "all:\n").unwrap();
    let old = FileTime::from_unix_time(1_000_000_000, 0);
    filetime::set_file_mtime(&makefile, old).unwrap();
    (dir, old)
}

fn mtime(path: &Path) -> FileTime {
    FileTime::from_last_modification_time(&fs::metadata(path).unwrap())
}

#[test]
fn test_check_vars_reports_change_then_settles() {
    let (dir, old) = setup_build_dir();
    let snapshot = dir.path().join("vars.json");
    let makefile = dir.path().join("Makefile");
    let args = [
        "check-vars",
        path_str(&snapshot),
        path_str(&makefile),
        "BUILD_UTILS_CLI_CC",
        "clang",
        "MAKEFLAGS",
        "-j8",
        "OBJROOT_DIR",
        "/tmp/obj",
    ];

    let output = build_utils(&args);
    assert!(output.status.success());
    assert_eq!(output.stdout, b"1");
    assert!(mtime(&makefile) > old);

    let saved: serde_json::Value =
        serde_json::from_slice(&fs::read(&snapshot).unwrap()).unwrap();
    assert_eq!(saved, serde_json::json!({ "BUILD_UTILS_CLI_CC": "clang" }));

    let touched = mtime(&makefile);
    let output = build_utils(&args);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    assert_eq!(mtime(&makefile), touched);
}

#[test]
fn test_check_vars_dry_run_writes_nothing() {
    let (dir, old) = setup_build_dir();
    let snapshot = dir.path().join("vars.json");
    let makefile = dir.path().join("Makefile");

    let output = build_utils(&[
        "check-vars",
        path_str(&snapshot),
        path_str(&makefile),
        "MFLAGS",
        "-n",
        "BUILD_UTILS_CLI_CC",
        "clang",
    ]);
    assert!(output.status.success());
    assert_eq!(output.stdout, b"1");
    assert!(!snapshot.exists());
    assert_eq!(mtime(&makefile), old);
}

#[test]
fn test_check_vars_succeeds_when_state_is_unwritable() {
    let dir = TempDir::new().unwrap();
    let snapshot = dir.path().join("no-such-dir").join("vars.json");
    let makefile = dir.path().join("missing-Makefile");

    let output = build_utils(&[
        "check-vars",
        path_str(&snapshot),
        path_str(&makefile),
        "BUILD_UTILS_CLI_CC",
        "clang",
    ]);
    assert!(output.status.success());
    assert_eq!(output.stdout, b"1");
}
