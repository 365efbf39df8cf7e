//! Integration tests: CLI smoke tests and real-filesystem strip scenarios.

mod common;

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use zonestrip::platform::pal::{MarkerFs, NativeFs, marker_path};
use zonestrip::strip::governor::AlwaysProceed;
use zonestrip::strip::reporter::{CollectingReporter, Level};
use zonestrip::strip::stripper::{StripOptions, Stripper};

const ZONE_DATA: &str = "[ZoneTransfer]\r\nZoneId=3\r\n";

/// Write `file` with `content`, plus a marker sibling when `marked`.
fn seed(file: &Path, content: &str, marked: bool) {
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(file, content).expect("write file");
    if marked {
        fs::write(marker_path(file), ZONE_DATA).expect("write marker");
    }
}

fn has_marker(file: &Path) -> bool {
    marker_path(file).exists()
}

/// `D/A` (marked), `D/B` (clean), `D/S/C` (marked).
fn seed_tree(root: &Path) -> (PathBuf, PathBuf, PathBuf) {
    let a = root.join("A.exe");
    let b = root.join("B.txt");
    let c = root.join("S").join("C.msi");
    seed(&a, "alpha", true);
    seed(&b, "bravo", false);
    seed(&c, "charlie", true);
    (a, b, c)
}

fn s(path: &Path) -> &str {
    path.to_str().expect("utf-8 temp path")
}

#[test]
fn help_command_prints_usage() {
    let result = common::run_cli_case("help_command_prints_usage", &["--help"]);
    assert!(
        result.status.success(),
        "expected success; log: {}",
        result.log_path.display()
    );
    assert!(
        result.stdout.contains("Usage: zonestrip"),
        "missing help banner; log: {}",
        result.log_path.display()
    );
    assert!(result.stdout.contains("--force"));
    assert!(result.stdout.contains("--no-recurse"));
}

#[test]
fn version_command_prints_version() {
    let result = common::run_cli_case("version_command_prints_version", &["--version"]);
    assert!(
        result.status.success(),
        "expected success; log: {}",
        result.log_path.display()
    );
    assert!(
        result.stdout.contains("zonestrip"),
        "missing version output; log: {}",
        result.log_path.display()
    );
}

#[test]
fn completions_command_generates_shell_script() {
    let result = common::run_cli_case(
        "completions_command_generates_shell_script",
        &["completions", "bash"],
    );
    assert!(
        result.status.success(),
        "expected success; log: {}",
        result.log_path.display()
    );
    assert!(
        result.stdout.contains("zonestrip"),
        "expected completion script contents; log: {}",
        result.log_path.display()
    );
}

#[test]
fn missing_path_exits_partial_with_one_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.exe");
    let result = common::run_cli_case("missing_path_exits_partial", &[s(&missing)]);

    assert_eq!(
        result.status.code(),
        Some(4),
        "log: {}",
        result.log_path.display()
    );
    assert_eq!(result.stderr.matches("ERROR: Path not found:").count(), 1);
    assert!(result.stdout.is_empty());
}

#[test]
fn strip_tree_reports_two_successes() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b, c) = seed_tree(dir.path());

    let result = common::run_cli_case("strip_tree_reports_two_successes", &[s(dir.path())]);

    assert!(
        result.status.success(),
        "expected success; log: {}",
        result.log_path.display()
    );
    assert_eq!(
        result.stdout.matches("Stripped Zone.Identifier from").count(),
        2,
        "log: {}",
        result.log_path.display()
    );
    assert!(!has_marker(&a));
    assert!(!has_marker(&c));
    assert_eq!(fs::read_to_string(&a).unwrap(), "alpha");
    assert_eq!(fs::read_to_string(&b).unwrap(), "bravo");
    assert_eq!(fs::read_to_string(&c).unwrap(), "charlie");
}

#[test]
fn dry_run_describes_intent_and_keeps_markers() {
    let dir = tempfile::tempdir().unwrap();
    let (a, _, c) = seed_tree(dir.path());

    let result = common::run_cli_case("dry_run_keeps_markers", &["--dry-run", s(dir.path())]);

    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert_eq!(
        result
            .stdout
            .matches("What if: Performing the operation \"strip marker stream\" on target")
            .count(),
        2
    );
    assert!(!result.stdout.contains("Stripped"));
    assert!(has_marker(&a));
    assert!(has_marker(&c));
}

#[test]
fn confirm_without_input_declines_everything() {
    let dir = tempfile::tempdir().unwrap();
    let (a, _, c) = seed_tree(dir.path());

    let result = common::run_cli_case("confirm_without_input", &["--confirm", s(dir.path())]);

    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("Confirm: strip marker stream on"));
    assert!(has_marker(&a));
    assert!(has_marker(&c));
}

#[test]
fn no_recurse_leaves_subdirectories_alone() {
    let dir = tempfile::tempdir().unwrap();
    let (a, _, c) = seed_tree(dir.path());

    let result = common::run_cli_case("no_recurse", &["--no-recurse", s(dir.path())]);

    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(!has_marker(&a));
    assert!(has_marker(&c));
}

#[test]
fn suppress_success_prints_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let (a, _, c) = seed_tree(dir.path());

    let result = common::run_cli_case("suppress_success", &["-s", s(dir.path())]);

    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stdout.is_empty());
    assert!(!has_marker(&a));
    assert!(!has_marker(&c));
}

#[test]
fn verbose_prints_steps_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    seed_tree(dir.path());

    let result = common::run_cli_case("verbose", &["-v", s(dir.path())]);

    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stdout.contains("VERBOSE: Entering directory"));
    assert!(result.stdout.contains("VERBOSE: Stripping Zone.Identifier from"));
    assert!(result.stdout.contains("3 file(s) scanned in 2 dir(s)"));
}

#[test]
fn json_output_carries_report_and_messages() {
    let dir = tempfile::tempdir().unwrap();
    seed_tree(dir.path());
    let missing = dir.path().join("gone");

    let result = common::run_cli_case("json_output", &["--json", s(dir.path()), s(&missing)]);

    assert_eq!(result.status.code(), Some(4), "log: {}", result.log_path.display());
    let payload: Value = serde_json::from_str(result.stdout.trim()).expect("valid json");
    assert_eq!(payload["command"], "strip");
    assert_eq!(payload["report"]["stripped"], 2);
    assert_eq!(payload["report"]["not_found"], 1);
    assert_eq!(payload["report"]["issues"][0]["code"], "ZS-2001");
    let messages = payload["messages"].as_array().expect("messages array");
    let successes = messages
        .iter()
        .filter(|m| m["level"] == "success")
        .count();
    assert_eq!(successes, 2);
}

#[test]
fn json_messages_hide_verbose_unless_requested() {
    let dir = tempfile::tempdir().unwrap();
    seed_tree(dir.path());

    let quiet = common::run_cli_case("json_without_verbose", &["--json", "--dry-run", s(dir.path())]);
    assert!(quiet.status.success(), "log: {}", quiet.log_path.display());
    let payload: Value = serde_json::from_str(quiet.stdout.trim()).expect("valid json");
    let messages = payload["messages"].as_array().expect("messages array");
    assert!(
        messages.iter().all(|m| m["level"] != "verbose"),
        "log: {}",
        quiet.log_path.display()
    );

    let loud = common::run_cli_case(
        "json_with_verbose",
        &["--json", "-v", "--dry-run", s(dir.path())],
    );
    assert!(loud.status.success(), "log: {}", loud.log_path.display());
    let payload: Value = serde_json::from_str(loud.stdout.trim()).expect("valid json");
    let verbose = payload["messages"]
        .as_array()
        .expect("messages array")
        .iter()
        .filter(|m| m["level"] == "verbose")
        .count();
    assert!(verbose > 0, "log: {}", loud.log_path.display());
}

#[test]
fn subcommand_after_global_flags_is_not_a_path() {
    let result = common::run_cli_case("config_path_after_verbose", &["-v", "config", "path"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stdout.contains("config.toml"));
    assert!(!result.stderr.contains("Path not found"));
}

#[test]
fn long_paths_are_truncated_in_output() {
    let dir = tempfile::tempdir().unwrap();
    let deep = dir
        .path()
        .join("a-rather-long-directory-name-for-downloads")
        .join("another-fairly-long-directory-name")
        .join("installer-with-a-long-name.exe");
    seed(&deep, "x", true);

    let result = common::run_cli_case("long_paths", &[s(dir.path())]);

    assert!(result.status.success(), "log: {}", result.log_path.display());
    let line = result.stdout.lines().next().expect("one success line");
    let shown = line
        .strip_prefix("Stripped Zone.Identifier from ")
        .expect("success prefix");
    assert_eq!(shown.chars().count(), 80);
    assert!(shown.starts_with("..."));
    assert!(shown.ends_with("installer-with-a-long-name.exe"));
}

#[test]
fn log_file_records_activity() {
    let dir = tempfile::tempdir().unwrap();
    seed_tree(dir.path());
    let log_dir = tempfile::tempdir().unwrap();
    let log = log_dir.path().join("activity.jsonl");

    let result = common::run_cli_case(
        "log_file_records_activity",
        &["--log-file", s(&log), s(dir.path())],
    );

    assert!(result.status.success(), "log: {}", result.log_path.display());
    let contents = fs::read_to_string(&log).expect("activity log written");
    let events: Vec<Value> = contents
        .lines()
        .map(|l| serde_json::from_str(l).expect("jsonl line"))
        .collect();
    assert_eq!(events.first().unwrap()["event"], "run_start");
    assert_eq!(events.last().unwrap()["event"], "run_complete");
    assert_eq!(
        events.iter().filter(|e| e["event"] == "marker_stripped").count(),
        2
    );
}

#[test]
fn config_file_defaults_apply() {
    let dir = tempfile::tempdir().unwrap();
    let (a, _, c) = seed_tree(dir.path());
    let cfg_dir = tempfile::tempdir().unwrap();
    let cfg = cfg_dir.path().join("config.toml");
    fs::write(&cfg, "[strip]\nno_recurse = true\nsuppress_success = true\n").unwrap();

    let result = common::run_cli_case(
        "config_file_defaults_apply",
        &["--config", s(&cfg), s(dir.path())],
    );

    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stdout.is_empty());
    assert!(!has_marker(&a));
    assert!(has_marker(&c));
}

#[test]
fn invalid_config_is_a_runtime_error() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("config.toml");
    fs::write(&cfg, "[log]\nmax_size_bytes = 10\n").unwrap();

    let result = common::run_cli_case(
        "invalid_config",
        &["--config", s(&cfg), s(dir.path())],
    );

    assert_eq!(result.status.code(), Some(2), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("ZS-1001"));
}

#[test]
fn config_show_and_path() {
    let show = common::run_cli_case("config_show", &["config", "show"]);
    assert!(show.status.success(), "log: {}", show.log_path.display());
    assert!(show.stdout.contains("[strip]"));
    assert!(show.stdout.contains("[log]"));

    let path = common::run_cli_case("config_path_json", &["--json", "config", "path"]);
    assert!(path.status.success(), "log: {}", path.log_path.display());
    let payload: Value = serde_json::from_str(path.stdout.trim()).expect("valid json");
    assert_eq!(payload["exists"], false);
    assert!(
        payload["path"]
            .as_str()
            .unwrap()
            .ends_with("config.toml")
    );
}

#[test]
fn config_validate_rejects_bad_file() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("config.toml");
    fs::write(&cfg, "[log]\nmax_rotated_files = 0\n").unwrap();

    let result = common::run_cli_case("config_validate", &["--config", s(&cfg), "config", "validate"]);

    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("Configuration is INVALID"));
}

// ---------------------------------------------------------------------------
// Library against the real filesystem
// ---------------------------------------------------------------------------

fn strip_native(path: &Path, options: StripOptions) -> CollectingReporter {
    let fs = NativeFs::new();
    let mut governor = AlwaysProceed;
    let mut reporter = CollectingReporter::new();
    Stripper::new(&fs, &mut governor, &mut reporter).process(path, &options);
    reporter
}

#[test]
fn native_strip_keeps_content_and_mtime() {
    let dir = tempfile::tempdir().unwrap();
    let (a, b, _) = seed_tree(dir.path());
    let pinned = filetime::FileTime::from_unix_time(1_600_000_000, 0);
    filetime::set_file_mtime(&a, pinned).unwrap();
    filetime::set_file_mtime(&b, pinned).unwrap();

    let out = strip_native(dir.path(), StripOptions::default());

    assert_eq!(out.count(Level::Success), 2);
    assert!(!has_marker(&a));
    for file in [&a, &b] {
        let meta = fs::metadata(file).unwrap();
        assert_eq!(filetime::FileTime::from_last_modification_time(&meta), pinned);
    }
}

#[test]
fn native_clean_file_produces_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("clean.txt");
    seed(&file, "x", false);

    let out = strip_native(&file, StripOptions {
        force: true,
        ..StripOptions::default()
    });

    assert!(out.records.is_empty());
}

#[test]
fn native_relative_paths_resolve_against_cwd() {
    let cwd = std::env::current_dir().unwrap();
    let dir = tempfile::tempdir_in(&cwd).unwrap();
    let file = dir.path().join("rel.exe");
    seed(&file, "x", true);
    let relative = file.strip_prefix(&cwd).unwrap();

    let out = strip_native(relative, StripOptions::default());

    assert!(!has_marker(&file));
    let success = out.messages(Level::Success);
    assert_eq!(success.len(), 1);
    assert!(success[0].ends_with("rel.exe"));
}

#[cfg(unix)]
#[test]
fn native_force_restores_exact_mode() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("locked.exe");
    seed(&file, "x", true);
    fs::set_permissions(&file, fs::Permissions::from_mode(0o444)).unwrap();

    let out = strip_native(&file, StripOptions {
        force: true,
        ..StripOptions::default()
    });

    assert!(!has_marker(&file));
    assert_eq!(out.count(Level::Success), 1);
    let mode = fs::metadata(&file).unwrap().permissions().mode() & 0o7777;
    assert_eq!(mode, 0o444);
    assert!(NativeFs::new().attributes(&file).unwrap().readonly);

    fs::set_permissions(&file, fs::Permissions::from_mode(0o644)).unwrap();
}
