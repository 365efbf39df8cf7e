#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use std::time::{SystemTime, UNIX_EPOCH};

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

const ENV_OVERRIDES: &[&str] = &[
    "ZONESTRIP_FORCE",
    "ZONESTRIP_NO_RECURSE",
    "ZONESTRIP_SUPPRESS_SUCCESS",
    "ZONESTRIP_VERBOSE",
    "ZONESTRIP_COLOR",
    "ZONESTRIP_LOG_FILE",
    "ZONESTRIP_LOG_MAX_SIZE_BYTES",
    "ZONESTRIP_OUTPUT_FORMAT",
];

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn resolve_bin_path() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_zonestrip") {
        return PathBuf::from(path);
    }

    let exe_name = if cfg!(windows) {
        "zonestrip.exe"
    } else {
        "zonestrip"
    };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve zonestrip binary path for integration test"),
    }
}

/// Run the binary with an isolated, empty home directory and no
/// `ZONESTRIP_*` overrides, then write stdout/stderr to a per-case log.
pub fn run_cli_case(case_name: &str, args: &[&str]) -> CmdResult {
    let root = std::env::temp_dir().join("zonestrip-test-logs");
    fs::create_dir_all(&root).expect("create temp test log dir");

    let stamp = format!("{}-{}", sanitize(case_name), now_millis());
    let log_path = root.join(format!("{stamp}.log"));
    let home = root.join(format!("{stamp}-home"));
    fs::create_dir_all(&home).expect("create isolated home dir");
    let bin_path = resolve_bin_path();

    let mut command = Command::new(&bin_path);
    command
        .args(args)
        .env("HOME", &home)
        .env("USERPROFILE", &home)
        .env("NO_COLOR", "1")
        .env("RUST_BACKTRACE", "1");
    for name in ENV_OVERRIDES {
        command.env_remove(name);
    }
    let output = command.output().expect("execute zonestrip command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let mut log_content = String::new();
    log_content.push_str(&format!("case={case_name}\n"));
    log_content.push_str(&format!("bin={}\n", bin_path.display()));
    log_content.push_str(&format!("args={args:?}\n"));
    log_content.push_str(&format!("status={}\n", output.status));
    log_content.push_str("----- stdout -----\n");
    log_content.push_str(&stdout);
    log_content.push('\n');
    log_content.push_str("----- stderr -----\n");
    log_content.push_str(&stderr);
    log_content.push('\n');
    fs::write(&log_path, log_content).expect("write test log");

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}
