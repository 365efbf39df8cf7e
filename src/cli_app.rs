//! Top-level CLI definition and dispatch.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::control;
use serde_json::{Value, json};
use thiserror::Error;

use zonestrip::cli::console::ConsoleReporter;
use zonestrip::core::config::Config;
use zonestrip::logger::jsonl::{JsonlConfig, JsonlWriter};
use zonestrip::platform::pal::{MarkerFs, NativeFs};
use zonestrip::strip::governor::{AlwaysProceed, DryRun, Governor, Interactive};
use zonestrip::strip::report::StripReport;
use zonestrip::strip::reporter::{CollectingReporter, Level, Reporter};
use zonestrip::strip::stripper::{StripOptions, Stripper};

/// zonestrip: remove the Zone.Identifier "downloaded from the internet" marker.
#[derive(Debug, Parser)]
#[command(
    name = "zonestrip",
    author,
    version,
    about = "Strip Zone.Identifier marker streams from files and directory trees",
    long_about = None,
    arg_required_else_help = true,
    subcommand_negates_reqs = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Show step-by-step diagnostics.
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Append a JSONL activity log to this file.
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,
    /// Subcommand to execute instead of stripping.
    #[command(subcommand)]
    command: Option<Command>,
    #[command(flatten)]
    strip: StripArgs,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Generate shell completions.
    Completions(CompletionsArgs),
    /// View configuration state.
    Config(ConfigArgs),
}

#[derive(Debug, Clone, Args, Default)]
struct StripArgs {
    /// Files or directories to strip.
    #[arg(value_name = "PATH", required = true)]
    paths: Vec<PathBuf>,
    /// Temporarily clear the read-only attribute so markers can be removed.
    #[arg(short, long)]
    force: bool,
    /// Only process the immediate contents of directories.
    #[arg(short = 'n', long)]
    no_recurse: bool,
    /// Do not print a line for each stripped file.
    #[arg(short, long)]
    suppress_success: bool,
    /// Print what would be stripped without changing anything.
    #[arg(long)]
    dry_run: bool,
    /// Ask before stripping each file.
    #[arg(short, long, conflicts_with = "dry_run")]
    confirm: bool,
}

impl StripArgs {
    /// Whether any path or strip-only flag was given.
    fn is_requested(&self) -> bool {
        !self.paths.is_empty()
            || self.force
            || self.no_recurse
            || self.suppress_success
            || self.dry_run
            || self.confirm
    }
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum ConfigCommand {
    /// Print the config file path.
    Path,
    /// Print the effective configuration.
    Show,
    /// Load and validate the configuration.
    Validate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input at runtime.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Operation partially succeeded.
    #[error("{0}")]
    Partial(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Json(_) => 3,
            Self::Partial(_) => 4,
        }
    }
}

/// Dispatch the parsed command line.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.command.is_some() && cli.strip.is_requested() {
        return Err(CliError::User(
            "paths and strip options cannot be combined with a subcommand".to_string(),
        ));
    }
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Some(Command::Completions(args)) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
        Some(Command::Config(args)) => run_config(cli, args),
        None => run_strip(cli, &cli.strip),
    }
}

fn run_strip(cli: &Cli, args: &StripArgs) -> Result<(), CliError> {
    let config =
        Config::load(cli.config.as_deref()).map_err(|e| CliError::Runtime(e.to_string()))?;
    if !config.output.color {
        control::set_override(false);
    }

    let options = merge_options(args, &config);
    let verbose = cli.verbose || config.output.verbose;
    let mode = output_mode(cli);
    let mut activity = open_activity_log(cli, &config);
    let mut governor = select_governor(args, mode);
    let fs = NativeFs::new();

    let (report, messages) = match mode {
        OutputMode::Human => {
            let mut reporter = ConsoleReporter::stdio(verbose);
            let report = strip_paths(
                &fs,
                governor.as_mut(),
                &mut reporter,
                activity.as_mut(),
                &args.paths,
                &options,
            );
            (report, None)
        }
        OutputMode::Json => {
            let mut reporter = CollectingReporter::new();
            let report = strip_paths(
                &fs,
                governor.as_mut(),
                &mut reporter,
                activity.as_mut(),
                &args.paths,
                &options,
            );
            let mut records = reporter.records;
            if !verbose {
                records.retain(|r| r.level != Level::Verbose);
            }
            (report, Some(records))
        }
    };

    if let Some(log) = activity.as_mut() {
        log.flush();
    }

    match messages {
        None => {
            if verbose {
                println!("{}", report.summary_line());
            }
        }
        Some(records) => {
            let payload = json!({
                "command": "strip",
                "options": {
                    "force": options.force,
                    "no_recurse": options.no_recurse,
                    "suppress_success": options.suppress_success,
                },
                "report": serde_json::to_value(&report)?,
                "messages": serde_json::to_value(&records)?,
            });
            write_json_line(&payload)?;
        }
    }

    if report.has_errors() {
        let errors = report.failed + report.not_found;
        return Err(CliError::Partial(format!(
            "{errors} error(s) while stripping markers"
        )));
    }
    Ok(())
}

/// Flags can switch a configured default on, never off.
fn merge_options(args: &StripArgs, config: &Config) -> StripOptions {
    StripOptions {
        force: args.force || config.strip.force,
        no_recurse: args.no_recurse || config.strip.no_recurse,
        suppress_success: args.suppress_success || config.strip.suppress_success,
    }
}

fn select_governor(args: &StripArgs, mode: OutputMode) -> Box<dyn Governor> {
    if args.dry_run {
        // Keep stdout pure JSON when a machine is reading it.
        match mode {
            OutputMode::Human => Box::new(DryRun::stdout()),
            OutputMode::Json => Box::new(DryRun::new(io::stderr())),
        }
    } else if args.confirm {
        Box::new(Interactive::stdio())
    } else {
        Box::new(AlwaysProceed)
    }
}

fn open_activity_log(cli: &Cli, config: &Config) -> Option<JsonlWriter> {
    let mut log = config.log.clone();
    if let Some(path) = &cli.log_file {
        log.jsonl_path.clone_from(path);
    }
    JsonlConfig::from_log_config(&log).map(JsonlWriter::open)
}

fn strip_paths(
    fs: &dyn MarkerFs,
    governor: &mut dyn Governor,
    reporter: &mut dyn Reporter,
    mut activity: Option<&mut JsonlWriter>,
    paths: &[PathBuf],
    options: &StripOptions,
) -> StripReport {
    let mut total = StripReport::default();
    for path in paths {
        let mut stripper = Stripper::new(fs, governor, reporter);
        if let Some(log) = activity.as_deref_mut() {
            stripper = stripper.with_activity_log(log);
        }
        total.merge(stripper.process(path, options));
    }
    total
}

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let exists = path.exists();

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config path",
                        "path": path.to_string_lossy(),
                        "exists": exists,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let config = Config::load(cli.config.as_deref())
                .map_err(|e| CliError::Runtime(e.to_string()))?;

            match output_mode(cli) {
                OutputMode::Human => {
                    let toml_str = config
                        .to_toml()
                        .map_err(|e| CliError::Runtime(e.to_string()))?;
                    println!("{toml_str}");
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config show",
                        "config": serde_json::to_value(&config)?,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Validate) => match Config::load(cli.config.as_deref()) {
            Ok(config) => {
                match output_mode(cli) {
                    OutputMode::Human => {
                        println!("Configuration is valid.");
                        println!("  Source: {}", config.source_path.display());
                    }
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": true,
                            "path": config.source_path.to_string_lossy(),
                        });
                        write_json_line(&payload)?;
                    }
                }
                Ok(())
            }
            Err(e) => {
                match output_mode(cli) {
                    OutputMode::Human => {
                        eprintln!("Configuration is INVALID: {e}");
                    }
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": false,
                            "code": e.code(),
                            "error": e.to_string(),
                        });
                        write_json_line(&payload)?;
                    }
                }
                Err(CliError::User(format!("invalid config: {e}")))
            }
        },
    }
}

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("ZONESTRIP_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }
    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        _ => OutputMode::Human,
    }
}
