mod config;
mod import;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use statecase_core::{DiagramDocument, StateDiagram, ValidationResult};
use statecase_storage::{FileStore, VersionStore};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

use config::{Config, PolicyName};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Validate, diff, and version application state diagrams.
#[derive(Parser)]
#[command(
    name = "statecase",
    version,
    about = "Validate, diff, and version application state diagrams"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log storage activity to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Path to a statecase.toml config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding stored diagram versions (overrides config)
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a diagram for dangling transitions, dead ends, and unreachable states
    Validate {
        /// Path to the diagram JSON file
        file: PathBuf,
    },

    /// Diff a diagram against a previous file or the latest stored version
    Diff {
        /// Path to the current diagram JSON file
        current: PathBuf,
        /// Path to the previous diagram (default: latest stored version)
        #[arg(long)]
        previous: Option<PathBuf>,
    },

    /// Validate and diff a diagram, then (with --yes) draft test cases and store it
    Import {
        /// Path to the diagram JSON file
        file: PathBuf,
        /// Confirm the import: generate drafts and save the version
        #[arg(long)]
        yes: bool,
        /// Write generated drafts to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Classification policy for modified states (overrides config)
        #[arg(long, value_enum)]
        policy: Option<PolicyName>,
    },

    /// List stored versions of an application, newest first
    History {
        /// Application name
        app: String,
    },

    /// Print the latest stored version of an application
    Latest {
        /// Application name
        app: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            report_error(&e.to_string(), cli.output, cli.quiet);
            process::exit(1);
        }
    };
    if let Some(dir) = cli.store_dir {
        config.store_dir = dir;
    }

    match cli.command {
        Commands::Validate { file } => {
            cmd_validate(&file, &config, cli.output, cli.quiet);
        }
        Commands::Diff { current, previous } => {
            cmd_diff(&current, previous.as_deref(), &config, cli.output, cli.quiet);
        }
        Commands::Import {
            file,
            yes,
            out,
            policy,
        } => {
            if let Some(policy) = policy {
                config.policy = policy;
            }
            import::cmd_import(import::ImportOptions {
                file: &file,
                confirm: yes,
                out: out.as_deref(),
                config: &config,
                output: cli.output,
                quiet: cli.quiet,
            });
        }
        Commands::History { app } => {
            cmd_history(&app, &config, cli.output, cli.quiet);
        }
        Commands::Latest { app } => {
            cmd_latest(&app, &config, cli.output, cli.quiet);
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // A subscriber may already be installed when run under a test harness.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn cmd_validate(file: &Path, config: &Config, output: OutputFormat, quiet: bool) {
    let document = load_document(file, output, quiet);
    let result = statecase_core::validate_with(&document, &config.entry_strategy());

    if !quiet {
        print_validation(&result, output);
    }
    if !result.is_valid {
        process::exit(1);
    }
}

fn cmd_diff(
    current_path: &Path,
    previous_path: Option<&Path>,
    config: &Config,
    output: OutputFormat,
    quiet: bool,
) {
    let current = load_diagram(current_path, output, quiet);

    let previous = match previous_path {
        Some(path) => Some(load_diagram(path, output, quiet)),
        None => {
            let versions = open_versions(config, output, quiet);
            match versions.get_latest(&current.application_name) {
                Ok(latest) => latest,
                Err(e) => {
                    report_error(&format!("storage error: {}", e), output, quiet);
                    process::exit(1);
                }
            }
        }
    };

    let diff = statecase_core::diff(previous.as_ref(), &current);
    if !quiet {
        match output {
            OutputFormat::Json => print_json(&diff),
            OutputFormat::Text => {
                if previous.is_none() {
                    println!(
                        "No previous version of '{}'; every state is new.",
                        current.application_name
                    );
                }
                println!("{}", diff.to_text());
            }
        }
    }
}

fn cmd_history(app: &str, config: &Config, output: OutputFormat, quiet: bool) {
    let versions = open_versions(config, output, quiet);
    let records = match versions.load_records(app) {
        Ok(r) => r,
        Err(e) => {
            report_error(&format!("storage error: {}", e), output, quiet);
            process::exit(1);
        }
    };

    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => {
            let entries: Vec<serde_json::Value> = records
                .iter()
                .map(|r| {
                    serde_json::json!({
                        "contentHash": r.content_hash,
                        "savedAt": format_timestamp(r.timestamp),
                        "stateCount": r.diagram.states.len(),
                        "timestamp": r.timestamp,
                        "version": r.diagram.version,
                    })
                })
                .collect();
            print_json(&entries);
        }
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No stored versions of '{}'.", app);
                return;
            }
            for r in &records {
                println!(
                    "{}  version {:<10} {:>3} state(s)  {}",
                    format_timestamp(r.timestamp),
                    display_version(&r.diagram),
                    r.diagram.states.len(),
                    &r.content_hash[..12.min(r.content_hash.len())]
                );
            }
        }
    }
}

fn cmd_latest(app: &str, config: &Config, output: OutputFormat, quiet: bool) {
    let versions = open_versions(config, output, quiet);
    match versions.get_latest(app) {
        Ok(Some(diagram)) => {
            if !quiet {
                print_json(&diagram);
            }
        }
        Ok(None) => {
            report_error(&format!("no stored versions of '{}'", app), output, quiet);
            process::exit(1);
        }
        Err(e) => {
            report_error(&format!("storage error: {}", e), output, quiet);
            process::exit(1);
        }
    }
}

// ── Shared helpers ───────────────────────────────────────────────────────────

/// Read and parse a diagram file, exiting with a report on failure.
pub(crate) fn load_document(path: &Path, output: OutputFormat, quiet: bool) -> DiagramDocument {
    let text = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("error reading '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    match statecase_core::parse_document(&text) {
        Ok(doc) => doc,
        Err(e) => {
            let msg = format!("error parsing '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

fn load_diagram(path: &Path, output: OutputFormat, quiet: bool) -> StateDiagram {
    match load_document(path, output, quiet).to_diagram() {
        Ok(d) => d,
        Err(e) => {
            let msg = format!("error parsing '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

pub(crate) fn open_versions(
    config: &Config,
    output: OutputFormat,
    quiet: bool,
) -> VersionStore<FileStore> {
    match FileStore::open(&config.store_dir) {
        Ok(store) => VersionStore::new(store)
            .with_namespace(config.namespace.clone())
            .with_retention(config.retention),
        Err(e) => {
            report_error(&format!("cannot open store: {}", e), output, quiet);
            process::exit(1);
        }
    }
}

pub(crate) fn print_validation(result: &ValidationResult, output: OutputFormat) {
    match output {
        OutputFormat::Json => print_json(result),
        OutputFormat::Text => println!("{}", result.to_text()),
    }
}

pub(crate) fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value)
            .unwrap_or_else(|e| format!("{{\"error\": \"serialization error: {}\"}}", e))
    );
}

fn format_timestamp(nanos: u64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(nanos))
        .ok()
        .and_then(|t| t.format(&Rfc3339).ok())
        .unwrap_or_else(|| nanos.to_string())
}

fn display_version(diagram: &StateDiagram) -> &str {
    if diagram.version.is_empty() {
        "-"
    } else {
        &diagram.version
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
