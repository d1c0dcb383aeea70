#![deny(clippy::expect_used)]
//! phplint command-line interface
//!
//! Usage:
//!   phplint src/                     # Lint every *.php file under src/
//!   phplint --format json a.php      # Machine-readable output
//!   phplint --config ci.toml src/    # Explicit configuration file

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgAction, Parser, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use phplint::config::LintConfig;
use phplint::loader::FsLoader;
use phplint::{pipeline, Report};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "phplint", version, about = "Static type inference and linting for PHP")]
struct Cli {
    /// Configuration file (defaults to $PHPLINT_CONFIG, then ./phplint.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Increase logging verbosity (-v: debug, -vv+: trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Files or directories to lint
    #[arg(required = true, value_name = "PATH")]
    paths: Vec<PathBuf>,
}

fn directive_for_verbosity(v: u8) -> &'static str {
    match v {
        0 => "phplint=warn",
        1 => "phplint=debug",
        _ => "phplint=trace",
    }
}

fn render_text(reports: &[Report]) -> String {
    let mut out = String::new();
    for report in reports {
        for diagnostic in &report.diagnostics {
            out.push_str(&diagnostic.to_string());
            out.push('\n');
        }
    }
    out
}

fn run(cli: &Cli) -> anyhow::Result<bool> {
    let cwd = env::current_dir().context("cannot determine the working directory")?;
    let config = LintConfig::discover(cli.config.as_deref(), &cwd)
        .context("failed to load configuration")?;
    debug!(base_dir = %config.base_dir.display(), "configuration loaded");

    let loader = FsLoader::from_config(&config);
    let mut reports = pipeline::analyze_paths(&cli.paths, config, Box::new(loader))
        .context("failed to read input files")?;
    for report in &mut reports {
        report.sort();
    }
    reports.sort_by(|a, b| a.file.cmp(&b.file));

    match cli.format {
        Format::Text => print!("{}", render_text(&reports)),
        Format::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
    }
    Ok(reports.iter().all(|r| r.success))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(directive_for_verbosity(cli.verbose))),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}
