//! rsec: restricted security profile resolver.
//!
//! Loads a security property file (plus any appended files), resolves the
//! selected profile through its inheritance chain and prints the security
//! table the host should apply.
//!
//! Usage:
//!   rsec resolve --file java.security --setting 1,trace
//!   rsec resolve --file java.security --properties-list extra.security --profile Demo.Plus
//!   rsec list --file java.security

mod app;
mod host;
mod listing;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rsec_contracts::selector::{flag_value, SelectorInput};
use rsec_integrity::{StderrDiagnostics, SystemClock};

use crate::app::{ResolveRequest, SourceArgs};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Resolve restricted security profiles from security property files.
#[derive(Parser)]
#[command(
    name = "rsec",
    about = "Restricted security profile resolver",
    long_about = "Resolves a restricted security profile through its inheritance chain,\n\
                  verifies the base profile hash and sunset date, and prints the\n\
                  resulting security properties."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a profile and print the effective security table.
    Resolve(ResolveArgs),
    /// List the description of every configured profile.
    List(FileArgs),
}

#[derive(Args)]
struct FileArgs {
    /// Main security property file.
    #[arg(long)]
    file: PathBuf,
    /// Appended property files, separated by ':'.
    #[arg(long)]
    properties_list: Option<String>,
}

impl From<FileArgs> for SourceArgs {
    fn from(args: FileArgs) -> Self {
        SourceArgs {
            file: args.file,
            properties_list: args.properties_list,
        }
    }
}

#[derive(Args)]
struct ResolveArgs {
    #[command(flatten)]
    files: FileArgs,
    /// Profile name, e.g. `Demo.Strict`. Overrides the id in --setting.
    #[arg(long)]
    profile: Option<String>,
    /// Setting string: `<id>,trace,audit,help`.
    #[arg(long)]
    setting: Option<String>,
    /// Select the FIPS profile (id 1).
    #[arg(long)]
    fips: bool,
    /// Select the checkpoint profile (id 2). Wins over --fips.
    #[arg(long)]
    checkpoint: bool,
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_name = "BOOL")]
    suppress_sunset_warning: Option<String>,
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_name = "BOOL")]
    ignore_sunset_expiration: Option<String>,
    /// Resolver settings TOML.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print the resolved profile and table as JSON.
    #[arg(long)]
    json: bool,
}

impl ResolveArgs {
    fn request(self) -> ResolveRequest {
        ResolveRequest {
            sources: self.files.into(),
            selector: SelectorInput {
                fips: self.fips,
                checkpoint: self.checkpoint,
                setting: self.setting,
                custom_profile: self.profile,
            },
            suppress_sunset_warning: self
                .suppress_sunset_warning
                .map(|v| flag_value(Some(&v))),
            ignore_sunset_expiration: self
                .ignore_sunset_expiration
                .map(|v| flag_value(Some(&v))),
            config: self.config,
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Diagnostics go to stderr; stdout carries only the listings and table.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Resolve(args) => {
            let json = args.json;
            app::run_resolve(
                &args.request(),
                Box::new(SystemClock),
                Arc::new(StderrDiagnostics),
            )
            .map(|report| print_report(&report, json))
        }
        Command::List(args) => app::run_list(&args.into()).map(|listing| print!("{listing}")),
    };

    if let Err(e) = result {
        eprintln!("rsec error: {}", e);
        std::process::exit(1);
    }
}

fn print_report(report: &app::Report, json: bool) {
    print!("{}", report.listing);
    if report.profile.is_none() {
        return;
    }
    if !json {
        print!("{}", report.render_table());
        return;
    }
    match report.to_json() {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("rsec error: failed to render JSON output: {}", e);
            std::process::exit(1);
        }
    }
}
