//! lockwalk: print the dependency tree recorded in a lock file.

mod config;
mod output;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::{ArgAction, Parser};
use lockwalk_core::Requiredness;
use lockwalk_lockfile::Project;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use config::{LockwalkConfig, Overrides};
use output::{OutputFormat, Printer};

#[derive(Parser)]
#[command(
    name = "lockwalk",
    version,
    about = "Print the dependency tree recorded in a package-lock.json, yarn.lock, or pnpm-lock.yaml"
)]
struct Cli {
    /// Directory holding package.json
    package_dir: PathBuf,
    /// Lock file to read (default: discovered in PACKAGE_DIR)
    lockfile: Option<PathBuf>,
    /// How hard to try for peerDependencies (require, skip, best-effort)
    #[arg(long)]
    peer: Option<Requiredness>,
    /// How hard to try for devDependencies (require, skip, best-effort)
    #[arg(long)]
    dev: Option<Requiredness>,
    /// Deepest nesting level to follow
    #[arg(long)]
    max_depth: Option<usize>,
    /// Report every failing dependency instead of stopping at the first
    #[arg(long)]
    keep_going: bool,
    /// Output format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
    /// More log output (-v info, -vv debug, -vvv trace); RUST_LOG wins
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let stdout = io::stdout();
    let stderr = io::stderr();
    match run(cli, stdout.lock(), stderr.lock()) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "lockwalk={level},lockwalk_core={level},lockwalk_lockfile={level}"
        ))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// Load, walk and print. `Ok(false)` means a dependency failed to resolve;
/// the failure has already been written to `diag`.
fn run(cli: Cli, out: impl Write, diag: impl Write) -> anyhow::Result<bool> {
    let config = LockwalkConfig::load(&cli.package_dir)?;
    let settings = config.settings(Overrides {
        max_depth: cli.max_depth,
        keep_going: cli.keep_going,
        peer: cli.peer,
        dev: cli.dev,
        format: cli.format,
    });
    debug!(?settings, "resolved settings");

    let project = Project::load(&cli.package_dir, cli.lockfile.as_deref())
        .with_context(|| format!("loading {}", cli.package_dir.display()))?;
    let specs = project.manifest.manifest().specs(&settings.policy);
    debug!(
        lockfile = %project.lockfile.display(),
        roots = specs.len(),
        "walking"
    );

    let mut printer = Printer::new(out, diag, settings.format);
    let walked = project.walk(&specs, settings.walk, &mut printer);
    let failures = printer.failures();
    printer
        .finish(
            project.manifest.display_name(),
            project.manifest.display_version(),
        )
        .context("writing output")?;

    match walked {
        Ok(()) => Ok(true),
        Err(error) => {
            debug!(%error, failures, "walk failed");
            Ok(false)
        }
    }
}
