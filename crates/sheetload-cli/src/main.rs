//! sheetload CLI - validate and test-load spreadsheet engine bundles

mod fs_loader;
mod host;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sheetload::{EventSink, InitPlan, LoadEvent, Manifest, Sequencer, SequencerOptions};
use tracing_subscriber::EnvFilter;

use crate::fs_loader::FsLoader;
use crate::host::ReportingHost;

#[derive(Parser)]
#[command(name = "sheetload")]
#[command(
    author,
    version,
    about = "Validate and test-load spreadsheet engine bundles"
)]
struct Cli {
    /// Log sequencer internals to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the default bundle manifest as JSON
    Manifest,

    /// Validate a manifest file and show its load order
    Check {
        /// Manifest JSON file
        file: PathBuf,
    },

    /// Print the default workbook the engine is initialized with
    Workbook,

    /// Load every bundle from a local directory in dependency order
    Load {
        /// Bundle directory or file:// URL
        #[arg(short, long)]
        base: String,

        /// Manifest JSON file (default: built-in bundle manifest)
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        /// Seconds allowed per bundle, 0 disables the limit
        #[arg(long, default_value = "30")]
        load_timeout: u64,

        /// Seconds a bundle may wait on its dependencies, 0 disables the limit
        #[arg(long, default_value = "30")]
        dependency_timeout: u64,

        /// Print status events as JSON lines
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Manifest => print_manifest(),
        Commands::Check { file } => check_manifest(&file),
        Commands::Workbook => print_workbook(),
        Commands::Load {
            base,
            manifest,
            load_timeout,
            dependency_timeout,
            json,
        } => {
            let options = SequencerOptions {
                load_timeout: seconds(load_timeout),
                dependency_timeout: seconds(dependency_timeout),
            };
            load(&base, manifest.as_deref(), options, json).await
        }
    }
}

fn seconds(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn read_manifest(path: &Path) -> Result<Manifest> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    Manifest::from_json(&json).with_context(|| format!("Invalid manifest '{}'", path.display()))
}

fn print_manifest() -> Result<()> {
    let json = Manifest::default_bundles()
        .to_json_pretty()
        .context("Failed to serialize manifest")?;
    println!("{json}");
    Ok(())
}

fn check_manifest(path: &Path) -> Result<()> {
    let manifest = read_manifest(path)?;

    println!("Manifest OK: {} resources", manifest.len());
    for (i, resource) in manifest.load_order().into_iter().enumerate() {
        if resource.is_independent() {
            println!("  {}. {} ({})", i + 1, resource.name, resource.path);
        } else {
            let deps: Vec<&str> = resource.dependencies.iter().map(String::as_str).collect();
            println!(
                "  {}. {} ({}) after {}",
                i + 1,
                resource.name,
                resource.path,
                deps.join(", ")
            );
        }
    }
    Ok(())
}

fn print_workbook() -> Result<()> {
    let json = serde_json::to_string_pretty(&InitPlan::default().workbook)
        .context("Failed to serialize workbook")?;
    println!("{json}");
    Ok(())
}

/// Writes status events to stdout as they happen
struct PrintSink {
    json: bool,
}

impl EventSink for PrintSink {
    fn emit(&self, event: &LoadEvent) {
        if self.json {
            match serde_json::to_string(event) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!("Failed to serialize event: {e}"),
            }
        } else {
            println!("{event}");
        }
    }
}

async fn load(
    base: &str,
    manifest_path: Option<&Path>,
    options: SequencerOptions,
    json: bool,
) -> Result<()> {
    let manifest = match manifest_path {
        Some(path) => read_manifest(path)?,
        None => Manifest::default_bundles(),
    };

    let mut sequencer = Sequencer::new(FsLoader::new(), ReportingHost)
        .with_options(options)
        .with_event_sink(PrintSink { json });

    let report = sequencer
        .run(&manifest, base)
        .await
        .with_context(|| format!("Failed to load bundles from '{base}'"))?;

    for bundle in sequencer.loader().loaded() {
        tracing::debug!("{}: {} bytes", bundle.path.display(), bundle.bytes);
    }

    if !json {
        eprintln!(
            "Loaded {} bundles ({} bytes) in {} ms; registered {} plugins, created {} in #{} ({})",
            report.states.len(),
            sequencer.loader().total_bytes(),
            report.elapsed.as_millis(),
            report.instance.plugins.len(),
            report.instance.units.join(", "),
            report.instance.config.container,
            report.instance.config.locale
        );
    }
    Ok(())
}
