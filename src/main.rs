//! Binary entry point for catalog-batch.
//!
//! This binary provides the CLI interface for staged catalog imports and exports.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::Context;
use catalog_batch::cli::{self, export::ExportArgs};
use catalog_batch::config::BatchConfig;
use catalog_batch::observability;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// catalog-batch - staged bulk import and export of product catalogs.
#[derive(Parser)]
#[command(name = "catalog-batch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "CATALOG_BATCH_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Import products and variants from a delimited file.
    Import {
        /// The file to import.
        file: PathBuf,

        /// Catalog snapshot (default: `<data_dir>/catalog.json`).
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Stage and summarize without applying.
        #[arg(long)]
        dry_run: bool,
    },

    /// Export products and variants to a delimited file.
    Export {
        /// Catalog snapshot (default: `<data_dir>/catalog.json`).
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Copy the finished file here.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Products per page.
        #[arg(long)]
        take: Option<usize>,

        /// Matching products to skip.
        #[arg(long, default_value = "0")]
        skip: usize,

        /// Export oldest products first.
        #[arg(long)]
        oldest_first: bool,
    },

    /// Manage regions.
    Region {
        /// Region subcommand.
        #[command(subcommand)]
        action: RegionAction,
    },

    /// Manage configuration.
    Config {
        /// Show current configuration.
        #[arg(long)]
        show: bool,
    },

    /// Maintain the staging store.
    Staging {
        /// Staging subcommand.
        #[command(subcommand)]
        action: StagingAction,
    },
}

/// Region subcommands.
#[derive(Subcommand)]
enum RegionAction {
    /// Add a region.
    Add {
        /// Region name, as used in `Price <name> [<CUR>]` headers.
        name: String,

        /// Three-letter currency code.
        #[arg(long)]
        currency: String,

        /// Catalog snapshot (default: `<data_dir>/catalog.json`).
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// List regions.
    List {
        /// Catalog snapshot (default: `<data_dir>/catalog.json`).
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

/// Staging subcommands.
#[derive(Subcommand)]
enum StagingAction {
    /// Delete expired staged batches.
    Purge,
}

/// Main entry point.
fn main() -> ExitCode {
    // A missing .env is fine.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            return ExitCode::FAILURE;
        },
    };

    let _observability = match observability::init_from_config(&config, cli.verbose) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Failed to initialize observability: {e}");
            return ExitCode::FAILURE;
        },
    };

    match run_command(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(command: Commands, config: &BatchConfig) -> anyhow::Result<()> {
    match command {
        Commands::Import {
            file,
            catalog,
            dry_run,
        } => cli::import::execute(config, &file, catalog.as_deref(), dry_run)
            .with_context(|| format!("import of {} failed", file.display())),

        Commands::Export {
            catalog,
            output,
            take,
            skip,
            oldest_first,
        } => {
            let args = ExportArgs {
                catalog,
                output,
                take,
                skip,
                oldest_first,
            };
            cli::export::execute(config, &args).context("export failed")
        },

        Commands::Region { action } => match action {
            RegionAction::Add {
                name,
                currency,
                catalog,
            } => cli::region::add(config, catalog.as_deref(), &name, &currency)
                .context("adding region failed"),
            RegionAction::List { catalog } => {
                cli::region::list(config, catalog.as_deref()).context("listing regions failed")
            },
        },

        Commands::Config { show } => cli::config::execute(config, show).map_err(Into::into),

        Commands::Staging {
            action: StagingAction::Purge,
        } => cli::staging::purge(config).context("staging purge failed"),
    }
}

/// Loads configuration from an explicit path or the default location, then
/// applies environment overrides.
fn load_config(path: Option<&Path>) -> anyhow::Result<BatchConfig> {
    let config = match path {
        Some(path) => BatchConfig::load_from_file(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => BatchConfig::load_default(),
    };
    Ok(config.apply_env_overrides()?)
}
