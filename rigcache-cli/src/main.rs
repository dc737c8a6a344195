//! rigcache CLI - inspect and watch resource packs
//!
//! This binary drives the rigcache library from the command line: one-shot
//! scans, identifier listings and a watch loop that reloads when packs change.

mod commands;
mod error;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use rigcache::logging::WorkerGuard;
use rigcache::ConfigFile;

use commands::common::AssetKindArg;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "rigcache", version, about = "Hot-reloadable animation and geometry asset cache")]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG still takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Reload once from a packs folder and print the report
    Scan {
        /// Packs folder (defaults to overlays.packs_dir from the config)
        #[arg(long)]
        packs: Option<PathBuf>,

        /// Use the concurrent reload driver
        #[arg(long)]
        concurrent: bool,
    },

    /// Reload once and list the cached identifiers
    List {
        /// Packs folder (defaults to overlays.packs_dir from the config)
        #[arg(long)]
        packs: Option<PathBuf>,

        /// Which asset kind to list
        #[arg(long, value_enum, default_value_t = AssetKindArg::Animations)]
        kind: AssetKindArg,
    },

    /// Reload whenever the packs change, until Ctrl+C
    Watch {
        /// Packs folder (defaults to overlays.packs_dir from the config)
        #[arg(long)]
        packs: Option<PathBuf>,

        /// Seconds between change checks
        #[arg(long, default_value_t = 2)]
        interval: u64,
    },

    /// Write a default config file
    InitConfig {
        /// Where to write it (defaults to the standard config location)
        path: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::InitConfig { path } => commands::init_config::run(path),
        Commands::Scan { packs, concurrent } => {
            let (config, _log_guard) = setup(config_path, cli.verbose)?;
            commands::scan::run(&config, packs, concurrent)
        }
        Commands::List { packs, kind } => {
            let (config, _log_guard) = setup(config_path, cli.verbose)?;
            commands::list::run(&config, packs, kind)
        }
        Commands::Watch { packs, interval } => {
            let (config, _log_guard) = setup(config_path, cli.verbose)?;
            commands::watch::run(&config, packs, interval)
        }
    }
}

/// Load the config and install logging. Keep the guard alive while running.
fn setup(
    config_path: Option<&Path>,
    verbose: bool,
) -> Result<(ConfigFile, Option<WorkerGuard>), CliError> {
    let config = commands::common::load_config(config_path)?;

    let level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let guard = rigcache::logging::init(level, config.logging.file.as_deref())?;

    Ok((config, guard))
}
