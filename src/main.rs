//! minapack - manifest-driven entry discovery and runtime injection for
//! mini-program bundles.

mod build;
mod cli;
mod config;
mod error;
mod logger;
mod plugin;
mod resolver;
mod runtime;
mod utils;
mod watch;

use anyhow::Result;
use build::{build_entries, inject_runtime};
use clap::Parser;
use cli::{Cli, Commands};
use config::MinaConfig;
use logger::format_error;
use plugin::{HostEvent, MinaPlugin};
use std::{path::Path, process::ExitCode};
use watch::watch_for_changes_blocking;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log!("error"; "{}", format_error(&e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;

    match &cli.command {
        Commands::Entries => {
            let mut plugin = MinaPlugin::from_config(&config);
            build_entries(&mut plugin, &config, HostEvent::EntryOption).map(|_| ())
        }
        Commands::Inject { .. } => {
            let plugin = MinaPlugin::from_config(&config);
            inject_runtime(&plugin, &config).map(|_| ())
        }
        Commands::Watch => {
            let mut plugin = MinaPlugin::from_config(&config);
            // A broken project is reported, then fixed while watching
            if let Err(e) = build_entries(&mut plugin, &config, HostEvent::EntryOption) {
                log!("error"; "{}", format_error(&e));
            }
            watch_for_changes_blocking(config, || load_config(cli))
        }
    }
}

/// Load and validate configuration from CLI arguments.
///
/// A missing config file means all defaults.
fn load_config(cli: &Cli) -> Result<MinaConfig> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let config_path = root.join(&cli.config);

    let mut config = if config_path.exists() {
        MinaConfig::from_path(&config_path)?
    } else {
        MinaConfig::default()
    };
    config.update_with_cli(cli);
    config.validate()?;

    Ok(config)
}
