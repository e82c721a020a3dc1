//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// minapack: mini-program entry discovery and runtime injection
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Build context directory (relative to project root)
    #[arg(short, long)]
    pub context: Option<PathBuf>,

    /// Output directory path (relative to project root)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Config file name (default: mina.toml)
    #[arg(short = 'C', long, default_value = "mina.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Discover pages and components from manifests and write the bundler entry map
    Entries,

    /// Prepend eager-require bootstraps to the emitted entry chunks
    Inject {
        /// Chunk graph file (relative to output directory)
        #[arg(short, long)]
        graph: Option<PathBuf>,

        /// Also require the shared runtime chunk from every entry
        #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        include_runtime: Option<bool>,
    },

    /// Write the entry map, then rewrite it whenever manifests or sources change
    Watch,
}
