// src/cli/mod.rs

pub mod events;
pub mod run;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "vigil",
    version,
    about = "Watch directory trees and hand settled files to a command"
)]
pub struct Cli {
    /// Verbose logging (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch one or more roots and run a handler for each settled file
    Run(RunOpts),
    /// Dump the raw event stream for a root (debugging aid)
    Events(EventsOpts),
}

#[derive(Args, Debug)]
pub struct RunOpts {
    /// Directories to watch
    #[arg(required = true)]
    pub roots: Vec<PathBuf>,

    /// Handler command; `{}` is replaced by the settled path, which is
    /// appended when no placeholder is given
    #[arg(long)]
    pub exec: Option<String>,

    /// Quiet period in milliseconds before a modified file counts as
    /// settled [default: 500, or VIGIL_SETTLE_MS]
    #[arg(long)]
    pub settle_ms: Option<u64>,

    /// Regular expression; matching child names are ignored entirely
    #[arg(long)]
    pub exclude: Option<String>,

    /// Skip zero-size files
    #[arg(long)]
    pub skip_empty: bool,

    /// React only to close-write and move-in, not to bare modifications
    #[arg(long)]
    pub no_modify: bool,
}

#[derive(Args, Debug)]
pub struct EventsOpts {
    /// Directory to watch
    pub root: PathBuf,

    /// Regular expression; matching child names are ignored entirely
    #[arg(long)]
    pub exclude: Option<String>,
}
