//! vigil CLI entry-point
//!
//! All heavy lifting lives in the `libvigil` crate; this file handles
//! argument parsing, logging and command dispatch.

mod cli; // sub-command definitions and argument structs

use anyhow::Result;
use clap::Parser;
use libvigil::logging;
use std::env;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let args = Cli::parse();
    if args.verbose {
        env::set_var("RUST_LOG", "debug");
    }
    logging::init();

    match args.command {
        Commands::Run(opts) => cli::run::run(&opts),
        Commands::Events(opts) => cli::events::run(&opts),
    }
}
