pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod exec;
pub mod net;
pub mod processors;
pub mod project_identity;
pub mod traits;
pub mod ui;
pub mod utils;

#[cfg(test)]
mod testing;

use clap::Parser;
use std::process::exit;

/// Run procpack CLI entrypoint.
pub fn run_cli() {
    let args = cli::args::Cli::parse();

    ui::init_colors(args.global.color.as_str());
    ui::set_quiet(args.global.quiet);
    ui::set_verbose(args.global.verbose);

    if let Err(e) = cli::dispatcher::dispatch(&args) {
        ui::error(&format!("{}", e));
        exit(1);
    }
}
