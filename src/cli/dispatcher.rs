//! Command dispatcher
//!
//! Routes CLI commands to their handlers.

use crate::cli::args::{Cli, Command};
use crate::commands;
use crate::error::Result;

pub fn dispatch(args: &Cli) -> Result<()> {
    match &args.command {
        Command::List => commands::list::run(),

        Command::Info { name, format } => commands::info::run(name, *format),

        Command::Run {
            name,
            inputs,
            env_file,
            format,
        } => commands::run::run(&commands::run::RunOptions {
            processor: name.clone(),
            inputs: inputs.clone(),
            env_file: env_file.clone(),
            format: *format,
            config: args.global.config.clone(),
        }),

        Command::Completions { shell } => commands::completions::run(*shell),
    }
}
