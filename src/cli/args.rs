use crate::project_identity;
use crate::utils::machine_output::OutputFormat;
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = project_identity::BINARY_NAME,
    about = "Run single-purpose packaging processors",
    long_about = "Discover download URLs and versions, unpack vendor archives and render Chef blocks, one processor at a time",
    version,
    next_line_help = false,
    term_width = 80
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalFlags,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Parser, Debug)]
pub struct GlobalFlags {
    /// Settings file (defaults to PROCPACK_CONFIG, then the user config dir)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Quiet mode
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// When to colour log output
    #[arg(long, value_enum, default_value_t = ColorMode::Auto, global = true)]
    pub color: ColorMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ColorMode::Auto => "auto",
            ColorMode::Always => "always",
            ColorMode::Never => "never",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every available processor
    List,

    /// Show a processor's inputs and outputs
    Info {
        /// Processor name
        name: String,

        /// Print the descriptor as JSON or YAML instead of a table
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Run one processor and print its output env
    Run {
        /// Processor name
        name: String,

        /// Input assignment; JSON objects and arrays are parsed
        #[arg(short = 'i', long = "input", value_name = "KEY=VALUE")]
        inputs: Vec<String>,

        /// JSON object of inputs, or `-` for stdin
        #[arg(long = "env", value_name = "FILE")]
        env_file: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}
