//! Machine-readable rendering of a processor's output env.
//!
//! Output is the bare env (sorted keys, no envelope, no timestamps) so the
//! result of one `run` can be fed to the next with `--env`.

use crate::core::env::Env;
use crate::error::Result;
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

pub fn render(env: &Env, format: OutputFormat) -> Result<String> {
    let out = match format {
        OutputFormat::Json => serde_json::to_string_pretty(env)?,
        OutputFormat::Yaml => serde_yml::to_string(env)?,
    };
    Ok(out.trim_end().to_string())
}

pub fn emit(env: &Env, format: OutputFormat) -> Result<()> {
    println!("{}", render(env, format)?);
    Ok(())
}
