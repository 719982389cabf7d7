//! Run Command
//!
//! Builds an input env from settings defaults, an optional env document and
//! `-i` assignments (in that order, later layers win), executes one
//! processor and prints its output env.

use crate::config::Settings;
use crate::core::{Env, ProcessorRegistry, execute};
use crate::error::{ProcessorError, Result};
use crate::traits::AppContext;
use crate::ui as output;
use crate::utils::machine_output::{self, OutputFormat};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub struct RunOptions {
    pub processor: String,
    pub inputs: Vec<String>,
    pub env_file: Option<PathBuf>,
    pub format: OutputFormat,
    pub config: Option<PathBuf>,
}

pub fn run(options: &RunOptions) -> Result<()> {
    let registry = ProcessorRegistry::with_defaults();
    let processor = registry.get(&options.processor)?;

    let settings = Settings::load(options.config.as_deref())?;
    if let Some(source) = &settings.source {
        output::verbose(&format!("Settings loaded from {}", source.display()));
    }

    let env = build_env(
        &settings.defaults,
        options.env_file.as_deref(),
        &options.inputs,
    )?;
    let ctx = AppContext::from_settings(settings)?;

    output::header(&format!("Running {}", processor.descriptor().name));
    let result = execute(processor, &ctx, &env)?;
    output::success(&format!(
        "{} finished with {} output(s)",
        processor.descriptor().name,
        result.len()
    ));

    machine_output::emit(&result, options.format)
}

pub fn build_env(defaults: &Env, env_file: Option<&Path>, inputs: &[String]) -> Result<Env> {
    let mut env = defaults.clone();

    if let Some(path) = env_file {
        env.merge(read_env_document(path)?);
    }

    for raw in inputs {
        let (key, value) = Env::parse_assignment(raw)?;
        env.insert(key, value);
    }
    Ok(env)
}

/// Read a JSON env document; `-` means stdin.
fn read_env_document(path: &Path) -> Result<Env> {
    let content = if path == Path::new("-") {
        io::read_to_string(io::stdin())?
    } else {
        fs::read_to_string(path).map_err(|e| ProcessorError::io(path, e))?
    };
    Env::from_json(&content)
}

#[cfg(test)]
mod tests;
