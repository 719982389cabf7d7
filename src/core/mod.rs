//! Processor framework: the trait every processor implements, the env it
//! reads and writes, and the registry the CLI dispatches through.

pub mod descriptor;
pub mod env;
pub mod registry;

pub use descriptor::{InputSpec, OutputSpec, ProcessorDescriptor};
pub use env::Env;
pub use registry::ProcessorRegistry;

use crate::error::{ProcessorError, Result};
use crate::traits::AppContext;
use crate::ui;

/// A single-purpose unit with a declared input/output contract.
pub trait Processor {
    fn descriptor(&self) -> &'static ProcessorDescriptor;

    /// Run with inputs already validated and defaulted. The returned env
    /// holds outputs only.
    fn process(&self, ctx: &AppContext, env: &Env) -> Result<Env>;
}

/// Validate required inputs, fill declared defaults, then run.
pub fn execute(processor: &dyn Processor, ctx: &AppContext, env: &Env) -> Result<Env> {
    let descriptor = processor.descriptor();

    if let Some(missing) = descriptor.required_inputs().find(|spec| !env.contains(spec.name)) {
        return Err(ProcessorError::MissingInput {
            processor: descriptor.name.to_string(),
            key: missing.name.to_string(),
        });
    }

    let mut prepared = env.clone();
    for spec in descriptor.inputs {
        if let Some(default) = spec.default {
            prepared.set_default(spec.name, default);
        }
    }

    ui::verbose(&format!(
        "{}: running with {} input(s)",
        descriptor.name,
        prepared.len()
    ));
    processor.process(ctx, &prepared)
}
