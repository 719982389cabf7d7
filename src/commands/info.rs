use crate::core::{ProcessorDescriptor, ProcessorRegistry};
use crate::error::Result;
use crate::utils::machine_output::OutputFormat;
use colored::Colorize;

pub fn run(name: &str, format: Option<OutputFormat>) -> Result<()> {
    let registry = ProcessorRegistry::with_defaults();
    let descriptor = registry.get(name)?.descriptor();

    match format {
        Some(format) => println!("{}", render_machine(descriptor, format)?),
        None => print!("{}", render_text(descriptor)),
    }
    Ok(())
}

pub fn render_machine(descriptor: &ProcessorDescriptor, format: OutputFormat) -> Result<String> {
    let out = match format {
        OutputFormat::Json => serde_json::to_string_pretty(descriptor)?,
        OutputFormat::Yaml => serde_yml::to_string(descriptor)?,
    };
    Ok(out.trim_end().to_string())
}

pub fn render_text(descriptor: &ProcessorDescriptor) -> String {
    let mut out = format!("{}\n  {}\n", descriptor.name.bold(), descriptor.description);

    out.push_str(&format!("\n{}\n", "Inputs:".bold()));
    if descriptor.inputs.is_empty() {
        out.push_str("  (none)\n");
    }
    for input in descriptor.inputs {
        let mut line = format!("  {}", input.name.cyan());
        if input.required {
            line.push_str(&format!(" {}", "(required)".yellow()));
        }
        if let Some(default) = input.default {
            line.push_str(&format!(" [default: {:?}]", default));
        }
        out.push_str(&format!("{}\n      {}\n", line, input.description));
    }

    out.push_str(&format!("\n{}\n", "Outputs:".bold()));
    if descriptor.outputs.is_empty() {
        out.push_str("  (none)\n");
    }
    for output in descriptor.outputs {
        out.push_str(&format!(
            "  {}\n      {}\n",
            output.name.cyan(),
            output.description
        ));
    }
    out
}
