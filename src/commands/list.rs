use crate::core::ProcessorRegistry;
use crate::error::Result;
use colored::Colorize;

/// Print every registered processor with its one-line description.
pub fn run() -> Result<()> {
    let registry = ProcessorRegistry::with_defaults();
    let width = registry.names().map(str::len).max().unwrap_or(0);

    for processor in registry.iter() {
        let descriptor = processor.descriptor();
        let name = format!("{:<width$}", descriptor.name, width = width);
        println!(
            "{}  {}",
            name.bold(),
            first_sentence(descriptor.description).dimmed()
        );
    }
    Ok(())
}

fn first_sentence(description: &str) -> &str {
    match description.find(". ") {
        Some(idx) => &description[..=idx],
        None => description,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sentence_cuts_at_period() {
        assert_eq!(
            first_sentence("Returns a list. Does not recurse."),
            "Returns a list."
        );
        assert_eq!(first_sentence("Unpacks an Apple XIP file."), "Unpacks an Apple XIP file.");
    }
}
