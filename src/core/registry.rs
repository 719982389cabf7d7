use super::Processor;
use crate::error::{ProcessorError, Result};
use crate::processors;
use std::collections::BTreeMap;

/// All known processors, keyed by name.
pub struct ProcessorRegistry {
    processors: BTreeMap<&'static str, Box<dyn Processor>>,
}

impl ProcessorRegistry {
    pub fn empty() -> Self {
        Self {
            processors: BTreeMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        for processor in processors::all() {
            registry.register(processor);
        }
        registry
    }

    pub fn register(&mut self, processor: Box<dyn Processor>) {
        self.processors.insert(processor.descriptor().name, processor);
    }

    pub fn get(&self, name: &str) -> Result<&dyn Processor> {
        self.processors
            .get(name)
            .map(|p| p.as_ref())
            .ok_or_else(|| ProcessorError::UnknownProcessor(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.processors.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Processor> {
        self.processors.values().map(|p| p.as_ref())
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
