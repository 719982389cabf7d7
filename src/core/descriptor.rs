//! Static processor metadata: the declared input/output contract.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct InputSpec {
    pub name: &'static str,
    pub required: bool,
    pub description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct OutputSpec {
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ProcessorDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub inputs: &'static [InputSpec],
    pub outputs: &'static [OutputSpec],
}

impl ProcessorDescriptor {
    pub fn input(&self, name: &str) -> Option<&InputSpec> {
        self.inputs.iter().find(|spec| spec.name == name)
    }

    pub fn required_inputs(&self) -> impl Iterator<Item = &InputSpec> {
        self.inputs.iter().filter(|spec| spec.required)
    }
}

pub const fn required(name: &'static str, description: &'static str) -> InputSpec {
    InputSpec {
        name,
        required: true,
        description,
        default: None,
    }
}

pub const fn optional(name: &'static str, description: &'static str) -> InputSpec {
    InputSpec {
        name,
        required: false,
        description,
        default: None,
    }
}

pub const fn with_default(
    name: &'static str,
    description: &'static str,
    default: &'static str,
) -> InputSpec {
    InputSpec {
        name,
        required: false,
        description,
        default: Some(default),
    }
}

pub const fn output(name: &'static str, description: &'static str) -> OutputSpec {
    OutputSpec { name, description }
}
