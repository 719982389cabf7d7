//! Chef arrays and node attribute assignments.

use crate::core::Processor;
use crate::core::descriptor::{ProcessorDescriptor, optional, output, required, with_default};
use crate::core::env::{Env, de, display_value};
use crate::error::{ProcessorError, Result};
use crate::traits::AppContext;
use crate::ui;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

const EACH_DO: &str = ".each do |item|\n";

#[derive(Serialize)]
struct AttributeOutput {
    chef_block: String,
    attribute_variable: String,
}

/// Attribute references read from `node` rather than `default`.
fn node_variable(assignment_target: &str) -> String {
    assignment_target.replace("default", "node")
}

// ---------------------------------------------------------------------------

pub struct ChefArray;

static CHEF_ARRAY: ProcessorDescriptor = ProcessorDescriptor {
    name: "ChefArray",
    description: "Produces an array that can be used with other Chef blocks.",
    inputs: &[
        required(
            "item_list",
            "Array of items to be put into the array block. This can also be a single string.",
        ),
        optional("no_wrap_quotes", "Do not add wrapping quotation marks."),
        optional(
            "remove_version",
            "Removes the ['VERSION'] subscript from a string item_list.",
        ),
    ],
    outputs: &[output("array_block", "Chef array block.")],
};

#[derive(Deserialize)]
struct ChefArrayInput {
    item_list: Value,
    #[serde(default, deserialize_with = "de::flag")]
    no_wrap_quotes: bool,
    #[serde(default, deserialize_with = "de::opt_text")]
    remove_version: Option<String>,
}

#[derive(Serialize)]
struct ChefArrayOutput {
    array_block: String,
}

pub fn array_block(item_list: &Value, quote: bool, remove_version: Option<&str>) -> String {
    match item_list {
        Value::Array(items) => {
            let quotes = if quote { "'" } else { "" };
            let lines: Vec<String> = items
                .iter()
                .map(|item| format!("  {q}{}{q}", display_value(item), q = quotes))
                .collect();
            if lines.is_empty() {
                format!("[\n]{}", EACH_DO)
            } else {
                format!("[\n{}\n]{}", lines.join(",\n"), EACH_DO)
            }
        }
        other => {
            let mut variable = display_value(other);
            if let Some(version) = remove_version {
                variable = variable.replace(&format!("['{}']", version), "");
            }
            format!("{}{}", variable, EACH_DO)
        }
    }
}

impl Processor for ChefArray {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &CHEF_ARRAY
    }

    fn process(&self, _ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: ChefArrayInput = env.decode()?;
        let array_block = array_block(
            &input.item_list,
            !input.no_wrap_quotes,
            input.remove_version.as_deref(),
        );
        ui::verbose(&format!("Chef block:\n{}", array_block));
        Env::encode(&ChefArrayOutput { array_block })
    }
}

// ---------------------------------------------------------------------------

pub struct ChefAttributeList;

static CHEF_ATTRIBUTE_LIST: ProcessorDescriptor = ProcessorDescriptor {
    name: "ChefAttributeList",
    description: "Produces a Chef attribute variable for a list of items, i.e. munki[version][attribute].",
    inputs: &[
        required("attribute_version", "Version of Munki this applies to."),
        required("attribute", "Name of attribute."),
        required(
            "value",
            "Single string containing list of items, separated by commas.",
        ),
        with_default("path_prefix", "Path to prepend to each found item.", ""),
    ],
    outputs: &[
        output("chef_block", "Chef attribute block."),
        output("attribute_variable", "Full name of variable."),
    ],
};

#[derive(Deserialize)]
struct AttributeListInput {
    #[serde(deserialize_with = "de::text")]
    attribute_version: String,
    #[serde(deserialize_with = "de::text")]
    attribute: String,
    #[serde(deserialize_with = "de::text")]
    value: String,
    #[serde(default, deserialize_with = "de::text")]
    path_prefix: String,
}

pub fn attribute_list(version: &str, attribute: &str, values: &str, path_prefix: &str) -> (String, String) {
    let target = format!("munki['{}']['{}']", version, attribute);
    let mut block = format!("{} = [\n", target);
    for item in values.split(',') {
        let path = Path::new(path_prefix).join(item);
        block.push_str(&format!("  '{}',\n", path.display()));
    }
    block.push_str("]\n");
    let variable = node_variable(&target);
    (block, variable)
}

impl Processor for ChefAttributeList {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &CHEF_ATTRIBUTE_LIST
    }

    fn process(&self, _ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: AttributeListInput = env.decode()?;
        let (chef_block, attribute_variable) = attribute_list(
            &input.attribute_version,
            &input.attribute,
            &input.value,
            &input.path_prefix,
        );
        ui::verbose(&format!("Chef block: {}", chef_block));
        Env::encode(&AttributeOutput {
            chef_block,
            attribute_variable,
        })
    }
}

// ---------------------------------------------------------------------------

pub struct ChefAttributeHash;

static CHEF_ATTRIBUTE_HASH: ProcessorDescriptor = ProcessorDescriptor {
    name: "ChefAttributeHash",
    description: "Produces a Chef attribute variable for a hash of items, i.e. default[category][prefix][attribute].",
    inputs: &[
        required(
            "attribute_category",
            "Leading category for each attribute.",
        ),
        required("attribute_prefix", "Prefix to each attribute."),
        required("attribute", "Name of attribute."),
        required("value", "Dictionary of keys and values."),
        optional(
            "in_array",
            "Is this hash inside an array? If yes, a comma is added to the end.",
        ),
    ],
    outputs: &[
        output("chef_block", "Chef attribute block."),
        output("attribute_variable", "Full name of variable."),
    ],
};

#[derive(Deserialize)]
struct AttributeHashInput {
    #[serde(deserialize_with = "de::text")]
    attribute_category: String,
    #[serde(deserialize_with = "de::text")]
    attribute_prefix: String,
    #[serde(deserialize_with = "de::text")]
    attribute: String,
    value: Value,
    #[serde(default, deserialize_with = "de::flag")]
    in_array: bool,
}

pub fn attribute_hash(target: &str, values: &Map<String, Value>, in_array: bool) -> String {
    let mut keys: Vec<&String> = values.keys().collect();
    keys.sort();
    let entries: Vec<String> = keys
        .into_iter()
        .map(|key| format!("\t{} => {}", key, display_value(&values[key])))
        .collect();

    let mut block = if entries.is_empty() {
        format!("{} = {{\n}}", target)
    } else {
        format!("{} = {{\n{}\n}}", target, entries.join(",\n"))
    };
    if in_array {
        block.push(',');
    }
    block.push('\n');
    block
}

impl Processor for ChefAttributeHash {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &CHEF_ATTRIBUTE_HASH
    }

    fn process(&self, _ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: AttributeHashInput = env.decode()?;
        let Value::Object(values) = &input.value else {
            return Err(ProcessorError::invalid("value", "must be a dictionary"));
        };
        let target = format!(
            "default['{}']['{}']['{}']",
            input.attribute_category, input.attribute_prefix, input.attribute
        );
        let chef_block = attribute_hash(&target, values, input.in_array);
        ui::verbose(&format!("Chef block: {}", chef_block));
        Env::encode(&AttributeOutput {
            chef_block,
            attribute_variable: node_variable(&target),
        })
    }
}
