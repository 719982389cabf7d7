//! Android SDK repository manifests: tool versions and per-package fields.

use crate::core::Processor;
use crate::core::descriptor::{ProcessorDescriptor, output, required};
use crate::core::env::Env;
use crate::error::{ProcessorError, Result};
use crate::net::load_document;
use crate::traits::AppContext;
use crate::ui;
use crate::utils::xml;
use roxmltree::Node;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const MACOS_HOST: &str = "macosx";

/// `major.minor.micro` of a `revision` element. Missing parts are empty.
fn revision_string(revision: Node<'_, '_>) -> String {
    let part = |name: &str| xml::child_text(revision, name).unwrap_or_default();
    format!("{}.{}.{}", part("major"), part("minor"), part("micro"))
}

// ---------------------------------------------------------------------------

pub struct AndroidSDKVersioner;

static ANDROID_SDK_VERSIONER: ProcessorDescriptor = ProcessorDescriptor {
    name: "AndroidSDKVersioner",
    description: "Parses the repository XML file for the latest version of the SDK tools.",
    inputs: &[required("xml_file", "Path or URL to XML file.")],
    outputs: &[output("version", "Combined version of the SDK tools.")],
};

#[derive(Deserialize)]
struct AndroidSDKInput {
    xml_file: String,
}

#[derive(Serialize)]
struct AndroidSDKOutput {
    version: String,
}

pub fn sdk_tools_version(content: &str, source_name: &str) -> Result<String> {
    let doc = xml::parse(content, source_name)?;
    let not_found = || ProcessorError::NotFound("Version not found".to_string());

    let tool = xml::last_child(doc.root_element(), "tool").ok_or_else(not_found)?;
    let revision = xml::first_child(tool, "revision").ok_or_else(not_found)?;
    let mut parts = Vec::with_capacity(3);
    for name in ["major", "minor", "micro"] {
        parts.push(xml::child_text(revision, name).ok_or_else(not_found)?);
    }
    Ok(parts.join("."))
}

impl Processor for AndroidSDKVersioner {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &ANDROID_SDK_VERSIONER
    }

    fn process(&self, ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: AndroidSDKInput = env.decode()?;
        let content = load_document(ctx, &input.xml_file)?;
        let version = sdk_tools_version(&content, &input.xml_file)?;
        ui::info(&format!("Version: {}", version));
        Env::encode(&AndroidSDKOutput { version })
    }
}

// ---------------------------------------------------------------------------

pub struct AndroidXMLParser;

static ANDROID_XML_PARSER: ProcessorDescriptor = ProcessorDescriptor {
    name: "AndroidXMLParser",
    description: "Parses the provided repository XML file for tag values of the last matching element.",
    inputs: &[
        required("xml_file", "Path or URL to XML file."),
        required("namespace", "Element name to search for to find a tag inside."),
        required(
            "tags",
            "Object of tags to search for and the output names to give them, e.g. {\"uses-license\": \"license_ref\"}.",
        ),
    ],
    outputs: &[output(
        "xml_output_variables",
        "One output per entry in 'tags', named by the entry's value.",
    )],
};

#[derive(Deserialize)]
struct TagQuery {
    xml_file: String,
    namespace: String,
    tags: BTreeMap<String, String>,
}

/// URL of the macOS archive, or of the first archive when none targets macOS.
fn archive_url(item: Node<'_, '_>) -> Option<String> {
    let archives = xml::first_child(item, "archives")?;
    let mac = xml::children_named(archives, "archive").find(|archive| {
        xml::child_text(*archive, "host-os").is_some_and(|os| os.contains(MACOS_HOST))
    });
    let chosen = mac.or_else(|| xml::first_child(archives, "archive"))?;
    xml::child_text(chosen, "url").map(str::to_string)
}

pub fn parse_repository_tags(
    content: &str,
    source_name: &str,
    element: &str,
    tags: &BTreeMap<String, String>,
) -> Result<Env> {
    let doc = xml::parse(content, source_name)?;
    let root = doc.root_element();
    let item = xml::last_child(root, element).ok_or_else(|| {
        ProcessorError::NotFound(format!("no '{}' element in {}", element, source_name))
    })?;

    let license_paired = tags.contains_key("uses-license") && tags.contains_key("license");
    let mut out = Env::new();

    for (key, var) in tags {
        let value = match key.as_str() {
            "uses-license" => xml::first_child(item, key)
                .and_then(|n| n.attribute("ref"))
                .map(str::to_string),
            // paired with uses-license, the license text is the root's first child
            "license" if license_paired => xml::first_element_child(root)
                .map(|n| xml::ascii_escape(xml::text(n))),
            "url" => archive_url(item),
            _ => xml::child_text(item, key).map(str::to_string),
        };

        match value {
            Some(value) => {
                ui::info(&format!("Found {} as {}", key, value));
                out.insert(var.clone(), value);
            }
            None => ui::warning(&format!("Tag '{}' not found in {}", key, element)),
        }
    }

    Ok(out)
}

impl Processor for AndroidXMLParser {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &ANDROID_XML_PARSER
    }

    fn process(&self, ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: TagQuery = env.decode()?;
        let content = load_document(ctx, &input.xml_file)?;
        parse_repository_tags(&content, &input.xml_file, &input.namespace, &input.tags)
    }
}

// ---------------------------------------------------------------------------

pub struct AndroidExtraXMLParser;

static ANDROID_EXTRA_XML_PARSER: ProcessorDescriptor = ProcessorDescriptor {
    name: "AndroidExtraXMLParser",
    description: "Parses the addons XML file for the fields of the extra with a given display name.",
    inputs: &[
        required("xml_file", "Path or URL to XML file."),
        required("name", "name-display of the extra to match."),
        required(
            "tags",
            "Object of tags to search for and the output names to give them, e.g. {\"revision\": \"version\"}.",
        ),
    ],
    outputs: &[output(
        "found_value",
        "One output per entry in 'tags', named by the entry's value.",
    )],
};

#[derive(Deserialize)]
struct ExtraQuery {
    xml_file: String,
    name: String,
    tags: BTreeMap<String, String>,
}

pub fn parse_extra_tags(
    content: &str,
    source_name: &str,
    name: &str,
    tags: &BTreeMap<String, String>,
) -> Result<Env> {
    let doc = xml::parse(content, source_name)?;
    let root = doc.root_element();
    let record = xml::children_named(root, "extra")
        .find(|extra| xml::child_text(*extra, "name-display") == Some(name))
        .ok_or_else(|| ProcessorError::NotFound(format!("no extra named '{}'", name)))?;

    let mut out = Env::new();
    for (key, var) in tags {
        let value = match key.as_str() {
            "license" => xml::last_child(root, "license").map(|n| xml::ascii_escape(xml::text(n))),
            "uses-license" => xml::first_child(record, key)
                .and_then(|n| n.attribute("ref"))
                .map(str::to_string),
            "revision" => xml::first_child(record, key).map(revision_string),
            _ => xml::first_descendant(record, key).map(|n| xml::text(n).to_string()),
        };

        match value {
            Some(value) => {
                ui::info(&format!("Found {}: {}", key, value));
                out.insert(var.clone(), value);
            }
            None => ui::warning(&format!("Tag '{}' not found for extra '{}'", key, name)),
        }
    }

    Ok(out)
}

impl Processor for AndroidExtraXMLParser {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &ANDROID_EXTRA_XML_PARSER
    }

    fn process(&self, ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: ExtraQuery = env.decode()?;
        let content = load_document(ctx, &input.xml_file)?;
        parse_extra_tags(&content, &input.xml_file, &input.name, &input.tags)
    }
}
