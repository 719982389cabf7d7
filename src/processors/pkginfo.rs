//! Versions from installer package metadata (`PackageInfo`, `Distribution`).

use super::read_file;
use crate::core::Processor;
use crate::core::descriptor::{ProcessorDescriptor, output, required};
use crate::core::env::Env;
use crate::error::{ProcessorError, Result};
use crate::exec::{CommandSpec, StderrPolicy, run_checked};
use crate::traits::AppContext;
use crate::ui;
use crate::utils::xml;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Deserialize)]
struct PackageInfoInput {
    package_info_path: PathBuf,
}

/// Identifier and version attributes of the first `pkg-info` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkgInfo {
    pub identifier: Option<String>,
    pub version: Option<String>,
}

pub fn read_pkg_info(content: &str, source_name: &str) -> Result<PkgInfo> {
    let doc = xml::parse(content, source_name)?;
    let node = xml::first_descendant(doc.root(), "pkg-info").ok_or_else(|| {
        ProcessorError::NotFound(format!("no pkg-info element in {}", source_name))
    })?;
    Ok(PkgInfo {
        identifier: node.attribute("identifier").map(str::to_string),
        version: node.attribute("version").map(str::to_string),
    })
}

fn load_pkg_info(path: &Path) -> Result<PkgInfo> {
    let source_name = path.display().to_string();
    read_pkg_info(&read_file(path)?, &source_name)
}

fn required_attr(value: Option<String>, attr: &str) -> Result<String> {
    value.ok_or_else(|| ProcessorError::NotFound(format!("pkg-info has no '{}' attribute", attr)))
}

// ---------------------------------------------------------------------------

pub struct PackageInfoVersioner;

static PACKAGE_INFO_VERSIONER: ProcessorDescriptor = ProcessorDescriptor {
    name: "PackageInfoVersioner",
    description: "Gets the identifier and version from a PackageInfo file in a distribution or bundle package.",
    inputs: &[required(
        "package_info_path",
        "Path to PackageInfo file inside a distribution/bundle package.",
    )],
    outputs: &[
        output("pkg_id", "Package identifier from the pkg-info element."),
        output("version", "Version from the pkg-info element."),
    ],
};

#[derive(Serialize)]
struct PackageInfoOutput {
    pkg_id: String,
    version: String,
}

impl Processor for PackageInfoVersioner {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &PACKAGE_INFO_VERSIONER
    }

    fn process(&self, _ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: PackageInfoInput = env.decode()?;
        let info = load_pkg_info(&input.package_info_path)?;
        let pkg_id = required_attr(info.identifier, "identifier")?;
        ui::info(&format!("Found pkg_id {}", pkg_id));
        let version = required_attr(info.version, "version")?;
        ui::info(&format!("Found version {}", version));
        Env::encode(&PackageInfoOutput { pkg_id, version })
    }
}

// ---------------------------------------------------------------------------

pub struct MasterVersioner;

static MASTER_VERSIONER: ProcessorDescriptor = ProcessorDescriptor {
    name: "MasterVersioner",
    description: "Gets the version from a PackageInfo file as master_version.",
    inputs: &[required(
        "package_info_path",
        "Path to PackageInfo file inside a distribution/bundle package.",
    )],
    outputs: &[output(
        "master_version",
        "Version from the pkg-info element.",
    )],
};

#[derive(Serialize)]
struct MasterVersionOutput {
    master_version: String,
}

impl Processor for MasterVersioner {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &MASTER_VERSIONER
    }

    fn process(&self, _ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: PackageInfoInput = env.decode()?;
        let master_version = required_attr(load_pkg_info(&input.package_info_path)?.version, "version")?;
        ui::info(&format!("Found version {}", master_version));
        Env::encode(&MasterVersionOutput { master_version })
    }
}

// ---------------------------------------------------------------------------

pub struct MoshVersioner;

static MOSH_VERSIONER: ProcessorDescriptor = ProcessorDescriptor {
    name: "MoshVersioner",
    description: "Gets the version from a Mosh package's Distribution file.",
    inputs: &[required("pathname", "Path to downloaded package.")],
    outputs: &[output(
        "version",
        "Version of the first versioned pkg-ref, without its mosh- prefix.",
    )],
};

#[derive(Deserialize)]
struct MoshInput {
    pathname: PathBuf,
}

#[derive(Serialize)]
struct MoshOutput {
    version: String,
}

/// First `pkg-ref` that carries a `version` attribute, with any leading
/// `m`, `o`, `s`, `h`, `-` characters removed.
pub fn mosh_version(distribution: &str) -> Result<String> {
    let doc = xml::parse(distribution, "Distribution")?;
    let raw = doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "pkg-ref")
        .find_map(|n| n.attribute("version"))
        .ok_or_else(|| ProcessorError::NotFound("no versioned pkg-ref in Distribution".to_string()))?;
    Ok(raw.trim_start_matches(['m', 'o', 's', 'h', '-']).to_string())
}

impl Processor for MoshVersioner {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &MOSH_VERSIONER
    }

    fn process(&self, ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: MoshInput = env.decode()?;
        let workdir = tempfile::tempdir()?;

        let spec = CommandSpec::new(ctx.tool("xar"))
            .arg("-xf")
            .path_arg(&input.pathname)
            .arg("Distribution")
            .current_dir(workdir.path());
        run_checked(ctx, &spec, StderrPolicy::Fatal).map_err(|e| {
            ProcessorError::Other(format!(
                "An error occurred while extracting Distribution file: {}",
                e
            ))
        })?;

        let distribution = read_file(&workdir.path().join("Distribution"))?;
        let version = mosh_version(&distribution)?;
        ui::info(&format!("Found version: {}", version));
        Env::encode(&MoshOutput { version })
    }
}
