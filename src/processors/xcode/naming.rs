//! Xcode version components, file names, and the small marker files some
//! recipes emit next to a build.

use crate::core::Processor;
use crate::core::descriptor::{ProcessorDescriptor, optional, output, required, with_default};
use crate::core::env::{Env, de};
use crate::error::{ProcessorError, Result};
use crate::traits::AppContext;
use crate::ui;
use crate::utils::paths;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------

pub struct XcodeVersioner;

static XCODE_VERSIONER: ProcessorDescriptor = ProcessorDescriptor {
    name: "XcodeVersioner",
    description: "Breaks down a version number into its separate components.",
    inputs: &[required(
        "version",
        "CFBundleShortVersionString from an Xcode Info.plist.",
    )],
    outputs: &[
        output("major_version", "Major version of Xcode, i.e. Xcode 7, 8."),
        output("minor_version", "Minor version of Xcode, i.e. Xcode X.1, X.2."),
        output(
            "patch_version",
            "Patch version of Xcode; normalized to 0 if missing (8.3 becomes 8.3.0).",
        ),
    ],
};

#[derive(Deserialize)]
struct XcodeVersionerInput {
    #[serde(deserialize_with = "de::text")]
    version: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct VersionParts {
    pub major_version: String,
    pub minor_version: String,
    pub patch_version: String,
}

pub fn split_version(version: &str) -> Result<VersionParts> {
    let parts: Vec<&str> = version.split('.').collect();
    if parts.len() < 2 {
        return Err(ProcessorError::invalid(
            "version",
            format!("'{}' should be in format X.Y", version),
        ));
    }
    Ok(VersionParts {
        major_version: parts[0].to_string(),
        minor_version: parts[1].to_string(),
        patch_version: parts.get(2).copied().unwrap_or("0").to_string(),
    })
}

impl Processor for XcodeVersioner {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &XCODE_VERSIONER
    }

    fn process(&self, _ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: XcodeVersionerInput = env.decode()?;
        let parts = split_version(&input.version)?;
        ui::info(&format!(
            "Major: {}, minor: {}, patch: {}",
            parts.major_version, parts.minor_version, parts.patch_version
        ));
        Env::encode(&parts)
    }
}

// ---------------------------------------------------------------------------

pub struct XcodeFileNamer;

static XCODE_FILE_NAMER: ProcessorDescriptor = ProcessorDescriptor {
    name: "XcodeFileNamer",
    description: "Creates a filename for Xcode based on version information.",
    inputs: &[
        required(
            "should_produce_versioned_name",
            "Whether to produce a versioned name.",
        ),
        required("major_version", "Major version of Xcode."),
        required("minor_version", "Minor version of Xcode."),
        required("patch_version", "Patch version of Xcode."),
        required("is_beta", "True if this Xcode is a beta version."),
        with_default(
            "beta_version",
            "The beta number. Only used if is_beta is true.",
            "0",
        ),
        optional(
            "should_lowercase",
            "If true, use a lower-case filename: xcode_X.Y.0_suffix.",
        ),
        optional(
            "suffix",
            "Additional suffix appended to the name prior to the .app extension.",
        ),
    ],
    outputs: &[output("xcode_filename", "The Xcode file name.")],
};

#[derive(Debug, Deserialize)]
pub struct XcodeNameInput {
    #[serde(deserialize_with = "de::flag")]
    pub should_produce_versioned_name: bool,
    #[serde(deserialize_with = "de::text")]
    pub major_version: String,
    #[serde(deserialize_with = "de::text")]
    pub minor_version: String,
    #[serde(deserialize_with = "de::text")]
    pub patch_version: String,
    #[serde(deserialize_with = "de::flag")]
    pub is_beta: bool,
    #[serde(default, deserialize_with = "de::text")]
    pub beta_version: String,
    #[serde(default, deserialize_with = "de::flag")]
    pub should_lowercase: bool,
    #[serde(default, deserialize_with = "de::text")]
    pub suffix: String,
}

#[derive(Serialize)]
struct XcodeFileNamerOutput {
    xcode_filename: String,
}

/// `Xcode`, `Xcode-beta`, or `{Xcode|xcode}_M.m.p[_beta_N]{suffix}`.
pub fn xcode_filename(input: &XcodeNameInput) -> String {
    if !input.should_produce_versioned_name {
        return if input.is_beta { "Xcode-beta" } else { "Xcode" }.to_string();
    }

    let prefix = if input.should_lowercase { "xcode" } else { "Xcode" };
    let mut name = format!(
        "{}_{}.{}.{}",
        prefix, input.major_version, input.minor_version, input.patch_version
    );
    if input.is_beta {
        let beta = if input.beta_version.is_empty() {
            "0"
        } else {
            input.beta_version.as_str()
        };
        name.push_str(&format!("_beta_{}", beta));
    }
    name.push_str(&input.suffix);
    name
}

impl Processor for XcodeFileNamer {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &XCODE_FILE_NAMER
    }

    fn process(&self, _ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: XcodeNameInput = env.decode()?;
        let xcode_filename = xcode_filename(&input);
        ui::info(&format!("Xcode name: {}", xcode_filename));
        Env::encode(&XcodeFileNamerOutput { xcode_filename })
    }
}

// ---------------------------------------------------------------------------

fn write_marker(output_filepath: &str, content: &str) -> Result<PathBuf> {
    let destination = PathBuf::from(paths::expand_vars(output_filepath));
    fs::write(&destination, content).map_err(|e| ProcessorError::io(&destination, e))?;
    Ok(destination)
}

const SKIP_MESSAGE: &str = "dont_skip is false, so skipping this processor.";

pub struct XcodeVersionEmitter;

static XCODE_VERSION_EMITTER: ProcessorDescriptor = ProcessorDescriptor {
    name: "XcodeVersionEmitter",
    description: "Writes a version tag derived from the download URL to a file. Skipped by default.",
    inputs: &[
        optional("dont_skip", "If this evaluates as truthy, do not skip this step."),
        required("url", "URL to parse the version from."),
        required(
            "output_filepath",
            "Path to which the version tag is written. Environment variables are expanded.",
        ),
    ],
    outputs: &[output("derived_filename", "The derived filename.")],
};

#[derive(Deserialize)]
struct XcodeVersionEmitterInput {
    #[serde(default, deserialize_with = "de::flag")]
    dont_skip: bool,
    url: String,
    output_filepath: String,
}

#[derive(Serialize)]
struct XcodeVersionEmitterOutput {
    derived_filename: String,
}

/// Lower-cased file stem of the URL's path component.
pub fn derived_filename(url: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|e| ProcessorError::invalid("url", e.to_string()))?;
    let last = parsed.path().rsplit('/').next().unwrap_or_default();
    Ok(paths::file_stem(Path::new(last)).to_lowercase())
}

impl Processor for XcodeVersionEmitter {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &XCODE_VERSION_EMITTER
    }

    fn process(&self, _ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: XcodeVersionEmitterInput = env.decode()?;
        if !input.dont_skip {
            ui::info(SKIP_MESSAGE);
            return Ok(Env::new());
        }

        let derived_filename = derived_filename(&input.url)?;
        ui::info(&format!("Derived filename: {}", derived_filename));
        let destination = write_marker(&input.output_filepath, &derived_filename)?;
        ui::info(&format!(
            "Derived filename ({}) written to disk at {}",
            derived_filename,
            destination.display()
        ));
        Env::encode(&XcodeVersionEmitterOutput { derived_filename })
    }
}

// ---------------------------------------------------------------------------

pub struct XcodeBuildNumberEmitter;

static XCODE_BUILD_NUMBER_EMITTER: ProcessorDescriptor = ProcessorDescriptor {
    name: "XcodeBuildNumberEmitter",
    description: "Writes the Xcode build number to a file. Skipped by default.",
    inputs: &[
        optional("dont_skip", "If this evaluates as truthy, do not skip this step."),
        required("build_version", "The build version number for this Xcode release."),
        required(
            "output_filepath",
            "Path to which the build number is written. Environment variables are expanded.",
        ),
    ],
    outputs: &[],
};

#[derive(Deserialize)]
struct XcodeBuildNumberInput {
    #[serde(default, deserialize_with = "de::flag")]
    dont_skip: bool,
    #[serde(deserialize_with = "de::text")]
    build_version: String,
    output_filepath: String,
}

impl Processor for XcodeBuildNumberEmitter {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &XCODE_BUILD_NUMBER_EMITTER
    }

    fn process(&self, _ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: XcodeBuildNumberInput = env.decode()?;
        if !input.dont_skip {
            ui::info(SKIP_MESSAGE);
            return Ok(Env::new());
        }

        let destination = write_marker(&input.output_filepath, &input.build_version)?;
        ui::info(&format!(
            "Xcode build number ({}) written to disk at {}",
            input.build_version,
            destination.display()
        ));
        Ok(Env::new())
    }
}

#[cfg(test)]
mod tests;
