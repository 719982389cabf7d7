//! Version extraction from plain-text sources: config headers, Java
//! properties files, Android NDK `source.properties`, and the clock.

use super::read_file;
use crate::core::descriptor::{ProcessorDescriptor, optional, output, required, with_default};
use crate::core::env::{Env, de};
use crate::core::Processor;
use crate::error::{ProcessorError, Result};
use crate::traits::AppContext;
use crate::ui;
use crate::utils::properties::parse_properties;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct VersionOutput {
    version: String,
}

// ---------------------------------------------------------------------------

pub struct ConfigHeaderVersioner;

static CONFIG_HEADER_VERSIONER: ProcessorDescriptor = ProcessorDescriptor {
    name: "ConfigHeaderVersioner",
    description: "Looks for a version key in a config.h header file.",
    inputs: &[
        required("header_file", "Path to the config.h file in a Makefile directory."),
        with_default(
            "version_key",
            "Key to look for for versioning.",
            "PACKAGE_VERSION",
        ),
    ],
    outputs: &[output("version", "Value of version key.")],
};

#[derive(Deserialize)]
struct ConfigHeaderInput {
    header_file: PathBuf,
    #[serde(deserialize_with = "de::text")]
    version_key: String,
}

/// `#define KEY "1.2.3"` on the first line mentioning the key yields `1.2.3`.
pub fn version_from_header(content: &str, key: &str) -> Result<String> {
    let line = content
        .lines()
        .find(|line| line.contains(key))
        .ok_or_else(|| ProcessorError::NotFound(format!("Version key '{}' not found in file", key)))?;
    ui::verbose(&format!("Version line found: {}", line));

    let token = line.split(' ').nth(2).ok_or_else(|| {
        ProcessorError::Format(format!("Version line has no value: {}", line.trim()))
    })?;
    Ok(token.trim_end().trim_matches('"').to_string())
}

impl Processor for ConfigHeaderVersioner {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &CONFIG_HEADER_VERSIONER
    }

    fn process(&self, _ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: ConfigHeaderInput = env.decode()?;
        ui::verbose(&format!("Version key: {}", input.version_key));
        let content = read_file(&input.header_file)?;
        let version = version_from_header(&content, &input.version_key)?;
        ui::info(&format!("Version found: {}", version));
        Env::encode(&VersionOutput { version })
    }
}

// ---------------------------------------------------------------------------

pub struct DateVersioner;

static DATE_VERSIONER: ProcessorDescriptor = ProcessorDescriptor {
    name: "DateVersioner",
    description: "Places the current local date and time into version.",
    inputs: &[optional(
        "notime",
        "If true, only the current date is provided. Defaults to false.",
    )],
    outputs: &[output("version", "Current date and time as version.")],
};

#[derive(Deserialize)]
struct DateVersionerInput {
    #[serde(default, deserialize_with = "de::flag")]
    notime: bool,
}

pub fn date_version(now: NaiveDateTime, notime: bool) -> String {
    if notime {
        now.format("%Y-%m-%d").to_string()
    } else {
        now.format("%Y-%m-%d_%H-%M-%S").to_string()
    }
}

impl Processor for DateVersioner {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &DATE_VERSIONER
    }

    fn process(&self, _ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: DateVersionerInput = env.decode()?;
        let version = date_version(Local::now().naive_local(), input.notime);
        ui::info(&format!("Version is set to {}", version));
        Env::encode(&VersionOutput { version })
    }
}

// ---------------------------------------------------------------------------

pub struct SQLDeveloperVersioner;

const SQLDEVELOPER_PROPERTIES: &str =
    "Contents/Resources/sqldeveloper/sqldeveloper/bin/version.properties";

static SQLDEVELOPER_VERSIONER: ProcessorDescriptor = ProcessorDescriptor {
    name: "SQLDeveloperVersioner",
    description: "Reads the version.properties file inside SQLDeveloper.app.",
    inputs: &[required(
        "app_path",
        "Path to app to find the version.properties file in.",
    )],
    outputs: &[output("version", "Actual version of app.")],
};

#[derive(Deserialize)]
struct SQLDeveloperInput {
    app_path: PathBuf,
}

impl Processor for SQLDeveloperVersioner {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &SQLDEVELOPER_VERSIONER
    }

    fn process(&self, _ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: SQLDeveloperInput = env.decode()?;
        let path = input.app_path.join(SQLDEVELOPER_PROPERTIES);
        let props = parse_properties(&read_file(&path)?);
        let version = props.get("ver_full").cloned().ok_or_else(|| {
            ProcessorError::NotFound(format!("ver_full not set in {}", path.display()))
        })?;
        ui::info(&format!("Version: {}", version));
        Env::encode(&VersionOutput { version })
    }
}

// ---------------------------------------------------------------------------

pub struct AndroidNDKVersioner;

static ANDROID_NDK_VERSIONER: ProcessorDescriptor = ProcessorDescriptor {
    name: "AndroidNDKVersioner",
    description: "Detects the version of a downloaded Android NDK from source.properties.",
    inputs: &[required("properties_path", "File to parse for version info.")],
    outputs: &[
        output("release_num", "Release of download."),
        output("version", "Version of download."),
    ],
};

#[derive(Deserialize)]
struct AndroidNDKInput {
    properties_path: PathBuf,
}

#[derive(Serialize)]
struct AndroidNDKOutput {
    release_num: String,
    version: String,
}

/// `Pkg.Revision = 21.0.6113669` → `21.0.6113669`.
pub fn ndk_revision(content: &str) -> Result<String> {
    let tokens = shlex::split(content)
        .ok_or_else(|| ProcessorError::Format("source.properties has unbalanced quoting".to_string()))?;
    let idx = tokens
        .iter()
        .position(|t| t == "Pkg.Revision")
        .ok_or_else(|| ProcessorError::NotFound("Pkg.Revision not present".to_string()))?;
    tokens
        .get(idx + 2)
        .and_then(|t| t.split_whitespace().last())
        .map(str::to_string)
        .ok_or_else(|| ProcessorError::Format("Pkg.Revision has no value".to_string()))
}

/// Release is the last `-` component of the containing directory
/// (`android-ndk-r21` → `r21`).
pub fn ndk_release(path: &Path) -> String {
    path.parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy())
        .and_then(|name| name.rsplit('-').next().map(str::to_string))
        .unwrap_or_default()
}

impl Processor for AndroidNDKVersioner {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &ANDROID_NDK_VERSIONER
    }

    fn process(&self, _ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: AndroidNDKInput = env.decode()?;
        if !input.properties_path.is_file() {
            return Err(ProcessorError::NotFound(format!(
                "{} doesn't exist",
                input.properties_path.display()
            )));
        }
        let version = ndk_revision(&read_file(&input.properties_path)?)?;
        let release_num = ndk_release(&input.properties_path);
        ui::info(&format!("Android NDK {} ({})", version, release_num));
        Env::encode(&AndroidNDKOutput {
            release_num,
            version,
        })
    }
}
