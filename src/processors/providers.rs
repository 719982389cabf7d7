//! Download URL providers backed by vendor HTTP endpoints.

use crate::core::Processor;
use crate::core::descriptor::{ProcessorDescriptor, output, required, with_default};
use crate::core::env::{Env, de};
use crate::error::{ProcessorError, Result};
use crate::net::{FetchRequest, fetch_text};
use crate::traits::AppContext;
use crate::ui;
use crate::utils::{versioning, xml};
use serde::{Deserialize, Serialize};

pub const ACROLINX_URL: &str = "https://download.acrolinx.com:1443/api/deliverablePackages/575b1d0d401ae30b00e90f40/download/latest?preserve_credentials=true&proxy=true";
pub const ADOPTOPENJDK_API_URL: &str = "https://api.adoptopenjdk.net/v2/info/releases/";
pub const INTELLIJ_VERSION_URL: &str = "https://www.jetbrains.com/updates/updates.xml";
const INTELLIJ_DOWNLOAD_BASE: &str = "https://download.jetbrains.com/idea/";
const INTELLIJ_PRODUCT: &str = "IntelliJ IDEA";

#[derive(Serialize)]
struct UrlOutput {
    url: String,
}

// ---------------------------------------------------------------------------

pub struct AcrolinxURLProvider;

static ACROLINX_URL_PROVIDER: ProcessorDescriptor = ProcessorDescriptor {
    name: "AcrolinxURLProvider",
    description: "Provides a download URL for Acrolinx.",
    inputs: &[
        required("username", "Username for authentication."),
        required("password", "Password for authentication."),
    ],
    outputs: &[output("url", "Download URL for Acrolinx.")],
};

#[derive(Deserialize)]
struct AcrolinxInput {
    #[serde(deserialize_with = "de::text")]
    username: String,
    #[serde(deserialize_with = "de::text")]
    password: String,
}

impl Processor for AcrolinxURLProvider {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &ACROLINX_URL_PROVIDER
    }

    fn process(&self, ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: AcrolinxInput = env.decode()?;
        let request = FetchRequest::head(ACROLINX_URL).basic_auth(input.username, input.password);
        let resp = ctx.fetcher.fetch(&request)?;

        if resp.final_url.is_empty() || resp.final_url == ACROLINX_URL {
            ui::verbose(&format!("Headers: {:?}", resp.headers));
            return Err(ProcessorError::NotFound(
                "Response was not redirected to the Acrolinx download URL. Check your username and password."
                    .to_string(),
            ));
        }

        ui::info(&format!("Found URL: {}", resp.final_url));
        Env::encode(&UrlOutput {
            url: resp.final_url,
        })
    }
}

// ---------------------------------------------------------------------------

pub struct AdoptOpenJDKURLProvider;

static ADOPTOPENJDK_URL_PROVIDER: ProcessorDescriptor = ProcessorDescriptor {
    name: "AdoptOpenJDKURLProvider",
    description: "Provides a version, checksum and download URL for AdoptOpenJDK.",
    inputs: &[
        required("jdk_version", "Version of JDK to fetch."),
        with_default("jdk_type", "Fetch 'jdk' or 'jre'.", "jdk"),
        with_default("jvm_type", "Fetch a 'hotspot' or 'openj9' JVM target.", "hotspot"),
        with_default("binary_type", "Fetch a 'pkg' or 'tgz' download.", "pkg"),
        with_default("release", "Fetch a specific release.", "latest"),
        with_default("api_url", "Base URL of the releases API.", ADOPTOPENJDK_API_URL),
    ],
    outputs: &[
        output("version", "Version of the product."),
        output("url", "Download URL."),
        output("checksum", "Checksum of the targeted product."),
    ],
};

#[derive(Deserialize)]
struct AdoptOpenJDKInput {
    #[serde(deserialize_with = "de::text")]
    jdk_version: String,
    jdk_type: String,
    jvm_type: String,
    binary_type: String,
    #[serde(deserialize_with = "de::text")]
    release: String,
    api_url: String,
}

#[derive(Serialize)]
struct AdoptOpenJDKOutput {
    version: String,
    url: String,
    checksum: String,
}

#[derive(Deserialize)]
struct ReleaseInfo {
    binaries: Vec<ReleaseBinary>,
}

#[derive(Deserialize)]
struct ReleaseBinary {
    binary_link: Option<String>,
    checksum_link: Option<String>,
    installer_link: Option<String>,
    installer_checksum_link: Option<String>,
    version_data: VersionData,
}

#[derive(Deserialize)]
struct VersionData {
    semver: String,
}

fn one_of(key: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(ProcessorError::invalid(
            key,
            format!("can only be {}", allowed.iter().map(|a| format!("'{}'", a)).collect::<Vec<_>>().join(" or ")),
        ))
    }
}

pub fn adoptopenjdk_query_url(
    api_url: &str,
    jdk_version: &str,
    jvm_type: &str,
    jdk_type: &str,
    release: &str,
) -> String {
    format!(
        "{}openjdk{}?os=mac&openjdk_impl={}&type={}&release={}",
        api_url,
        urlencoding::encode(jdk_version),
        urlencoding::encode(jvm_type),
        urlencoding::encode(jdk_type),
        urlencoding::encode(release)
    )
}

impl Processor for AdoptOpenJDKURLProvider {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &ADOPTOPENJDK_URL_PROVIDER
    }

    fn process(&self, ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: AdoptOpenJDKInput = env.decode()?;
        one_of("jvm_type", &input.jvm_type, &["hotspot", "openj9"])?;
        one_of("jdk_type", &input.jdk_type, &["jdk", "jre"])?;
        one_of("binary_type", &input.binary_type, &["pkg", "tgz"])?;

        let api_url = adoptopenjdk_query_url(
            &input.api_url,
            &input.jdk_version,
            &input.jvm_type,
            &input.jdk_type,
            &input.release,
        );
        ui::info(&format!("Query URL: {}", api_url));

        let info: ReleaseInfo = serde_json::from_str(&fetch_text(ctx, &api_url)?)?;
        let binary = info
            .binaries
            .into_iter()
            .next()
            .ok_or_else(|| ProcessorError::NotFound(format!("No binaries listed at {}", api_url)))?;

        let (url, checksum_url) = match input.binary_type.as_str() {
            "pkg" => (binary.installer_link, binary.installer_checksum_link),
            _ => (binary.binary_link, binary.checksum_link),
        };
        let missing = |field: &str| {
            ProcessorError::NotFound(format!("Release has no {} {}", input.binary_type, field))
        };
        let url = url.ok_or_else(|| missing("download link"))?;
        let checksum_url = checksum_url.ok_or_else(|| missing("checksum link"))?;

        let version = binary.version_data.semver;
        ui::info(&format!("Version: {}", version));

        let checksum = fetch_text(ctx, &checksum_url)?
            .split_whitespace()
            .next()
            .map(str::to_string)
            .ok_or_else(|| ProcessorError::Format(format!("Empty checksum file at {}", checksum_url)))?;
        ui::info(&format!("checksum: {}", checksum));
        ui::info(&format!("Found URL {}", url));

        Env::encode(&AdoptOpenJDKOutput {
            version,
            url,
            checksum,
        })
    }
}

// ---------------------------------------------------------------------------

pub struct IntellijURLProvider;

static INTELLIJ_URL_PROVIDER: ProcessorDescriptor = ProcessorDescriptor {
    name: "IntellijURLProvider",
    description: "Provides URL and version for the latest release of IntelliJ IDEA.",
    inputs: &[
        with_default("version_url", "Location of the JetBrains updates feed.", INTELLIJ_VERSION_URL),
        with_default(
            "edition",
            "Either \"C\" for Community or \"U\" for Ultimate edition.",
            "C",
        ),
    ],
    outputs: &[
        output("url", "URL to the latest release of IntelliJ IDEA."),
        output("version", "Version of that release."),
    ],
};

#[derive(Deserialize)]
struct IntellijInput {
    version_url: String,
    edition: String,
}

#[derive(Serialize)]
struct IntellijOutput {
    url: String,
    version: String,
}

/// Highest `build` version across the release channels of the IntelliJ IDEA
/// product in a JetBrains updates feed.
pub fn latest_intellij_version(feed: &str) -> Result<String> {
    let doc = xml::parse(feed, "updates.xml")?;
    let root = doc.root_element();
    let product = xml::children_named(root, "product")
        .find(|p| p.attribute("name") == Some(INTELLIJ_PRODUCT))
        .or_else(|| xml::first_child(root, "product"))
        .ok_or_else(|| ProcessorError::NotFound("No product in updates feed".to_string()))?;

    let versions: Vec<&str> = xml::children_named(product, "channel")
        .filter(|channel| channel.attribute("status") == Some("release"))
        .flat_map(|channel| xml::children_named(channel, "build"))
        .filter_map(|build| build.attribute("version"))
        .collect();

    versioning::max_by_version(&versions, |v| *v)
        .map(|v| v.to_string())
        .ok_or_else(|| ProcessorError::NotFound("No release build in updates feed".to_string()))
}

impl Processor for IntellijURLProvider {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &INTELLIJ_URL_PROVIDER
    }

    fn process(&self, ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: IntellijInput = env.decode()?;
        let feed = fetch_text(ctx, &input.version_url).map_err(|e| {
            ProcessorError::FetchFailed(format!("Can't download {}: {}", input.version_url, e))
        })?;
        let version = latest_intellij_version(&feed)?;
        let url = format!("{}ideaI{}-{}.dmg", INTELLIJ_DOWNLOAD_BASE, input.edition, version);
        ui::info(&format!("URL: {}", url));
        Env::encode(&IntellijOutput { url, version })
    }
}

#[cfg(test)]
mod tests;
