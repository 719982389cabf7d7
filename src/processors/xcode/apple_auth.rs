//! Apple developer portal login: the login payload file and the cookie
//! exchange that yields the downloads list.

use crate::core::Processor;
use crate::core::descriptor::{ProcessorDescriptor, optional, output, required};
use crate::core::env::{Env, de};
use crate::error::{ProcessorError, Result};
use crate::exec::{CommandSpec, StderrPolicy, run_checked};
use crate::net::curl::{self, CurlDownload};
use crate::traits::AppContext;
use crate::ui;
use crate::utils::paths;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const AUTH_URL: &str = "https://idmsa.apple.com/IDMSWebAuth/authenticate";
pub const LIST_DOWNLOADS_URL: &str =
    "https://developer.apple.com/services-account/QH65B2/downloadws/listDownloads.action";

pub const LOGIN_DATA_FILE: &str = "login_data";
pub const LOGIN_COOKIES_FILE: &str = "login_cookies";
pub const DOWNLOAD_COOKIES_FILE: &str = "download_cookies";
pub const LIST_DOWNLOADS_FILE: &str = "listDownloads";
const LIST_DOWNLOADS_GZ: &str = "listDownloads.gz";

/// Resolve `CURL_PATH`, falling back to the configured curl.
pub(super) fn curl_path(ctx: &AppContext, configured: Option<String>) -> PathBuf {
    configured
        .map(PathBuf::from)
        .unwrap_or_else(|| ctx.tool("curl"))
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ProcessorError::io(path, e)),
    }
}

// ---------------------------------------------------------------------------

pub struct AppleDataGatherer;

static APPLE_DATA_GATHERER: ProcessorDescriptor = ProcessorDescriptor {
    name: "AppleDataGatherer",
    description: "Writes the Apple developer portal login payload to a file in the downloads directory.",
    inputs: &[
        required("apple_id", "AppleID that can log into the Apple developer portal."),
        required("appID_key", "App ID key to log into."),
        required("RECIPE_CACHE_DIR", "Recipe cache directory."),
        optional("password", "Password for the AppleID."),
        optional(
            "password_file",
            "A file to read the password from. Takes precedence over 'password'.",
        ),
    ],
    outputs: &[output("data_pathname", "Path to the data file.")],
};

#[derive(Deserialize)]
#[allow(non_snake_case)]
struct DataGathererInput {
    #[serde(deserialize_with = "de::text")]
    apple_id: String,
    #[serde(deserialize_with = "de::text")]
    appID_key: String,
    RECIPE_CACHE_DIR: PathBuf,
    #[serde(default, deserialize_with = "de::opt_text")]
    password: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    password_file: Option<String>,
}

#[derive(Serialize)]
struct DataGathererOutput {
    data_pathname: String,
}

pub fn login_payload(apple_id: &str, app_id_key: &str, password: &str) -> String {
    format!(
        "appleId={}&appIdKey={}&accountPassword={}",
        urlencoding::encode(apple_id),
        app_id_key,
        password
    )
}

impl Processor for AppleDataGatherer {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &APPLE_DATA_GATHERER
    }

    fn process(&self, _ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: DataGathererInput = env.decode()?;

        let password = match (&input.password_file, input.password) {
            (Some(file), _) => {
                let path = Path::new(file);
                let content = fs::read_to_string(path).map_err(|e| ProcessorError::io(path, e))?;
                content.trim_end_matches(['\r', '\n']).to_string()
            }
            (None, Some(password)) => password,
            (None, None) => {
                return Err(ProcessorError::invalid(
                    "password",
                    "provide either a password or a password_file",
                ));
            }
        };

        let download_dir = paths::downloads_dir(&input.RECIPE_CACHE_DIR);
        paths::ensure_dir(&download_dir)?;
        let data_pathname = download_dir.join(LOGIN_DATA_FILE);

        ui::info("Writing data to file");
        let payload = login_payload(&input.apple_id, &input.appID_key, &password);
        fs::write(&data_pathname, payload).map_err(|e| ProcessorError::io(&data_pathname, e))?;

        Env::encode(&DataGathererOutput {
            data_pathname: data_pathname.to_string_lossy().into_owned(),
        })
    }
}

// ---------------------------------------------------------------------------

pub struct AppleCookieDownloader;

static APPLE_COOKIE_DOWNLOADER: ProcessorDescriptor = ProcessorDescriptor {
    name: "AppleCookieDownloader",
    description: "Logs into the Apple developer portal with curl and downloads the list of available downloads.",
    inputs: &[
        required("login_data", "Path to login data file."),
        required("RECIPE_CACHE_DIR", "Recipe cache directory."),
        optional("CURL_PATH", "Path to curl binary. Defaults to the configured curl."),
    ],
    outputs: &[output("download_cookies", "Path to the download cookies.")],
};

#[derive(Deserialize)]
#[allow(non_snake_case)]
struct CookieDownloaderInput {
    login_data: String,
    RECIPE_CACHE_DIR: PathBuf,
    #[serde(default, deserialize_with = "de::opt_text")]
    CURL_PATH: Option<String>,
}

#[derive(Serialize)]
struct CookieDownloaderOutput {
    download_cookies: String,
}

impl Processor for AppleCookieDownloader {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &APPLE_COOKIE_DOWNLOADER
    }

    fn process(&self, ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: CookieDownloaderInput = env.decode()?;
        let curl_path = curl_path(ctx, input.CURL_PATH);

        let download_dir = paths::downloads_dir(&input.RECIPE_CACHE_DIR);
        paths::ensure_dir(&download_dir)?;
        let login_cookies = download_dir.join(LOGIN_COOKIES_FILE);
        let download_cookies = download_dir.join(DOWNLOAD_COOKIES_FILE);
        let list_gz = download_dir.join(LIST_DOWNLOADS_GZ);
        let list = download_dir.join(LIST_DOWNLOADS_FILE);

        ui::info("Getting login cookie");
        let login = CurlDownload::new(AUTH_URL, "-").options([
            "--request".to_string(),
            "POST".to_string(),
            "--data".to_string(),
            format!("@{}", input.login_data),
            "--cookie-jar".to_string(),
            login_cookies.to_string_lossy().into_owned(),
        ]);
        curl::download(ctx, &curl_path, &login, true)?;

        ui::info("Getting download cookie");
        remove_if_present(&list_gz)?;
        let listing = CurlDownload::new(LIST_DOWNLOADS_URL, list_gz.to_string_lossy())
            .header("Content-length", "0")
            .options([
                "--request".to_string(),
                "POST".to_string(),
                "--cookie".to_string(),
                login_cookies.to_string_lossy().into_owned(),
                "--cookie-jar".to_string(),
                download_cookies.to_string_lossy().into_owned(),
            ]);
        let headers = curl::download(ctx, &curl_path, &listing, true)?;
        ui::verbose(&format!("listDownloads HTTP {}", headers.http_result_code));

        let payload = fs::read(&list_gz).map_err(|_| {
            ProcessorError::NotFound(format!("Unable to load {} file", LIST_DOWNLOADS_GZ))
        })?;
        // a JSON body is the portal's error reply, not the gzipped list
        if serde_json::from_slice::<serde_json::Value>(&payload).is_ok() {
            return Err(ProcessorError::Other(
                "Unable to list downloads. Check your Apple credentials.".to_string(),
            ));
        }

        ui::info("Unzipping download list");
        remove_if_present(&list)?;
        let gunzip = CommandSpec::new(ctx.tool("gunzip"))
            .path_arg(&list_gz)
            .current_dir(&download_dir);
        run_checked(ctx, &gunzip, StderrPolicy::Fatal)?;

        Env::encode(&CookieDownloaderOutput {
            download_cookies: download_cookies.to_string_lossy().into_owned(),
        })
    }
}

#[cfg(test)]
mod tests;
