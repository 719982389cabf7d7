use super::apple_auth::{DOWNLOAD_COOKIES_FILE, LIST_DOWNLOADS_FILE, LOGIN_COOKIES_FILE, curl_path};
use crate::core::Processor;
use crate::core::descriptor::{ProcessorDescriptor, optional, output, required, with_default};
use crate::core::env::{Env, de};
use crate::error::{ProcessorError, Result};
use crate::net::curl;
use crate::traits::AppContext;
use crate::ui;
use crate::utils::{paths, regex_cache, versioning};
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const BETA_DOWNLOAD_PAGE: &str = "https://developer.apple.com/download/";
const BETA_LINK_BASE: &str = "https://developer.apple.com/";
const BETA_LINK_PATTERN: &str = r#"<a href=["'](.*.xip)"#;
const DOWNLOAD_BASE_URL: &str = "https://download.developer.apple.com";
const DATE_PUBLISHED_FORMAT: &str = "%m/%d/%y %H:%M";

pub struct AppleURLSearcher;

static APPLE_URL_SEARCHER: ProcessorDescriptor = ProcessorDescriptor {
    name: "AppleURLSearcher",
    description: "Searches the Apple developer downloads for a matching Xcode URL.",
    inputs: &[
        required(
            "re_pattern",
            "Regular expression matched against download URLs. Ignored if BETA is set.",
        ),
        required("RECIPE_CACHE_DIR", "Recipe cache directory."),
        with_default(
            "result_output_var_name",
            "Name of the output variable receiving the URL.",
            "match",
        ),
        optional("URL", "If set, passed through as the result."),
        optional("BETA", "If truthy, search the beta download page instead."),
        optional("CURL_PATH", "Path to curl binary. Defaults to the configured curl."),
    ],
    outputs: &[output(
        "result_output_var_name",
        "The matched URL, under the name given by 'result_output_var_name'.",
    )],
};

#[derive(Deserialize)]
#[allow(non_snake_case)]
struct SearcherInput {
    #[serde(deserialize_with = "de::text")]
    re_pattern: String,
    RECIPE_CACHE_DIR: PathBuf,
    result_output_var_name: String,
    #[serde(default, deserialize_with = "de::opt_text")]
    URL: Option<String>,
    #[serde(default, deserialize_with = "de::flag")]
    BETA: bool,
    #[serde(default, deserialize_with = "de::opt_text")]
    CURL_PATH: Option<String>,
}

#[derive(Deserialize)]
struct DownloadList {
    downloads: Vec<DownloadEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DownloadEntry {
    date_published: String,
    #[serde(default)]
    files: Vec<DownloadFile>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DownloadFile {
    remote_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub published: NaiveDateTime,
    pub filename: String,
    pub url: String,
}

/// Matching files from a `listDownloads` document.
pub fn matching_candidates(list_json: &str, pattern: &str) -> Result<Vec<Candidate>> {
    let re = regex_cache::compile_input("re_pattern", pattern)?;
    let list: DownloadList = serde_json::from_str(list_json)?;

    let mut candidates = Vec::new();
    for entry in &list.downloads {
        for file in &entry.files {
            let url = format!("{}{}", DOWNLOAD_BASE_URL, file.remote_path);
            if !re.is_match(&url) {
                continue;
            }
            let published = NaiveDateTime::parse_from_str(&entry.date_published, DATE_PUBLISHED_FORMAT)
                .map_err(|e| {
                    ProcessorError::Format(format!(
                        "datePublished '{}': {}",
                        entry.date_published, e
                    ))
                })?;
            let path = file.remote_path.split(['?', '#']).next().unwrap_or_default();
            let basename = path.rsplit('/').next().unwrap_or_default();
            candidates.push(Candidate {
                published,
                filename: paths::file_stem(Path::new(basename)),
                url,
            });
        }
    }
    Ok(candidates)
}

/// Newest publication wins; equal dates fall back to the higher version in
/// the file name.
pub fn select_newest(candidates: &[Candidate]) -> Option<&Candidate> {
    candidates.iter().max_by(|a, b| {
        a.published
            .cmp(&b.published)
            .then_with(|| versioning::compare_versions(&a.filename, &b.filename))
    })
}

/// Last capture group of the beta download link on the downloads page.
pub fn beta_link(page: &str) -> Result<String> {
    let re = regex_cache::get_cached_regex(BETA_LINK_PATTERN)
        .map_err(|e| ProcessorError::Other(e.to_string()))?;
    let caps = re
        .captures(page)
        .ok_or_else(|| ProcessorError::NotFound(format!("No match found on URL: {}", BETA_DOWNLOAD_PAGE)))?;
    let group = (1..caps.len())
        .rev()
        .find_map(|i| caps.get(i))
        .or_else(|| caps.get(0))
        .map(|m| m.as_str())
        .unwrap_or_default();
    Ok(format!("{}{}", BETA_LINK_BASE, group))
}

fn search_beta(ctx: &AppContext, input: &SearcherInput, download_dir: &Path) -> Result<String> {
    ui::info("Beta flag is set, searching Apple downloads URL...");
    let options = [
        "--cookie".to_string(),
        download_dir.join(LOGIN_COOKIES_FILE).to_string_lossy().into_owned(),
        "--cookie-jar".to_string(),
        download_dir.join(DOWNLOAD_COOKIES_FILE).to_string_lossy().into_owned(),
    ];
    let page = curl::fetch_text(
        ctx,
        &curl_path(ctx, input.CURL_PATH.clone()),
        BETA_DOWNLOAD_PAGE,
        &options,
    )?;

    paths::ensure_dir(download_dir)?;
    let saved = download_dir.join("url_text.txt");
    fs::write(&saved, &page).map_err(|e| ProcessorError::io(&saved, e))?;

    let url = beta_link(&page)?;
    ui::info(&format!("New fixed URL: {}", url));
    Ok(url)
}

fn search_download_list(input: &SearcherInput, download_dir: &Path) -> Result<String> {
    ui::info("Beta flag not set, searching More downloads list...");
    let list_path = download_dir.join(LIST_DOWNLOADS_FILE);
    if !list_path.exists() {
        return Err(ProcessorError::NotFound(
            "Missing the download data from AppleCookieDownloader".to_string(),
        ));
    }
    let content = fs::read_to_string(&list_path).map_err(|e| ProcessorError::io(&list_path, e))?;

    let mut candidates = matching_candidates(&content, &input.re_pattern)?;
    candidates.sort_by(|a, b| a.published.cmp(&b.published));
    ui::verbose(&format!(
        "Sorted list of possible filenames: {:?}",
        candidates.iter().map(|c| c.filename.as_str()).collect::<Vec<_>>()
    ));

    let chosen = select_newest(&candidates)
        .ok_or_else(|| ProcessorError::NotFound("No match found".to_string()))?;
    ui::info(&format!("Found matching item: {}", chosen.filename));
    Ok(chosen.url.clone())
}

impl Processor for AppleURLSearcher {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &APPLE_URL_SEARCHER
    }

    fn process(&self, ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: SearcherInput = env.decode()?;
        let download_dir = paths::downloads_dir(&input.RECIPE_CACHE_DIR);

        let url = match &input.URL {
            Some(url) => url.clone(),
            None if input.BETA => search_beta(ctx, &input, &download_dir)?,
            None => search_download_list(&input, &download_dir)?,
        };

        ui::info(&format!("Full URL: {}", url));
        let mut out = Env::new();
        out.insert(input.result_output_var_name.clone(), url);
        Ok(out)
    }
}
