//! `curl` invocations for endpoints that need cookie jars.
//!
//! Apple's developer portal authenticates through cookies that curl keeps on
//! disk, so these requests run the curl binary instead of the HTTP client.

use crate::error::{ProcessorError, Result};
use crate::exec::{CommandSpec, StderrPolicy, run_checked};
use crate::traits::AppContext;
use crate::ui;
use std::collections::BTreeMap;
use std::path::Path;

const REDIRECT_CODES: [&str; 5] = ["301", "302", "303", "307", "308"];
const NO_RESULT_CODE: &str = "000";

/// A download whose response headers are dumped to stdout.
#[derive(Debug, Clone, Default)]
pub struct CurlDownload {
    pub url: String,
    /// Output file, or `-` for stdout.
    pub output: String,
    pub headers: Vec<(String, String)>,
    pub options: Vec<String>,
}

impl CurlDownload {
    pub fn new(url: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            output: output.into(),
            ..Self::default()
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.extend(options.into_iter().map(Into::into));
        self
    }

    pub fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = [
            "--silent",
            "--show-error",
            "--no-buffer",
            "--fail",
            "--dump-header",
            "-",
            "--speed-time",
            "30",
            "--location",
            "--url",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        args.push(self.url.clone());
        args.push("--output".to_string());
        args.push(self.output.clone());

        for (name, value) in &self.headers {
            args.push("--header".to_string());
            args.push(format!("{}: {}", name, value));
        }
        args.extend(self.options.iter().cloned());
        args
    }
}

/// Headers of the final (non-redirect) response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHeaders {
    pub http_result_code: String,
    pub http_result_description: String,
    /// Field names lower-cased.
    pub fields: BTreeMap<String, String>,
}

impl Default for ResponseHeaders {
    fn default() -> Self {
        Self {
            http_result_code: NO_RESULT_CODE.to_string(),
            http_result_description: String::new(),
            fields: BTreeMap::new(),
        }
    }
}

/// Parse curl's `--dump-header` output. Header blocks belonging to redirects
/// are discarded; parsing stops at the blank line closing the first
/// non-redirect block.
pub fn parse_header_dump(dump: &str) -> ResponseHeaders {
    let mut headers = ResponseHeaders::default();

    for raw in dump.lines() {
        let line = raw.trim_end_matches(['\r', '\n']);

        if line.starts_with("HTTP/") {
            let mut parts = line.splitn(3, char::is_whitespace);
            let _version = parts.next();
            if let Some(code) = parts.next() {
                headers.http_result_code = code.to_string();
            }
            if let Some(description) = parts.next() {
                headers.http_result_description = description.trim().to_string();
            }
        } else if line.contains(": ") {
            let (name, value) = line
                .split_once(char::is_whitespace)
                .unwrap_or((line, ""));
            headers.fields.insert(
                name.trim_end_matches(':').to_ascii_lowercase(),
                value.trim_start().to_string(),
            );
        } else if line.is_empty() {
            if REDIRECT_CODES.contains(&headers.http_result_code.as_str()) {
                headers = ResponseHeaders::default();
            } else {
                break;
            }
        }
    }

    headers
}

/// Run a curl download and return the final response headers. A non-zero
/// curl exit is [`ProcessorError::CurlFailed`] unless `allow_failure`.
pub fn download(
    ctx: &AppContext,
    curl_path: &Path,
    request: &CurlDownload,
    allow_failure: bool,
) -> Result<ResponseHeaders> {
    let spec = CommandSpec::new(curl_path).args(request.args());
    ui::verbose(&format!("Running: {}", spec));
    let output = ctx.runner.run(&spec)?;

    if !output.success() && !allow_failure {
        return Err(ProcessorError::CurlFailed {
            reason: curl_error_message(&output.stderr),
            code: output.code.unwrap_or(-1),
        });
    }

    Ok(parse_header_dump(&output.stdout))
}

/// Fetch a page body through curl (following redirects, accepting
/// compressed responses).
pub fn fetch_text(ctx: &AppContext, curl_path: &Path, url: &str, options: &[String]) -> Result<String> {
    let spec = CommandSpec::new(curl_path)
        .args(["--location", "--compressed"])
        .args(options.iter().cloned())
        .arg(url);
    run_checked(ctx, &spec, StderrPolicy::Warn)
        .map(|output| output.stdout)
        .map_err(|e| ProcessorError::FetchFailed(format!("Could not retrieve URL {}: {}", url, e)))
}

/// curl prints `curl: (22) message`; keep the message part.
fn curl_error_message(stderr: &str) -> String {
    let stderr = stderr.trim_end();
    let mut parts = stderr.splitn(3, char::is_whitespace);
    let _ = (parts.next(), parts.next());
    parts.next().unwrap_or_default().trim().to_string()
}
