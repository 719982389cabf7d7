//! HTTP access for the URL providers.

pub mod curl;

use crate::config::Settings;
use crate::error::{ProcessorError, Result};
use crate::traits::{AppContext, Fetcher};
use crate::ui;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const MAX_REDIRECTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub basic_auth: Option<(String, String)>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            basic_auth: None,
        }
    }

    pub fn head(url: impl Into<String>) -> Self {
        Self {
            method: Method::Head,
            ..Self::get(url)
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn basic_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = Some((user.into(), password.into()));
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    /// URL after following redirects.
    pub final_url: String,
    /// Header names lower-cased.
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking `reqwest` client configured from [`Settings`].
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.http_timeout)
            .user_agent(settings.user_agent.clone())
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| ProcessorError::FetchFailed(format!("HTTP client setup failed: {}", e)))?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Head => self.client.head(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some((user, password)) = &request.basic_auth {
            builder = builder.basic_auth(user, Some(password));
        }

        let resp = builder
            .send()
            .map_err(|e| ProcessorError::FetchFailed(format!("Network error: {}", e)))?;

        let status = resp.status().as_u16();
        let final_url = resp.url().to_string();
        let headers = resp
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_ascii_lowercase(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = match request.method {
            Method::Head => String::new(),
            Method::Get => resp
                .text()
                .map_err(|e| ProcessorError::FetchFailed(format!("Reading body failed: {}", e)))?,
        };

        Ok(FetchResponse {
            status,
            final_url,
            headers,
            body,
        })
    }
}

/// GET a URL and return its body; any non-2xx status is an error.
pub fn fetch_text(ctx: &AppContext, url: &str) -> Result<String> {
    ui::verbose(&format!("Fetching {}", url));
    let resp = ctx.fetcher.fetch(&FetchRequest::get(url))?;
    if !resp.is_success() {
        return Err(ProcessorError::FetchFailed(format!(
            "{} returned HTTP {}",
            url, resp.status
        )));
    }
    Ok(resp.body)
}

/// Read a document that may be given as a local path or as a URL.
pub fn load_document(ctx: &AppContext, location: &str) -> Result<String> {
    if location.contains("http") {
        fetch_text(ctx, location)
    } else {
        let path = Path::new(location);
        fs::read_to_string(path).map_err(|e| ProcessorError::io(path, e))
    }
}
