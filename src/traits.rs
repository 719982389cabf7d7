//! Collaborator traits for dependency injection and testability
//!
//! Processors never talk to the network or spawn processes directly: they go
//! through the [`Fetcher`] and [`CommandRunner`] held by an [`AppContext`],
//! so unit tests can substitute scripted implementations.

use crate::config::Settings;
use crate::error::Result;
use crate::exec::{CommandOutput, CommandSpec, SystemRunner};
use crate::net::{FetchRequest, FetchResponse, HttpFetcher};
use std::path::PathBuf;

/// Performs HTTP requests.
pub trait Fetcher {
    fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse>;
}

/// Runs external programs from an argument vector, never through a shell.
pub trait CommandRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;
}

/// Everything a processor may use besides its input env.
pub struct AppContext {
    pub settings: Settings,
    pub fetcher: Box<dyn Fetcher>,
    pub runner: Box<dyn CommandRunner>,
}

impl AppContext {
    pub fn new(
        settings: Settings,
        fetcher: Box<dyn Fetcher>,
        runner: Box<dyn CommandRunner>,
    ) -> Self {
        Self {
            settings,
            fetcher,
            runner,
        }
    }

    /// Context backed by the real HTTP client and process spawner.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let fetcher = HttpFetcher::new(&settings)?;
        let runner = SystemRunner::new(settings.command_timeout);
        Ok(Self::new(settings, Box::new(fetcher), Box::new(runner)))
    }

    pub fn tool(&self, name: &str) -> PathBuf {
        self.settings.tool(name)
    }
}
