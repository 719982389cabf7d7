//! Scripted collaborators for unit tests.

use crate::config::Settings;
use crate::error::{ProcessorError, Result};
use crate::exec::{CommandOutput, CommandSpec};
use crate::net::{FetchRequest, FetchResponse};
use crate::traits::{AppContext, CommandRunner, Fetcher};
use std::cell::RefCell;
use std::rc::Rc;

pub type CallLog<T> = Rc<RefCell<Vec<T>>>;

/// Answers requests from a fixed URL table.
#[derive(Default)]
pub struct MockFetcher {
    routes: Vec<(String, FetchResponse)>,
    requests: CallLog<FetchRequest>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 200 response with `body`.
    pub fn respond(self, url: &str, body: &str) -> Self {
        let response = FetchResponse {
            status: 200,
            final_url: url.to_string(),
            headers: Default::default(),
            body: body.to_string(),
        };
        self.respond_with(url, response)
    }

    pub fn respond_with(mut self, url: &str, response: FetchResponse) -> Self {
        self.routes.push((url.to_string(), response));
        self
    }

    pub fn requests(&self) -> CallLog<FetchRequest> {
        Rc::clone(&self.requests)
    }
}

impl Fetcher for MockFetcher {
    fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        self.requests.borrow_mut().push(request.clone());
        self.routes
            .iter()
            .find(|(url, _)| *url == request.url)
            .map(|(_, response)| response.clone())
            .ok_or_else(|| ProcessorError::FetchFailed(format!("no mock route for {}", request.url)))
    }
}

type Handler = Box<dyn Fn(&CommandSpec) -> Result<CommandOutput>>;

/// Dispatches on the program's file name; unscripted programs succeed with
/// no output.
#[derive(Default)]
pub struct ScriptedRunner {
    handlers: Vec<(String, Handler)>,
    calls: CallLog<CommandSpec>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(mut self, program: &str, handler: F) -> Self
    where
        F: Fn(&CommandSpec) -> Result<CommandOutput> + 'static,
    {
        self.handlers.push((program.to_string(), Box::new(handler)));
        self
    }

    pub fn calls(&self) -> CallLog<CommandSpec> {
        Rc::clone(&self.calls)
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.calls.borrow_mut().push(spec.clone());
        let name = spec.program_name();
        match self.handlers.iter().find(|(program, _)| *program == name) {
            Some((_, handler)) => handler(spec),
            None => Ok(ok("")),
        }
    }
}

pub fn ok(stdout: &str) -> CommandOutput {
    CommandOutput {
        code: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

pub fn ok_with_stderr(stdout: &str, stderr: &str) -> CommandOutput {
    CommandOutput {
        stderr: stderr.to_string(),
        ..ok(stdout)
    }
}

pub fn exit(code: i32, stderr: &str) -> CommandOutput {
    CommandOutput {
        code: Some(code),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

pub fn context(fetcher: MockFetcher, runner: ScriptedRunner) -> AppContext {
    AppContext::new(Settings::default(), Box::new(fetcher), Box::new(runner))
}

/// Context for processors that touch neither the network nor subprocesses.
pub fn offline() -> AppContext {
    context(MockFetcher::new(), ScriptedRunner::new())
}
