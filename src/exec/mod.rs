//! Subprocess plumbing shared by every processor that shells out.

mod command_exec;

pub use command_exec::SystemRunner;

use crate::error::{ProcessorError, Result};
use crate::traits::AppContext;
use crate::ui;
use std::fmt;
use std::path::{Path, PathBuf};

/// A program invocation as an argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy())
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Program file name, used to match invocations in logs and tests.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.to_string_lossy().into_owned())
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            match shlex::try_quote(arg) {
                Ok(quoted) => write!(f, " {}", quoted)?,
                Err(_) => write!(f, " {:?}", arg)?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// What to do with stderr output from a command that exited with 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StderrPolicy {
    /// Any stderr output fails the step.
    Fatal,
    /// Stderr lines are logged as warnings.
    Warn,
}

/// Run a command through the context's runner. A non-zero exit always fails.
pub fn run_checked(ctx: &AppContext, spec: &CommandSpec, policy: StderrPolicy) -> Result<CommandOutput> {
    ui::verbose(&format!("Running: {}", spec));
    let output = ctx.runner.run(spec)?;

    if !output.success() {
        let code = output
            .code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        return Err(ProcessorError::CommandFailed {
            command: spec.to_string(),
            reason: format!("exit status {}: {}", code, output.stderr.trim()),
        });
    }

    let stderr = output.stderr.trim();
    if !stderr.is_empty() {
        match policy {
            StderrPolicy::Fatal => {
                return Err(ProcessorError::CommandFailed {
                    command: spec.to_string(),
                    reason: format!("unexpected error output: {}", stderr),
                });
            }
            StderrPolicy::Warn => {
                for line in stderr.lines() {
                    ui::warning(&format!("{}: {}", spec.program_name(), line));
                }
            }
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests;
