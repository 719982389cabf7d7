//! Running vendor build tooling: self-extracting `.bin` archives and
//! autotools source trees.

use crate::core::Processor;
use crate::core::descriptor::{ProcessorDescriptor, optional, required};
use crate::core::env::{Env, de};
use crate::error::{ProcessorError, Result};
use crate::exec::{CommandSpec, StderrPolicy, run_checked};
use crate::traits::AppContext;
use crate::ui;
use serde::Deserialize;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

pub struct LinuxBinExtractor;

static LINUX_BIN_EXTRACTOR: ProcessorDescriptor = ProcessorDescriptor {
    name: "LinuxBinExtractor",
    description: "Invoke a Linux self-extracting .bin file.",
    inputs: &[
        required("pathname", "Path to binary file."),
        optional("output_dir", "Desired output directory."),
    ],
    outputs: &[],
};

#[derive(Deserialize)]
struct BinExtractorInput {
    pathname: PathBuf,
    #[serde(default, deserialize_with = "de::opt_text")]
    output_dir: Option<String>,
}

/// Absolute form of a working directory, so programs inside it can be named
/// by full path instead of relative to the child's cwd.
fn absolute_dir(dir: &Path) -> Result<PathBuf> {
    std::path::absolute(dir).map_err(|e| ProcessorError::io(dir, e))
}

/// Add user, group and other execute bits.
fn make_executable(path: &Path) -> Result<()> {
    let metadata = fs::metadata(path).map_err(|e| ProcessorError::io(path, e))?;
    let mut permissions = metadata.permissions();
    permissions.set_mode(permissions.mode() | 0o111);
    fs::set_permissions(path, permissions).map_err(|e| ProcessorError::io(path, e))
}

impl Processor for LinuxBinExtractor {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &LINUX_BIN_EXTRACTOR
    }

    fn process(&self, ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: BinExtractorInput = env.decode()?;
        make_executable(&input.pathname)?;

        let file_name = input
            .pathname
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ProcessorError::invalid("pathname", "has no file name"))?;
        let parent = input
            .pathname
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let workdir = absolute_dir(parent)?;

        let cmd = CommandSpec::new(workdir.join(&file_name))
            .arg(format!("-o{}", input.output_dir.unwrap_or_default()))
            .current_dir(&workdir);
        ui::info(&format!("Cmd: {}", cmd));
        run_checked(ctx, &cmd, StderrPolicy::Fatal)?;
        Ok(Env::new())
    }
}

// ---------------------------------------------------------------------------

pub struct ConfigureMakeInstaller;

static CONFIGURE_MAKE_INSTALLER: ProcessorDescriptor = ProcessorDescriptor {
    name: "ConfigureMakeInstaller",
    description: "Runs Configure, Make, Make Install on target directory.",
    inputs: &[
        required(
            "installer_dir_path",
            "Path to directory containing Configure file.",
        ),
        optional("prefix_path", "Path to apply to --prefix argument."),
        optional(
            "output_path",
            "Path to output location. If not specified, 'make install' may install things outside the cache directory.",
        ),
    ],
    outputs: &[],
};

#[derive(Deserialize)]
struct ConfigureMakeInput {
    installer_dir_path: PathBuf,
    #[serde(default, deserialize_with = "de::opt_text")]
    prefix_path: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    output_path: Option<String>,
}

fn log_output(stdout: &str) {
    for line in stdout.lines() {
        ui::verbose(line);
    }
}

impl Processor for ConfigureMakeInstaller {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &CONFIGURE_MAKE_INSTALLER
    }

    fn process(&self, ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: ConfigureMakeInput = env.decode()?;
        let dir = &absolute_dir(&input.installer_dir_path)?;
        let makefile = dir.join("Makefile");

        let mut configure = CommandSpec::new(dir.join("configure")).current_dir(dir);
        if let Some(prefix) = &input.prefix_path {
            configure = configure.arg(format!("--prefix={}", prefix));
        }
        ui::info(&format!("Command: {}", configure));
        let out = run_checked(ctx, &configure, StderrPolicy::Warn)?;
        log_output(&out.stdout);

        ui::info("Running make");
        let make = CommandSpec::new(ctx.tool("make"))
            .arg("-f")
            .path_arg(&makefile)
            .current_dir(dir);
        let out = run_checked(ctx, &make, StderrPolicy::Warn)?;
        log_output(&out.stdout);

        ui::info("Running make install");
        let mut install = CommandSpec::new(ctx.tool("make"))
            .arg("install")
            .arg("-f")
            .path_arg(&makefile)
            .current_dir(dir);
        if let Some(dest) = &input.output_path {
            install = install.arg(format!("DESTDIR={}", dest));
        }
        ui::verbose(&format!("install cmd: {}", install));
        let out = run_checked(ctx, &install, StderrPolicy::Warn)?;
        log_output(&out.stdout);

        Ok(Env::new())
    }
}
