//! Filesystem helpers: listings, appends, checksums, rsync and pkginfo
//! `installs` tweaks.

use crate::core::Processor;
use crate::core::descriptor::{ProcessorDescriptor, optional, output, required, with_default};
use crate::core::env::{Env, de};
use crate::error::{ProcessorError, Result};
use crate::exec::{CommandSpec, StderrPolicy, run_checked};
use crate::traits::AppContext;
use crate::ui;
use glob::MatchOptions;
use md5::Md5;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub struct DirectoryList;

static DIRECTORY_LIST: ProcessorDescriptor = ProcessorDescriptor {
    name: "DirectoryList",
    description: "Returns a list of items matching a pattern as a string, separated by commas. Does not recurse into subdirectories.",
    inputs: &[
        required("pattern", "Shell glob pattern to match files by."),
        with_default(
            "find_method",
            "Type of pattern to match. Currently only supported type is \"glob\".",
            "glob",
        ),
        optional(
            "remove_extension",
            "Remove the extension at the end. Defaults to false.",
        ),
        with_default(
            "suffix_string",
            "String to append to each found item name in dir.",
            ",",
        ),
    ],
    outputs: &[output("found_filenames", "Found filenames.")],
};

#[derive(Deserialize)]
struct DirectoryListInput {
    #[serde(deserialize_with = "de::text")]
    pattern: String,
    #[serde(deserialize_with = "de::text")]
    find_method: String,
    #[serde(default, deserialize_with = "de::flag")]
    remove_extension: bool,
    #[serde(deserialize_with = "de::text")]
    suffix_string: String,
}

#[derive(Serialize)]
struct DirectoryListOutput {
    found_filenames: String,
}

/// Sorted basenames of everything matching a glob. Wildcards do not match a
/// leading dot.
pub fn glob_basenames(pattern: &str, remove_extension: bool) -> Result<Vec<String>> {
    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };
    let mut matches: Vec<PathBuf> = glob::glob_with(pattern, options)
        .map_err(|e| ProcessorError::invalid("pattern", e.to_string()))?
        .filter_map(|entry| entry.ok())
        .collect();
    if matches.is_empty() {
        return Err(ProcessorError::NotFound("No matching filename found".to_string()));
    }
    matches.sort();

    Ok(matches
        .iter()
        .map(|path| {
            let name = if remove_extension {
                path.file_stem()
            } else {
                path.file_name()
            };
            name.map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
        .collect())
}

impl Processor for DirectoryList {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &DIRECTORY_LIST
    }

    fn process(&self, _ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: DirectoryListInput = env.decode()?;
        if input.find_method != "glob" {
            return Err(ProcessorError::invalid(
                "find_method",
                format!("Unsupported find_method: {}", input.find_method),
            ));
        }
        let names = glob_basenames(&input.pattern, input.remove_extension)?;
        let found_filenames = names.join(&input.suffix_string).trim().to_string();
        ui::info(&format!("Found matches: {}", found_filenames));
        Env::encode(&DirectoryListOutput { found_filenames })
    }
}

// ---------------------------------------------------------------------------

pub struct SubDirectoryList;

static SUB_DIRECTORY_LIST: ProcessorDescriptor = ProcessorDescriptor {
    name: "SubDirectoryList",
    description: "Returns a string-converted list of items inside a directory, relative to the root path.",
    inputs: &[
        required("root_path", "Path to start looking for files."),
        with_default(
            "suffix_string",
            "String to append to each found item name in dir.",
            ",",
        ),
    ],
    outputs: &[
        output(
            "found_filenames",
            "All files found relative to root_path, separated by suffix_string.",
        ),
        output(
            "found_directories",
            "All directories found relative to root_path, separated by suffix_string.",
        ),
        output("relative_root", "Relative root path."),
    ],
};

#[derive(Deserialize)]
struct SubDirectoryListInput {
    root_path: PathBuf,
    #[serde(deserialize_with = "de::text")]
    suffix_string: String,
}

#[derive(Serialize)]
struct SubDirectoryListOutput {
    found_filenames: String,
    found_directories: String,
    relative_root: String,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct TreeListing {
    pub directories: Vec<String>,
    pub files: Vec<String>,
}

/// Top-down walk with entries sorted by name. A directory's files are listed
/// before anything inside its subdirectories. Symlinks to directories are
/// skipped entirely.
pub fn walk_tree(root: &Path) -> Result<TreeListing> {
    if !root.is_dir() {
        return Err(ProcessorError::NotFound(format!(
            "Can't find root path {}",
            root.display()
        )));
    }
    let mut listing = TreeListing::default();
    walk_into(root, "", &mut listing)?;
    Ok(listing)
}

fn walk_into(dir: &Path, relative: &str, listing: &mut TreeListing) -> Result<()> {
    let mut entries = fs::read_dir(dir)
        .map_err(|e| ProcessorError::io(dir, e))?
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| ProcessorError::io(dir, e))?;
    entries.sort_by_key(|entry| entry.file_name());

    let mut subdirs = Vec::new();
    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        let rel = if relative.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", relative, name)
        };
        let file_type = entry.file_type().map_err(|e| ProcessorError::io(entry.path(), e))?;
        // Linked directories are not descended into and are not files.
        if file_type.is_symlink() && fs::metadata(entry.path()).is_ok_and(|m| m.is_dir()) {
            continue;
        }
        if file_type.is_dir() {
            subdirs.push((entry.path(), rel));
        } else if !name.contains(".DS_Store") {
            ui::verbose(&format!("Relative path: {}", rel));
            listing.files.push(rel);
        }
    }

    for (path, rel) in subdirs {
        listing.directories.push(rel.clone());
        walk_into(&path, &rel, listing)?;
    }
    Ok(())
}

impl Processor for SubDirectoryList {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &SUB_DIRECTORY_LIST
    }

    fn process(&self, _ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: SubDirectoryListInput = env.decode()?;
        let listing = walk_tree(&input.root_path)?;
        let relative_root = input
            .root_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        ui::info(&format!(
            "Found {} directories and {} files under {}",
            listing.directories.len(),
            listing.files.len(),
            input.root_path.display()
        ));
        Env::encode(&SubDirectoryListOutput {
            found_filenames: listing.files.join(&input.suffix_string).trim().to_string(),
            found_directories: listing
                .directories
                .join(&input.suffix_string)
                .trim()
                .to_string(),
            relative_root,
        })
    }
}

// ---------------------------------------------------------------------------

pub struct FileAppender;

static FILE_APPENDER: ProcessorDescriptor = ProcessorDescriptor {
    name: "FileAppender",
    description: "Append contents to the end of a file.",
    inputs: &[
        required("file_path", "Path to a file to append to."),
        required("file_content", "Contents to add to a file."),
    ],
    outputs: &[],
};

#[derive(Deserialize)]
struct FileAppenderInput {
    file_path: PathBuf,
    #[serde(deserialize_with = "de::text")]
    file_content: String,
}

impl Processor for FileAppender {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &FILE_APPENDER
    }

    fn process(&self, _ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: FileAppenderInput = env.decode()?;
        let path = &input.file_path;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| ProcessorError::io(path, e))?;
        file.write_all(input.file_content.as_bytes())
            .map_err(|e| ProcessorError::io(path, e))?;
        ui::info(&format!("Appended to file at {}", path.display()));
        Ok(Env::new())
    }
}

// ---------------------------------------------------------------------------

pub struct HashOfFile;

static HASH_OF_FILE: ProcessorDescriptor = ProcessorDescriptor {
    name: "HashOfFile",
    description: "Computes a hex digest of a file.",
    inputs: &[
        required("hashfile_path", "Path to file you want hash of."),
        with_default("hash_type", "Digest algorithm: md5 or sha256.", "md5"),
    ],
    outputs: &[output("hashoffile", "Hash of the requested file.")],
};

#[derive(Deserialize)]
struct HashOfFileInput {
    hashfile_path: PathBuf,
    #[serde(deserialize_with = "de::text")]
    hash_type: String,
}

#[derive(Serialize)]
struct HashOfFileOutput {
    hashoffile: String,
}

const HASH_CHUNK: usize = 1024;

pub fn hash_reader<D: Digest, R: Read>(mut reader: R) -> std::io::Result<String> {
    let mut hasher = D::new();
    let mut buf = [0u8; HASH_CHUNK];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

pub fn hash_file(path: &Path, hash_type: &str) -> Result<String> {
    let file = File::open(path).map_err(|e| ProcessorError::io(path, e))?;
    let digest = match hash_type.to_ascii_lowercase().as_str() {
        "md5" => hash_reader::<Md5, _>(file),
        "sha256" => hash_reader::<Sha256, _>(file),
        other => {
            return Err(ProcessorError::invalid(
                "hash_type",
                format!("unsupported digest '{}', expected md5 or sha256", other),
            ));
        }
    };
    digest.map_err(|e| ProcessorError::io(path, e))
}

impl Processor for HashOfFile {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &HASH_OF_FILE
    }

    fn process(&self, _ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: HashOfFileInput = env.decode()?;
        ui::verbose(&input.hashfile_path.display().to_string());
        let hashoffile = hash_file(&input.hashfile_path, &input.hash_type)?;
        ui::info(&format!("{} digest: {}", input.hash_type, hashoffile));
        Env::encode(&HashOfFileOutput { hashoffile })
    }
}

// ---------------------------------------------------------------------------

pub struct SHAChecksum;

static SHA_CHECKSUM: ProcessorDescriptor = ProcessorDescriptor {
    name: "SHAChecksum",
    description: "Calculate checksum for a file.",
    inputs: &[
        required("source_file", "Path to file to calculate checksum on."),
        optional(
            "checksum_type",
            "Checksum type, passed directly to shasum -a. Defaults to SHA1.",
        ),
    ],
    outputs: &[output("checksum", "Checksum reported by shasum.")],
};

#[derive(Deserialize)]
struct SHAChecksumInput {
    source_file: PathBuf,
    #[serde(default, deserialize_with = "de::opt_text")]
    checksum_type: Option<String>,
}

#[derive(Serialize)]
struct SHAChecksumOutput {
    checksum: String,
}

impl Processor for SHAChecksum {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &SHA_CHECKSUM
    }

    fn process(&self, ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: SHAChecksumInput = env.decode()?;
        let mut cmd = CommandSpec::new(ctx.tool("shasum"));
        if let Some(kind) = &input.checksum_type {
            cmd = cmd.arg("-a").arg(kind);
        }
        cmd = cmd.path_arg(&input.source_file);

        let out = run_checked(ctx, &cmd, StderrPolicy::Fatal)?;
        ui::verbose(out.stdout.trim());
        let checksum = out
            .stdout
            .split_whitespace()
            .next()
            .ok_or_else(|| ProcessorError::Format("shasum printed nothing".to_string()))?
            .to_string();
        Env::encode(&SHAChecksumOutput { checksum })
    }
}

// ---------------------------------------------------------------------------

pub struct Rsync;

static RSYNC: ProcessorDescriptor = ProcessorDescriptor {
    name: "Rsync",
    description: "Rsyncs a file/directory to another file/directory.",
    inputs: &[
        required("source_path", "Path to file or directory to copy from."),
        required("destination_path", "Path to file or directory to copy to."),
        optional("rsync_arguments", "Arguments passed to rsync directly."),
        optional(
            "rsync_path",
            "Custom path to rsync. Defaults to the configured rsync tool.",
        ),
    ],
    outputs: &[],
};

#[derive(Deserialize)]
struct RsyncInput {
    #[serde(deserialize_with = "de::text")]
    source_path: String,
    #[serde(deserialize_with = "de::text")]
    destination_path: String,
    #[serde(default, deserialize_with = "de::opt_text")]
    rsync_arguments: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    rsync_path: Option<String>,
}

impl Processor for Rsync {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &RSYNC
    }

    fn process(&self, ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: RsyncInput = env.decode()?;
        let program = input
            .rsync_path
            .map(PathBuf::from)
            .unwrap_or_else(|| ctx.tool("rsync"));

        let extra = match &input.rsync_arguments {
            Some(raw) => shlex::split(raw).ok_or_else(|| {
                ProcessorError::invalid("rsync_arguments", "unbalanced quotes")
            })?,
            None => Vec::new(),
        };

        let cmd = CommandSpec::new(program)
            .args(extra)
            .arg(input.source_path)
            .arg(input.destination_path);
        let out = run_checked(ctx, &cmd, StderrPolicy::Fatal)?;
        for line in out.stdout.lines() {
            ui::verbose(line);
        }
        Ok(Env::new())
    }
}

// ---------------------------------------------------------------------------

pub struct InstallsArrayFineTuning;

static INSTALLS_ARRAY_FINE_TUNING: ProcessorDescriptor = ProcessorDescriptor {
    name: "InstallsArrayFineTuning",
    description: "Change an installs array to allow fine-tuning of a type.",
    inputs: &[
        required(
            "additional_pkginfo",
            "Dictionary containing an installs array.",
        ),
        required(
            "changes",
            "List of dictionaries each holding a path and the new type for matching installs.",
        ),
    ],
    outputs: &[output(
        "changed_pkginfo",
        "Fine tuned additional_pkginfo dictionary.",
    )],
};

#[derive(Deserialize)]
struct FineTuningInput {
    additional_pkginfo: Map<String, Value>,
    changes: Vec<Map<String, Value>>,
}

#[derive(Serialize)]
struct FineTuningOutput {
    changed_pkginfo: Map<String, Value>,
}

fn change_field<'a>(change: &'a Map<String, Value>, field: &str) -> Result<&'a str> {
    change
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ProcessorError::invalid("changes", format!("No {} found in change!", field)))
}

/// Replace `type` on every install whose `path` matches a change.
pub fn apply_install_changes(
    mut pkginfo: Map<String, Value>,
    changes: &[Map<String, Value>],
) -> Result<Map<String, Value>> {
    let installs = pkginfo
        .get_mut("installs")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| ProcessorError::invalid("additional_pkginfo", "has no installs array"))?;

    for change in changes {
        let path = change_field(change, "path")?;
        let new_type = change_field(change, "type")?;
        for install in installs.iter_mut().filter_map(Value::as_object_mut) {
            if install.get("path").and_then(Value::as_str) == Some(path) {
                install.insert("type".to_string(), Value::from(new_type));
                ui::info(&format!("Replacing type for {} to {}", path, new_type));
            }
        }
    }
    Ok(pkginfo)
}

impl Processor for InstallsArrayFineTuning {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &INSTALLS_ARRAY_FINE_TUNING
    }

    fn process(&self, _ctx: &AppContext, env: &Env) -> Result<Env> {
        let input: FineTuningInput = env.decode()?;
        let changed_pkginfo = apply_install_changes(input.additional_pkginfo, &input.changes)?;
        Env::encode(&FineTuningOutput { changed_pkginfo })
    }
}

#[cfg(test)]
mod tests;
