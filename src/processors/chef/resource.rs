//! Chef resource blocks. Every resource processor renders through
//! [`render_block`]; they differ only in block name, attribute prefix and
//! the attributes they declare.

use crate::core::Processor;
use crate::core::descriptor::{InputSpec, OutputSpec, ProcessorDescriptor, optional, output, required};
use crate::core::env::{Env, display_value, truthy};
use crate::error::{ProcessorError, Result};
use crate::traits::AppContext;
use crate::ui;
use serde_json::Value;

const RESOURCE_NAME: &str = "resource_name";
const EACH_DO: &str = ".each do |item|\n";

/// How a resource processor names its block and its env keys.
#[derive(Debug, Clone, Copy)]
pub struct BlockStyle {
    pub block_name: &'static str,
    pub prefix: &'static str,
    pub trailing_blank_line: bool,
}

impl BlockStyle {
    fn key(&self, suffix: &str) -> String {
        format!("{}{}", self.prefix, suffix)
    }

    fn is_control_key(&self, name: &str) -> bool {
        name == RESOURCE_NAME
            || ["resource_array", "extra_indentation", "indentation_end", "not_if", "only_if"]
                .iter()
                .any(|suffix| name == self.key(suffix))
    }
}

/// Whether an attribute value should be written at all. Null, `false`, zero
/// and empty strings, arrays or objects are skipped.
fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn flag(env: &Env, key: &str) -> bool {
    env.get(key).is_some_and(truthy)
}

fn resource_names(value: &Value) -> Result<Vec<String>> {
    match value {
        Value::String(s) => Ok(s.split(',').map(str::to_string).collect()),
        Value::Array(items) => Ok(items.iter().map(display_value).collect()),
        other => Err(ProcessorError::invalid(
            RESOURCE_NAME,
            format!("expected a string or an array, got {}", other),
        )),
    }
}

/// Render one resource block. Attribute keys are the descriptor's inputs
/// minus the control keys, written in sorted order after the guards.
pub fn render_block(style: &BlockStyle, inputs: &[InputSpec], env: &Env) -> Result<String> {
    let name_value = env
        .get(RESOURCE_NAME)
        .ok_or_else(|| ProcessorError::invalid(RESOURCE_NAME, "is required"))?;
    let names = resource_names(name_value)?;

    let mut indent_block = "";
    let mut extra = "";
    let mut end_text = String::from("end\n");
    if flag(env, &style.key("extra_indentation")) {
        ui::verbose("Adding indentation.");
        indent_block = "  ";
        extra = "  ";
        end_text = format!("  {}", end_text);
    }
    if flag(env, &style.key("indentation_end")) {
        end_text.push_str("end\n");
    }

    let mut block = String::new();
    if let [single] = names.as_slice() {
        block.push_str(indent_block);
        block.push_str(style.block_name);
        block.push(' ');
        block.push_str(single);
        if flag(env, &style.key("resource_array")) {
            block.push_str(EACH_DO);
        } else {
            block.push_str(" do\n");
        }
    } else {
        let items: Vec<String> = names.iter().map(|n| format!("  {}", n)).collect();
        block.push_str("[\n");
        block.push_str(&items.join(",\n"));
        block.push_str("\n]");
        block.push_str(EACH_DO);
        block.push_str(&format!("{} item do\n", style.block_name));
        extra = "  ";
        end_text = format!("{}end\n", indent_block);
        if style.trailing_blank_line {
            end_text.push('\n');
        }
    }

    for guard in ["not_if", "only_if"] {
        if let Some(value) = env.get(&style.key(guard)).filter(|v| is_set(v)) {
            block.push_str(&format!("{}  {} {}\n", extra, guard, display_value(value)));
        }
    }

    let mut attributes: Vec<&str> = inputs
        .iter()
        .map(|spec| spec.name)
        .filter(|name| !style.is_control_key(name))
        .collect();
    attributes.sort_unstable();

    for key in attributes {
        if let Some(value) = env.get(key).filter(|v| is_set(v)) {
            // `launchd_launchd_name` must still render as `launchd_name`.
            let attr = key.strip_prefix(style.prefix).unwrap_or(key);
            block.push_str(&format!("{}  {} {}\n", extra, attr, display_value(value)));
        }
    }

    block.push_str(&end_text);
    if style.trailing_blank_line {
        block.push('\n');
    }
    Ok(block)
}

fn process_block(descriptor: &ProcessorDescriptor, style: &BlockStyle, env: &Env) -> Result<Env> {
    let chef_block = render_block(style, descriptor.inputs, env)?;
    ui::verbose(&format!("Chef block:\n{}", chef_block));
    let mut out = Env::new();
    out.insert("chef_block", chef_block);
    Ok(out)
}

const CHEF_BLOCK: &[OutputSpec] = &[output("chef_block", "Chef block.")];
const NAME_HELP: &str = "Name for the resource. A single string, a comma-separated list or an array; several names render an each-loop.";

// ---------------------------------------------------------------------------

pub struct ChefFile;

static CHEF_FILE: ProcessorDescriptor = ProcessorDescriptor {
    name: "ChefFile",
    description: "Produces a file Chef block.",
    inputs: &[
        required(RESOURCE_NAME, NAME_HELP),
        optional("file_resource_array", "Does the resource_name represent an array variable?"),
        optional("file_action", "Resource action."),
        optional("file_atomic_update", "Perform atomic file updates on a per-resource basis."),
        optional("file_backup", "The number of backups to be kept in /var/chef/backup."),
        optional("file_checksum", "The SHA-256 checksum of the file."),
        optional("file_content", "A string that is written to the file."),
        optional("file_force_unlink", "How to handle a target that turns out not to be a file."),
        optional("file_group", "Group owning the file."),
        optional("file_ignore_failure", "Continue running a recipe if the resource fails."),
        optional("file_inherits", "Windows only. Whether the file inherits rights from its parent."),
        optional("file_manage_symlink_source", "Detect and manage the source file of a symlink."),
        optional("file_mode", "A quoted 3-5 character string that defines the octal mode."),
        optional("file_notifies", "Which resource takes action when this resource's state changes."),
        optional("file_owner", "User owning the file."),
        optional("file_path", "The path to the file."),
        optional("file_provider", "Explicitly specify a provider."),
        optional("file_retries", "The number of times to catch exceptions and retry the resource."),
        optional("file_retry_delay", "The retry delay (in seconds)."),
        optional("file_rights", "Windows only. Permissions for users and groups."),
        optional("file_sensitive", "Keep sensitive resource data out of the chef-client log."),
        optional("file_subscribes", "Resource to listen to, taking action when its state changes."),
        optional("file_verify", "A block or a string that returns true or false."),
        optional("file_only_if", "only_if guard phrase."),
        optional("file_not_if", "not_if guard phrase."),
        optional("file_extra_indentation", "Indent this block. Defaults to empty."),
        optional("file_indentation_end", "Should this end an indented section? Defaults to empty."),
    ],
    outputs: CHEF_BLOCK,
};

const FILE_STYLE: BlockStyle = BlockStyle {
    block_name: "file",
    prefix: "file_",
    trailing_blank_line: true,
};

impl Processor for ChefFile {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &CHEF_FILE
    }

    fn process(&self, _ctx: &AppContext, env: &Env) -> Result<Env> {
        process_block(&CHEF_FILE, &FILE_STYLE, env)
    }
}

// ---------------------------------------------------------------------------

pub struct ChefCookbookFile;

static CHEF_COOKBOOK_FILE: ProcessorDescriptor = ProcessorDescriptor {
    name: "ChefCookbookFile",
    description: "Produces a cookbook_file Chef block.",
    inputs: &[
        required(RESOURCE_NAME, NAME_HELP),
        optional("cookbook_file_resource_array", "Does the resource_name represent an array variable?"),
        optional("cookbook_file_action", "Resource action."),
        optional("cookbook_file_atomic_update", "Perform atomic file updates on a per-resource basis."),
        optional("cookbook_file_backup", "The number of backups to be kept in /var/chef/backup."),
        optional("cookbook_file_cookbook", "The cookbook in which a file is located."),
        optional("cookbook_file_force_unlink", "How to handle a target that turns out not to be a file."),
        optional("cookbook_file_group", "Group owning the file."),
        optional("cookbook_file_ignore_failure", "Continue running a recipe if the resource fails."),
        optional("cookbook_file_inherits", "Windows only. Whether the file inherits rights from its parent."),
        optional("cookbook_file_manage_symlink_source", "Detect and manage the source file of a symlink."),
        optional("cookbook_file_mode", "A quoted 3-5 character string that defines the octal mode."),
        optional("cookbook_file_notifies", "Which resource takes action when this resource's state changes."),
        optional("cookbook_file_owner", "User owning the file."),
        optional("cookbook_file_path", "The path to the file."),
        optional("cookbook_file_provider", "Explicitly specify a provider."),
        optional("cookbook_file_retries", "The number of times to catch exceptions and retry the resource."),
        optional("cookbook_file_retry_delay", "The retry delay (in seconds)."),
        optional("cookbook_file_rights", "Windows only. Permissions for users and groups."),
        required("cookbook_file_source", "The name of the file in COOKBOOK_NAME/files/default."),
        optional("cookbook_file_subscribes", "Resource to listen to, taking action when its state changes."),
        optional("cookbook_file_verify", "A block or a string that returns true or false."),
        optional("cookbook_file_only_if", "only_if guard phrase."),
        optional("cookbook_file_not_if", "not_if guard phrase."),
        optional("cookbook_file_extra_indentation", "Indent this block. Defaults to empty."),
        optional("cookbook_file_indentation_end", "Should this end an indented section? Defaults to empty."),
    ],
    outputs: CHEF_BLOCK,
};

const COOKBOOK_FILE_STYLE: BlockStyle = BlockStyle {
    block_name: "cookbook_file",
    prefix: "cookbook_file_",
    trailing_blank_line: true,
};

impl Processor for ChefCookbookFile {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &CHEF_COOKBOOK_FILE
    }

    fn process(&self, _ctx: &AppContext, env: &Env) -> Result<Env> {
        process_block(&CHEF_COOKBOOK_FILE, &COOKBOOK_FILE_STYLE, env)
    }
}

// ---------------------------------------------------------------------------

pub struct ChefLaunchd;

static CHEF_LAUNCHD: ProcessorDescriptor = ProcessorDescriptor {
    name: "ChefLaunchd",
    description: "Produces a launchd Chef block.",
    inputs: &[
        required(RESOURCE_NAME, NAME_HELP),
        optional("launchd_resource_array", "Does the resource_name represent an array variable?"),
        required("launchd_action", "Resource action."),
        optional("launchd_notifies", "Which resource takes action when this resource's state changes."),
        optional("launchd_launchd_name", "The name of the launchd."),
        optional("launchd_subscribes", "Resource to listen to, taking action when its state changes."),
        optional("launchd_only_if", "only_if guard phrase."),
        optional("launchd_not_if", "not_if guard phrase."),
        optional("launchd_extra_indentation", "Indent this block. Defaults to empty."),
        optional("launchd_indentation_end", "Should this end an indented section? Defaults to empty."),
        optional("launchd_path", "Explicit path to plist file."),
    ],
    outputs: CHEF_BLOCK,
};

const LAUNCHD_STYLE: BlockStyle = BlockStyle {
    block_name: "launchd",
    prefix: "launchd_",
    trailing_blank_line: true,
};

impl Processor for ChefLaunchd {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &CHEF_LAUNCHD
    }

    fn process(&self, _ctx: &AppContext, env: &Env) -> Result<Env> {
        process_block(&CHEF_LAUNCHD, &LAUNCHD_STYLE, env)
    }
}

// ---------------------------------------------------------------------------

pub struct ChefMacOSXUserDefaults;

static CHEF_MACOSX_USER_DEFAULTS: ProcessorDescriptor = ProcessorDescriptor {
    name: "ChefMacOSXUserDefaults",
    description: "Produces a mac_os_x_userdefaults Chef block.",
    inputs: &[
        required(RESOURCE_NAME, NAME_HELP),
        optional("userdefaults_resource_array", "Does the resource_name represent an array variable?"),
        optional("userdefaults_action", "Resource action."),
        required("userdefaults_domain", "The domain the defaults belong to."),
        optional("userdefaults_global", "Whether the domain is global."),
        optional("userdefaults_current_host", "Write to the current host's defaults."),
        required("userdefaults_key", "The preference key."),
        required("userdefaults_value", "The value of the key."),
        optional("userdefaults_type", "Value type of the preference key."),
        optional("userdefaults_user", "The user for which to set the preference."),
        optional("userdefaults_sudo", "Set to true if the setting requires privileged access."),
        optional("userdefaults_is_set", "Whether the key is already set."),
        optional("userdefaults_only_if", "only_if guard phrase."),
        optional("userdefaults_not_if", "not_if guard phrase."),
        optional("userdefaults_extra_indentation", "Indent this block. Defaults to empty."),
        optional("userdefaults_indentation_end", "Should this end an indented section? Defaults to empty."),
    ],
    outputs: CHEF_BLOCK,
};

const USER_DEFAULTS_STYLE: BlockStyle = BlockStyle {
    block_name: "mac_os_x_userdefaults",
    prefix: "userdefaults_",
    trailing_blank_line: true,
};

impl Processor for ChefMacOSXUserDefaults {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &CHEF_MACOSX_USER_DEFAULTS
    }

    fn process(&self, _ctx: &AppContext, env: &Env) -> Result<Env> {
        process_block(&CHEF_MACOSX_USER_DEFAULTS, &USER_DEFAULTS_STYLE, env)
    }
}

// ---------------------------------------------------------------------------

pub struct ChefRemotePackage;

static CHEF_REMOTE_PACKAGE: ProcessorDescriptor = ProcessorDescriptor {
    name: "ChefRemotePackage",
    description: "Produces a cpe_remote_pkg Chef block.",
    inputs: &[
        required(RESOURCE_NAME, NAME_HELP),
        optional("resource_array", "Does the resource_name represent an array variable?"),
        optional("app", "Name of the app the package installs."),
        required("checksum", "SHA256 checksum of the package."),
        optional("cleanup", "Remove the package after installing."),
        optional("pkg_name", "Package file name, when it differs from the app."),
        required("receipt", "Package receipt identifier."),
        optional("remote", "Whether to fetch the package from the remote server."),
        required("version", "Package version."),
        optional("only_if", "only_if guard phrase."),
        optional("not_if", "not_if guard phrase."),
        optional("extra_indentation", "Indent this block. Defaults to empty."),
        optional("indentation_end", "Should this end an indented section? Defaults to empty."),
    ],
    outputs: CHEF_BLOCK,
};

const REMOTE_PACKAGE_STYLE: BlockStyle = BlockStyle {
    block_name: "cpe_remote_pkg",
    prefix: "",
    trailing_blank_line: false,
};

impl Processor for ChefRemotePackage {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &CHEF_REMOTE_PACKAGE
    }

    fn process(&self, _ctx: &AppContext, env: &Env) -> Result<Env> {
        process_block(&CHEF_REMOTE_PACKAGE, &REMOTE_PACKAGE_STYLE, env)
    }
}

// ---------------------------------------------------------------------------

pub struct ChefTemplate;

static CHEF_TEMPLATE: ProcessorDescriptor = ProcessorDescriptor {
    name: "ChefTemplate",
    description: "Produces a template Chef block.",
    inputs: &[
        required(RESOURCE_NAME, NAME_HELP),
        optional("resource_array", "Does the resource_name represent an array variable?"),
        optional("action", "Resource action."),
        optional("atomic_update", "Perform atomic file updates on a per-resource basis."),
        optional("backup", "The number of backups to be kept in /var/chef/backup."),
        optional("cookbook", "The cookbook in which the template is located."),
        optional("force_unlink", "How to handle a target that turns out not to be a file."),
        optional("group", "Group owning the rendered file."),
        optional("helper", "Define a helper method inline."),
        optional("ignore_failure", "Continue running a recipe if the resource fails."),
        optional("inherits", "Windows only. Whether the file inherits rights from its parent."),
        optional("local", "Load the template from the local path."),
        optional("manage_symlink_source", "Detect and manage the source file of a symlink."),
        optional("mode", "A quoted 3-5 character string that defines the octal mode."),
        optional("notifies", "Which resource takes action when this resource's state changes."),
        optional("owner", "User owning the rendered file."),
        optional("path", "The path to the rendered file."),
        optional("provider", "Explicitly specify a provider."),
        optional("retries", "The number of times to catch exceptions and retry the resource."),
        optional("retry_delay", "The retry delay (in seconds)."),
        optional("rights", "Windows only. Permissions for users and groups."),
        optional("sensitive", "Keep sensitive resource data out of the chef-client log."),
        required("source", "The template file in the cookbook's templates directory."),
        optional("subscribes", "Resource to listen to, taking action when its state changes."),
        required("variables", "Hash of variables passed into the template."),
        optional("verify", "A block or a string that returns true or false."),
        optional("only_if", "only_if guard phrase."),
        optional("not_if", "not_if guard phrase."),
        optional("extra_indentation", "Indent this block. Defaults to empty."),
        optional("indentation_end", "Should this end an indented section? Defaults to empty."),
    ],
    outputs: CHEF_BLOCK,
};

const TEMPLATE_STYLE: BlockStyle = BlockStyle {
    block_name: "template",
    prefix: "",
    trailing_blank_line: true,
};

impl Processor for ChefTemplate {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &CHEF_TEMPLATE
    }

    fn process(&self, _ctx: &AppContext, env: &Env) -> Result<Env> {
        process_block(&CHEF_TEMPLATE, &TEMPLATE_STYLE, env)
    }
}

// ---------------------------------------------------------------------------

pub struct ChefRemoteDirectory;

static CHEF_REMOTE_DIRECTORY: ProcessorDescriptor = ProcessorDescriptor {
    name: "ChefRemoteDirectory",
    description: "Produces a remote_directory Chef block.",
    inputs: &[
        required(RESOURCE_NAME, NAME_HELP),
        optional("resource_array", "Does the resource_name represent an array variable?"),
        optional("action", "Resource action."),
        optional("cookbook", "The cookbook in which the directory is located."),
        optional("files_backup", "The number of backups kept for each file."),
        optional("files_group", "Group owning the files."),
        optional("files_mode", "Octal mode of the files."),
        optional("files_owner", "User owning the files."),
        optional("group", "Group owning the directory."),
        optional("ignore_failure", "Continue running a recipe if the resource fails."),
        optional("inherits", "Windows only. Whether the directory inherits rights from its parent."),
        optional("mode", "Octal mode of the directory."),
        optional("notifies", "Which resource takes action when this resource's state changes."),
        optional("overwrite", "Overwrite existing files."),
        optional("owner", "User owning the directory."),
        optional("path", "The path to the directory."),
        optional("provider", "Explicitly specify a provider."),
        optional("purge", "Purge extra files found in the target directory."),
        optional("recursive", "Create or delete directories recursively."),
        optional("retries", "The number of times to catch exceptions and retry the resource."),
        optional("retry_delay", "The retry delay (in seconds)."),
        optional("rights", "Windows only. Permissions for users and groups."),
        required("source", "The base name of the source directory in the cookbook."),
        optional("subscribes", "Resource to listen to, taking action when its state changes."),
        optional("only_if", "only_if guard phrase."),
        optional("not_if", "not_if guard phrase."),
        optional("extra_indentation", "Indent this block. Defaults to empty."),
        optional("indentation_end", "Should this end an indented section? Defaults to empty."),
    ],
    outputs: CHEF_BLOCK,
};

const REMOTE_DIRECTORY_STYLE: BlockStyle = BlockStyle {
    block_name: "remote_directory",
    prefix: "",
    trailing_blank_line: true,
};

impl Processor for ChefRemoteDirectory {
    fn descriptor(&self) -> &'static ProcessorDescriptor {
        &CHEF_REMOTE_DIRECTORY
    }

    fn process(&self, _ctx: &AppContext, env: &Env) -> Result<Env> {
        process_block(&CHEF_REMOTE_DIRECTORY, &REMOTE_DIRECTORY_STYLE, env)
    }
}
