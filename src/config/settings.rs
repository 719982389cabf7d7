//! Settings Module
//!
//! Loads procpack settings (timeouts, tool paths, default inputs) from a KDL
//! file. A missing file means built-in defaults.

use crate::core::env::Env;
use crate::error::{ProcessorError, Result};
use crate::project_identity;
use crate::utils::paths;
use kdl::{KdlDocument, KdlNode, KdlValue};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory searched for tools that have no explicit configuration.
pub const DEFAULT_TOOL_DIR: &str = "/usr/bin";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Settings {
    pub http_timeout: Duration,
    pub user_agent: String,
    /// No subprocess timeout unless configured.
    pub command_timeout: Option<Duration>,
    pub tools: BTreeMap<String, String>,
    /// Inputs merged beneath every run.
    pub defaults: Env,
    pub source: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            user_agent: project_identity::user_agent(),
            command_timeout: None,
            tools: BTreeMap::new(),
            defaults: Env::new(),
            source: None,
        }
    }
}

impl Settings {
    /// Resolve the settings file (explicit path, `PROCPACK_CONFIG`, then the
    /// per-user config dir) and load it.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            // An explicitly requested file must exist.
            return Self::load_file(path);
        }

        if let Some(path) = project_identity::env_get("CONFIG") {
            return Self::load_file(Path::new(&path));
        }

        let path = paths::settings_file()?;
        if path.exists() {
            Self::load_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ProcessorError::io(path, e))?;
        let mut settings = Self::from_kdl(&content)?;
        settings.source = Some(path.to_path_buf());
        Ok(settings)
    }

    pub fn from_kdl(content: &str) -> Result<Self> {
        let doc: KdlDocument = content.parse().map_err(|e: kdl::KdlError| {
            ProcessorError::ConfigError(format!("KDL parsing error in settings: {}", e))
        })?;

        let mut settings = Self::default();

        for node in doc.nodes() {
            match node.name().value() {
                "settings" => settings.apply_settings_block(node)?,
                "tools" => {
                    for (name, value) in child_pairs(node) {
                        let path = value_as_string(value).ok_or_else(|| {
                            ProcessorError::ConfigError(format!(
                                "tool '{}' must be a string path",
                                name
                            ))
                        })?;
                        settings.tools.insert(name, path);
                    }
                }
                "defaults" => {
                    for (name, value) in child_pairs(node) {
                        settings.defaults.insert(name, kdl_to_json(value));
                    }
                }
                other => {
                    return Err(ProcessorError::ConfigError(format!(
                        "Unknown settings section '{}'. Valid sections: settings, tools, defaults",
                        other
                    )));
                }
            }
        }

        Ok(settings)
    }

    fn apply_settings_block(&mut self, node: &KdlNode) -> Result<()> {
        for (key, value) in child_pairs(node) {
            match key.as_str() {
                "http-timeout" => {
                    self.http_timeout = Duration::from_secs(positive_secs(&key, value)?);
                }
                "command-timeout" => {
                    self.command_timeout = Some(Duration::from_secs(positive_secs(&key, value)?));
                }
                "user-agent" => {
                    self.user_agent = value_as_string(value).ok_or_else(|| {
                        ProcessorError::ConfigError("user-agent must be a string".to_string())
                    })?;
                }
                _ => {
                    return Err(ProcessorError::ConfigError(format!(
                        "Unknown setting: '{}'. Valid settings: http-timeout, command-timeout, user-agent",
                        key
                    )));
                }
            }
        }
        Ok(())
    }

    /// Path of an external tool. Configured values containing a `/` are used
    /// verbatim, bare names are looked up on `PATH`.
    pub fn tool(&self, name: &str) -> PathBuf {
        match self.tools.get(name) {
            Some(configured) if configured.contains('/') => PathBuf::from(configured),
            Some(configured) => {
                which::which(configured).unwrap_or_else(|_| PathBuf::from(configured))
            }
            None => Path::new(DEFAULT_TOOL_DIR).join(name),
        }
    }
}

fn child_pairs(node: &KdlNode) -> Vec<(String, &KdlValue)> {
    let mut pairs = Vec::new();
    if let Some(children) = node.children() {
        for child in children.nodes() {
            if let Some(entry) = child.entries().first() {
                pairs.push((child.name().value().to_string(), entry.value()));
            }
        }
    }
    pairs
}

fn value_as_string(value: &KdlValue) -> Option<String> {
    value.as_string().map(str::to_string)
}

fn positive_secs(key: &str, value: &KdlValue) -> Result<u64> {
    value
        .as_integer()
        .and_then(|n| u64::try_from(n).ok())
        .filter(|n| *n > 0)
        .ok_or_else(|| {
            ProcessorError::ConfigError(format!("{} must be a positive number of seconds", key))
        })
}

fn kdl_to_json(value: &KdlValue) -> Value {
    if let Some(s) = value.as_string() {
        return Value::String(s.to_string());
    }
    if let Some(b) = value.as_bool() {
        return Value::Bool(b);
    }
    if let Some(n) = value.as_integer() {
        return i64::try_from(n)
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(n.to_string()));
    }
    if let Some(f) = value.as_float() {
        return serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null);
    }
    Value::Null
}
