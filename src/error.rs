use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("{processor}: required input '{key}' is missing")]
    MissingInput { processor: String, key: String },

    #[error("Invalid input '{key}': {reason}")]
    InvalidInput { key: String, reason: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    StdIo(#[from] std::io::Error),

    #[error("KDL parse error: {0}")]
    KdlError(#[from] kdl::KdlError),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    YamlError(#[from] serde_yml::Error),

    #[error("XML error in '{source_name}': {message}")]
    XmlError {
        source_name: String,
        message: String,
    },

    #[error("System command '{command}' failed: {reason}")]
    CommandFailed { command: String, reason: String },

    #[error("Curl failure: {reason} (exit code {code})")]
    CurlFailed { reason: String, code: i32 },

    /// Remote resource fetch error (HTTP, network, etc.)
    #[error("Failed to fetch remote resource: {0}")]
    FetchFailed(String),

    /// Expected pattern, element or field was not present
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed binary or text payload
    #[error("Format error: {0}")]
    Format(String),

    #[error("Unknown processor: {0}")]
    UnknownProcessor(String),

    #[error("{0}")]
    Other(String),
}

impl ProcessorError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn xml(source_name: &str, err: impl std::fmt::Display) -> Self {
        Self::XmlError {
            source_name: source_name.to_string(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProcessorError>;
