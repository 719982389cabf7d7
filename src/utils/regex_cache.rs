//! Compiled regex cache.
//!
//! Fixed patterns used by processors (and recipe-supplied patterns that are
//! applied to many candidates) are compiled once per process.

use crate::error::{ProcessorError, Result};
use regex::Regex;
use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};

static REGEX_CACHE: LazyLock<Mutex<HashMap<String, Regex>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Get or compile a regex pattern from the cache.
pub fn get_cached_regex(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    if let Ok(cache) = REGEX_CACHE.lock() {
        if let Some(regex) = cache.get(pattern) {
            return Ok(regex.clone());
        }
    }

    let regex = Regex::new(pattern)?;

    // A poisoned lock only costs us the cache entry.
    if let Ok(mut cache) = REGEX_CACHE.lock() {
        cache.insert(pattern.to_string(), regex.clone());
    }

    Ok(regex)
}

/// Compile a pattern supplied through an input, reporting failures against
/// that input's name.
pub fn compile_input(key: &str, pattern: &str) -> Result<Regex> {
    get_cached_regex(pattern)
        .map_err(|e| ProcessorError::invalid(key, format!("invalid regex pattern: {}", e)))
}
