//! The key/value environment passed into and returned from a processor.

use crate::error::{ProcessorError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Ordered so serialized outputs are byte-identical across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Env(BTreeMap<String, Value>);

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(|v| !v.is_null())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn set_default(&mut self, key: &str, value: impl Into<Value>) {
        if !self.contains(key) {
            self.0.insert(key.to_string(), value.into());
        }
    }

    /// Layer `other` on top of `self`; last writer wins.
    pub fn merge(&mut self, other: Env) {
        self.0.extend(other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Parse a `key=value` assignment. Values that look like JSON objects or
    /// arrays are parsed as JSON, everything else stays a string.
    pub fn parse_assignment(raw: &str) -> Result<(String, Value)> {
        let (key, value) = raw
            .split_once('=')
            .ok_or_else(|| ProcessorError::invalid(raw, "expected KEY=VALUE"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ProcessorError::invalid(raw, "empty key"));
        }

        let trimmed = value.trim_start();
        let parsed = if trimmed.starts_with('{') || trimmed.starts_with('[') {
            serde_json::from_str(value)
                .map_err(|e| ProcessorError::invalid(key, format!("invalid JSON value: {}", e)))?
        } else {
            Value::String(value.to_string())
        };

        Ok((key.to_string(), parsed))
    }

    /// Load an env from a JSON object document.
    pub fn from_json(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)?;
        match value {
            Value::Object(map) => Ok(map.into_iter().collect()),
            _ => Err(ProcessorError::invalid(
                "env",
                "environment document must be a JSON object",
            )),
        }
    }

    /// Decode into a processor's typed input struct.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let map: Map<String, Value> = self
            .0
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        serde_json::from_value(Value::Object(map))
            .map_err(|e| ProcessorError::invalid("env", e.to_string()))
    }

    /// Encode a processor's typed output struct.
    pub fn encode<T: Serialize>(output: &T) -> Result<Self> {
        match serde_json::to_value(output)? {
            Value::Object(map) => Ok(map.into_iter().collect()),
            Value::Null => Ok(Self::new()),
            other => Err(ProcessorError::Other(format!(
                "processor output must be an object, got {}",
                other
            ))),
        }
    }
}

impl FromIterator<(String, Value)> for Env {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Env {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Interpret a loosely-typed flag. Strings `""`, `0`, `false`, `no` and
/// `off` are false, any other string is true.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => {
            let s = s.trim().to_ascii_lowercase();
            !matches!(s.as_str(), "" | "0" | "false" | "no" | "off")
        }
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Render a value the way it is written into text outputs: strings verbatim,
/// everything else as compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// serde helpers for input structs.
pub mod de {
    use super::*;

    /// `#[serde(default, deserialize_with = "de::flag")]`
    pub fn flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(truthy(&value))
    }

    /// Accept strings, numbers and booleans for a text field.
    pub fn text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(display_value(&value))
    }

    /// Optional variant of [`text`]; empty strings become `None`.
    pub fn opt_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value
            .map(|v| display_value(&v))
            .filter(|s| !s.is_empty()))
    }
}
