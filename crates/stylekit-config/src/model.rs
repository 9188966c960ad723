//! Value model for style configuration.

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Option naming the presets a configuration builds on.
pub const PRESETS_KEY: &str = "presets";
/// Option holding the content patterns scanned by the build tool.
pub const CONTENT_KEY: &str = "content";

/// A mapping from option name to option value.
///
/// Values are arbitrary JSON: nested mappings, sequences, or scalars. The
/// build tool decides which options it recognizes; this type does not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration(Map<String, Value>);

impl Configuration {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Start building a configuration programmatically.
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::new()
    }

    /// Wrap a JSON value, rejecting anything that is not an object.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ConfigError::InvalidField {
                path: "root".to_string(),
                message: format!("expected object, found {}", value_kind(&other)),
            }),
        }
    }

    /// Look up a top-level option.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether a top-level option is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Set a top-level option, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Remove a top-level option.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Top-level option names.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub(crate) fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    /// Convert into a JSON object value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Split off the `presets` directive, leaving only the options that are
    /// handed to the build tool.
    pub fn take_preset_refs(&mut self) -> Result<Vec<PresetRef>, ConfigError> {
        match self.0.remove(PRESETS_KEY) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value).map_err(|err| {
                ConfigError::InvalidField {
                    path: PRESETS_KEY.to_string(),
                    message: err.to_string(),
                }
            }),
        }
    }
}

impl From<Map<String, Value>> for Configuration {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Configuration> for Value {
    fn from(config: Configuration) -> Self {
        config.into_value()
    }
}

impl FromIterator<(String, Value)> for Configuration {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Builder for assembling a `Configuration` in code.
#[derive(Debug, Default, Clone)]
pub struct ConfigurationBuilder {
    config: Configuration,
}

impl ConfigurationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an arbitrary option.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(key, value.into());
        self
    }

    /// Replace the content patterns.
    pub fn content<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| Value::String(pattern.into()))
            .collect();
        self.config.insert(CONTENT_KEY, Value::Array(patterns));
        self
    }

    /// Finalize and return the built `Configuration`.
    pub fn build(self) -> Configuration {
        self.config
    }
}

/// A named configuration fragment shared across consumers.
///
/// Cloning a preset shares the underlying configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    name: String,
    config: Arc<Configuration>,
}

impl Preset {
    pub fn new(name: impl Into<String>, config: Configuration) -> Self {
        Self {
            name: name.into(),
            config: Arc::new(config),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }
}

/// Reference to a preset from a `presets` option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PresetRef {
    /// A preset registered under this name.
    Named(String),
    /// A preset declared in place.
    Inline(Configuration),
}

impl From<&str> for PresetRef {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

/// How values under the same key combine during composition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergePolicy {
    /// A later value replaces the earlier one wholesale.
    Shallow,
    /// Nested mappings merge recursively; everything else is replaced.
    #[default]
    Deep,
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergePolicy::Shallow => f.write_str("shallow"),
            MergePolicy::Deep => f.write_str("deep"),
        }
    }
}

impl FromStr for MergePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "shallow" => Ok(MergePolicy::Shallow),
            "deep" => Ok(MergePolicy::Deep),
            other => Err(format!("unknown merge policy: {other}")),
        }
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
