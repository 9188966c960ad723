//! Canonical rendering of the effective configuration.
//!
//! The build tool reads a single value at startup and again on every
//! rebuild, so rendering must be byte-stable: keys are emitted in sorted
//! order regardless of how the value was assembled.

use crate::{ConfigError, Configuration};
use log::{debug, info};
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Output encoding for the effective configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Json,
    Yaml,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Json => f.write_str("json"),
            ExportFormat::Yaml => f.write_str("yaml"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "yaml" | "yml" => Ok(ExportFormat::Yaml),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

/// Result of writing an export to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file was created or its contents changed.
    Written,
    /// The file already held identical bytes.
    Unchanged,
}

/// Renders and writes the effective configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exporter {
    format: ExportFormat,
}

impl Exporter {
    pub fn new(format: ExportFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }

    /// Render `config` as pretty, key-sorted text ending in a newline.
    pub fn render(&self, config: &Configuration) -> Result<String, ConfigError> {
        let value = canonicalize(&Value::Object(config.as_map().clone()));
        let mut rendered = match self.format {
            ExportFormat::Json => serde_json::to_string_pretty(&value)?,
            ExportFormat::Yaml => serde_yaml::to_string(&value)?,
        };
        if !rendered.ends_with('\n') {
            rendered.push('\n');
        }
        Ok(rendered)
    }

    /// Write `config` to `path`, leaving the file alone when nothing changed.
    pub fn write(
        &self,
        config: &Configuration,
        path: impl AsRef<Path>,
    ) -> Result<WriteOutcome, ConfigError> {
        let path = path.as_ref();
        let rendered = self.render(config)?;
        match fs::read(path) {
            Ok(existing) if existing == rendered.as_bytes() => {
                debug!("export unchanged (path={})", path.display());
                return Ok(WriteOutcome::Unchanged);
            }
            Ok(_) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(ConfigError::ReadFailed(err)),
        }
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, rendered.as_bytes())?;
        info!(
            "exported config (path={}, format={}, bytes={})",
            path.display(),
            self.format,
            rendered.len()
        );
        Ok(WriteOutcome::Written)
    }
}

/// Rebuild a value with every object's keys in sorted order.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|(left, _), (right, _)| left.cmp(right));
            let mut sorted = Map::new();
            for (key, value) in entries {
                sorted.insert(key.clone(), canonicalize(value));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
