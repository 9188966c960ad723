//! Error types for preset loading, validation, and export.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned while loading, resolving, or exporting style config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading a config or preset file failed.
    #[error("failed to read config: {0}")]
    ReadFailed(#[from] std::io::Error),
    /// Parsing a config file failed.
    #[error("failed to parse config: {0}")]
    ParseFailed(#[from] json5::Error),
    /// Converting JSON values failed.
    #[error("failed to decode config: {0}")]
    DecodeFailed(#[from] serde_json::Error),
    /// Rendering YAML output failed.
    #[error("failed to encode config: {0}")]
    EncodeFailed(#[from] serde_yaml::Error),
    /// A specific field failed validation.
    #[error("invalid config at {path}: {message}")]
    InvalidField { path: String, message: String },
    /// A preset reference did not match any registered preset.
    #[error("unknown preset: {0}")]
    UnknownPreset(String),
    /// Two presets were registered under the same name.
    #[error("duplicate preset: {0}")]
    DuplicatePreset(String),
    /// Preset references form a cycle.
    #[error("preset cycle: {0}")]
    PresetCycle(String),
    /// A content pattern is not a valid glob.
    #[error("invalid content pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },
    /// Walking a content root failed.
    #[error("failed to scan {}: {source}", root.display())]
    WalkFailed {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    /// No site config file could be found.
    #[error("config not found: {}", .0.display())]
    NotFound(PathBuf),
}
