//! Style configuration model, preset registry, and composition.
//!
//! This crate owns the configuration value model, named preset storage,
//! the merge rules that combine presets with site overrides, canonical
//! export, and content pattern matching used by the `stylekit` CLI.

mod compose;
mod content;
mod error;
mod export;
mod loader;
mod model;
mod registry;

/// Preset + override composition.
pub use compose::Composer;
/// Content pattern extraction and matching.
pub use content::{ContentMatcher, ContentPatterns};
/// Public error type returned by loading, resolution, and export APIs.
pub use error::ConfigError;
/// Canonical rendering of the effective configuration.
pub use export::{ExportFormat, Exporter, WriteOutcome};
/// Site config loading and layer metadata.
pub use loader::{
    ConfigLayer, ConfigLayerSource, DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILE, DEFAULT_PRESET_DIR,
    LoadOptions, LoadedStyleConfig, StyleConfig,
};
/// Configuration value model.
pub use model::*;
/// Named preset storage.
pub use registry::{INLINE_PRESET_NAME, PresetRegistry};
