//! IO helpers for reading config layers and presets from disk.

use super::{DEFAULT_CONFIG_DIR, DEFAULT_PRESET_DIR, schema};
use crate::{ConfigError, Configuration};
use directories::UserDirs;
use log::debug;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Read, validate, and wrap a JSON5 config file.
pub(crate) fn read_configuration(path: &Path, label: &str) -> Result<Configuration, ConfigError> {
    debug!("reading config layer (label={}, path={})", label, path.display());
    let contents = fs::read_to_string(path)?;
    parse_configuration(&contents, label)
}

/// Parse and validate JSON5 contents.
pub(crate) fn parse_configuration(contents: &str, label: &str) -> Result<Configuration, ConfigError> {
    let value: Value = json5::from_str(contents)?;
    schema::validate_layer_schema(&value, label)?;
    Configuration::from_value(value)
}

/// Build a user-friendly label for a layer on disk.
pub(super) fn layer_label(kind: &str, path: &Path) -> String {
    format!("{kind}({})", path.display())
}

/// Default user preset directory under the home directory.
pub(super) fn default_user_preset_dir() -> Option<PathBuf> {
    UserDirs::new().map(|dirs| {
        dirs.home_dir()
            .join(DEFAULT_CONFIG_DIR)
            .join(DEFAULT_PRESET_DIR)
    })
}
