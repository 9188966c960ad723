//! Schema validation for the options stylekit itself interprets.
//!
//! Only `presets` and `content` are checked. Every other option belongs to
//! the build tool and passes through untouched.

use crate::{CONTENT_KEY, ConfigError, PRESETS_KEY};
use serde_json::{Map, Value};

/// Validate a single config layer or preset.
pub(super) fn validate_layer_schema(value: &Value, layer: &str) -> Result<(), ConfigError> {
    validate_object(value, layer, "")
}

fn validate_object(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;

    if let Some(value) = map.get("$schema") {
        expect_string(value, layer, &join_path(path, "$schema"))?;
    }
    // `presets: null` means no presets.
    if let Some(value) = map.get(PRESETS_KEY).filter(|value| !value.is_null()) {
        validate_presets(value, layer, &join_path(path, PRESETS_KEY))?;
    }
    if let Some(value) = map.get(CONTENT_KEY) {
        validate_content(value, layer, &join_path(path, CONTENT_KEY))?;
    }
    Ok(())
}

/// Validate the "presets" list: names or inline presets.
fn validate_presets(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let arr = expect_array(value, layer, path)?;
    for (idx, entry) in arr.iter().enumerate() {
        let entry_path = format!("{path}[{idx}]");
        match entry {
            Value::String(name) if name.trim().is_empty() => {
                return Err(invalid_field(layer, &entry_path, "preset name is empty"));
            }
            Value::String(_) => {}
            Value::Object(_) => validate_object(entry, layer, &entry_path)?,
            _ => {
                return Err(invalid_field(
                    layer,
                    &entry_path,
                    "expected preset name or object",
                ));
            }
        }
    }
    Ok(())
}

/// Validate the "content" option: a glob list or `{ files: [...] }`.
fn validate_content(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if let Value::Array(_) = value {
        return validate_string_array(value, layer, path);
    }
    let map = match value {
        Value::Object(map) => map,
        _ => return Err(invalid_field(layer, path, "expected array or object")),
    };
    ensure_allowed_keys(map, &["files", "relative", "extract", "transform"], layer, path)?;

    let files_path = join_path(path, "files");
    let files = map
        .get("files")
        .ok_or_else(|| invalid_field(layer, &files_path, "missing required field"))?;
    validate_string_array(files, layer, &files_path)?;
    if let Some(value) = map.get("relative") {
        expect_bool(value, layer, &join_path(path, "relative"))?;
    }
    if let Some(value) = map.get("extract") {
        expect_object(value, layer, &join_path(path, "extract"))?;
    }
    if let Some(value) = map.get("transform") {
        expect_object(value, layer, &join_path(path, "transform"))?;
    }
    Ok(())
}

/// Expect a JSON object or return a typed error.
fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(invalid_field(layer, path, "expected object")),
    }
}

/// Expect a JSON array or return a typed error.
fn expect_array<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Vec<Value>, ConfigError> {
    match value {
        Value::Array(arr) => Ok(arr),
        _ => Err(invalid_field(layer, path, "expected array")),
    }
}

/// Expect a JSON string or return a typed error.
fn expect_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.as_str().is_some() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected string"))
    }
}

/// Expect a JSON boolean or return a typed error.
fn expect_bool(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if matches!(value, Value::Bool(_)) {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected bool"))
    }
}

/// Validate that a value is an array of strings.
fn validate_string_array(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let arr = expect_array(value, layer, path)?;
    for (idx, entry) in arr.iter().enumerate() {
        if entry.as_str().is_none() {
            return Err(invalid_field(
                layer,
                &format!("{path}[{idx}]"),
                "expected string",
            ));
        }
    }
    Ok(())
}

/// Ensure an object contains only allowed keys.
fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    for key in map.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(invalid_field(layer, &join_path(path, key), "unknown key"));
        }
    }
    Ok(())
}

/// Join nested paths for better error messages.
fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Build a structured invalid-field error.
fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    let normalized_path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{layer}:{normalized_path}"),
        message: message.to_string(),
    }
}
