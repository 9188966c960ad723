//! Named preset storage and resolution.

use crate::loader::layer_io;
use crate::{ConfigError, Configuration, PRESETS_KEY, Preset, PresetRef};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Name given to presets declared inline in a `presets` option.
pub const INLINE_PRESET_NAME: &str = "<inline>";

/// File extensions recognized as preset files.
const PRESET_EXTENSIONS: &[&str] = &["json5", "json"];

/// Holds named presets and expands preset references.
#[derive(Debug, Clone, Default)]
pub struct PresetRegistry {
    presets: BTreeMap<String, Preset>,
}

impl PresetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a preset under `name`. Names are unique.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        config: Configuration,
    ) -> Result<&Preset, ConfigError> {
        let name = name.into();
        if self.presets.contains_key(&name) {
            return Err(ConfigError::DuplicatePreset(name));
        }
        debug!("registered preset (name={}, keys={})", name, config.len());
        let preset = Preset::new(name.clone(), config);
        Ok(self.presets.entry(name).or_insert(preset))
    }

    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.presets.get(name)
    }

    /// Registered preset names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.presets.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Move presets from `other` whose names are not yet registered.
    /// Returns the names that were already taken.
    pub fn absorb(&mut self, other: PresetRegistry) -> Vec<String> {
        let mut shadowed = Vec::new();
        for (name, preset) in other.presets {
            if self.presets.contains_key(&name) {
                shadowed.push(name);
            } else {
                self.presets.insert(name, preset);
            }
        }
        shadowed
    }

    /// Register every preset file directly inside `dir`, named by file stem.
    ///
    /// A missing directory registers nothing. Returns the number of presets
    /// added.
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize, ConfigError> {
        self.load_dir_with(dir.as_ref(), false)
    }

    /// Like [`load_dir`](Self::load_dir), but a preset file that cannot be
    /// read, parsed, or registered is logged and skipped.
    pub fn load_dir_skipping_invalid(
        &mut self,
        dir: impl AsRef<Path>,
    ) -> Result<usize, ConfigError> {
        self.load_dir_with(dir.as_ref(), true)
    }

    fn load_dir_with(&mut self, dir: &Path, skip_invalid: bool) -> Result<usize, ConfigError> {
        if !dir.is_dir() {
            debug!("preset dir missing (path={})", dir.display());
            return Ok(0);
        }

        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let is_preset = path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| PRESET_EXTENSIONS.contains(&ext));
            if is_preset {
                paths.push(path);
            }
        }
        paths.sort();

        let mut added = 0;
        for path in paths {
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let loaded = layer_io::read_configuration(&path, &format!("preset({name})"))
                .and_then(|config| self.register(name, config).map(|_| ()));
            match loaded {
                Ok(()) => added += 1,
                Err(err) if skip_invalid => {
                    warn!("skipping invalid preset (path={}, error={})", path.display(), err);
                }
                Err(err) => return Err(err),
            }
        }
        info!(
            "loaded presets from dir (path={}, count={})",
            dir.display(),
            added
        );
        Ok(added)
    }

    /// Expand references into the flat, lowest-precedence-first order used
    /// for composition.
    ///
    /// A preset's own `presets` option expands before the preset itself, and
    /// is stripped from the resolved configuration.
    pub fn resolve(&self, refs: &[PresetRef]) -> Result<Vec<Preset>, ConfigError> {
        let mut resolved = Vec::new();
        let mut chain = Vec::new();
        for preset_ref in refs {
            self.resolve_ref(preset_ref, &mut chain, &mut resolved)?;
        }
        debug!(
            "resolved presets (refs={}, resolved={})",
            refs.len(),
            resolved.len()
        );
        Ok(resolved)
    }

    fn resolve_ref(
        &self,
        preset_ref: &PresetRef,
        chain: &mut Vec<String>,
        resolved: &mut Vec<Preset>,
    ) -> Result<(), ConfigError> {
        match preset_ref {
            PresetRef::Named(name) => {
                if chain.iter().any(|seen| seen == name) {
                    let mut cycle = chain.clone();
                    cycle.push(name.clone());
                    return Err(ConfigError::PresetCycle(cycle.join(" -> ")));
                }
                let preset = self
                    .get(name)
                    .ok_or_else(|| ConfigError::UnknownPreset(name.clone()))?;
                if !preset.config().contains_key(PRESETS_KEY) {
                    resolved.push(preset.clone());
                    return Ok(());
                }

                let mut config = preset.config().clone();
                let nested = config.take_preset_refs()?;
                chain.push(name.clone());
                for nested_ref in &nested {
                    self.resolve_ref(nested_ref, chain, resolved)?;
                }
                chain.pop();
                resolved.push(Preset::new(name.clone(), config));
            }
            PresetRef::Inline(config) => {
                let mut config = config.clone();
                let nested = config.take_preset_refs()?;
                for nested_ref in &nested {
                    self.resolve_ref(nested_ref, chain, resolved)?;
                }
                resolved.push(Preset::new(INLINE_PRESET_NAME, config));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn config(value: serde_json::Value) -> Configuration {
        Configuration::from_value(value).expect("object")
    }

    fn names(presets: &[Preset]) -> Vec<&str> {
        presets.iter().map(Preset::name).collect()
    }

    #[test]
    fn rejects_duplicate_names() {
        let mut registry = PresetRegistry::new();
        registry.register("brand", Configuration::new()).expect("first");
        let err = registry.register("brand", Configuration::new()).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicatePreset(name) if name == "brand"));
    }

    #[test]
    fn nested_presets_expand_first() {
        let mut registry = PresetRegistry::new();
        registry
            .register("base", config(json!({ "prefix": "" })))
            .expect("base");
        registry
            .register(
                "brand",
                config(json!({ "presets": ["base"], "theme": { "brand": "#111" } })),
            )
            .expect("brand");
        registry
            .register("motion", config(json!({ "theme": { "motion": true } })))
            .expect("motion");

        let resolved = registry
            .resolve(&["brand".into(), "motion".into()])
            .expect("resolve");
        assert_eq!(names(&resolved), vec!["base", "brand", "motion"]);
        assert!(!resolved[1].config().contains_key(PRESETS_KEY));
    }

    #[test]
    fn inline_presets_resolve_in_place() {
        let mut registry = PresetRegistry::new();
        registry.register("base", Configuration::new()).expect("base");

        let inline = PresetRef::Inline(config(json!({ "presets": ["base"], "important": true })));
        let resolved = registry.resolve(&[inline]).expect("resolve");
        assert_eq!(names(&resolved), vec!["base", INLINE_PRESET_NAME]);
        assert_eq!(resolved[1].config().get("important"), Some(&json!(true)));
    }

    #[test]
    fn unknown_preset_is_reported() {
        let registry = PresetRegistry::new();
        let err = registry.resolve(&["missing".into()]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPreset(name) if name == "missing"));
    }

    #[test]
    fn cycles_are_reported_with_chain() {
        let mut registry = PresetRegistry::new();
        registry
            .register("a", config(json!({ "presets": ["b"] })))
            .expect("a");
        registry
            .register("b", config(json!({ "presets": ["a"] })))
            .expect("b");

        let err = registry.resolve(&["a".into()]).unwrap_err();
        assert_eq!(format!("{err}"), "preset cycle: a -> b -> a");
    }

    #[test]
    fn repeated_reference_is_not_a_cycle() {
        let mut registry = PresetRegistry::new();
        registry.register("base", Configuration::new()).expect("base");
        let resolved = registry
            .resolve(&["base".into(), "base".into()])
            .expect("resolve");
        assert_eq!(names(&resolved), vec!["base", "base"]);
    }

    #[test]
    fn absorb_keeps_existing_names() {
        let mut registry = PresetRegistry::new();
        registry
            .register("brand", config(json!({ "prefix": "first" })))
            .expect("brand");
        let mut other = PresetRegistry::new();
        other
            .register("brand", config(json!({ "prefix": "second" })))
            .expect("brand");
        other.register("motion", Configuration::new()).expect("motion");

        let shadowed = registry.absorb(other);
        assert_eq!(shadowed, vec!["brand".to_string()]);
        assert_eq!(registry.names(), vec!["brand", "motion"]);
        assert_eq!(
            registry.get("brand").expect("brand").config().get("prefix"),
            Some(&json!("first"))
        );
    }

    #[test]
    fn load_dir_registers_by_file_stem() {
        let temp = TempDir::new().expect("tmp");
        fs::write(temp.path().join("brand.json5"), "{ theme: { brand: '#111' } }").expect("write");
        fs::write(temp.path().join("plain.json"), r#"{ "prefix": "tw-" }"#).expect("write");
        fs::write(temp.path().join("notes.txt"), "ignored").expect("write");

        let mut registry = PresetRegistry::new();
        let added = registry.load_dir(temp.path()).expect("load");
        assert_eq!(added, 2);
        assert_eq!(registry.names(), vec!["brand", "plain"]);
        assert_eq!(
            registry.get("plain").expect("plain").config().get("prefix"),
            Some(&json!("tw-"))
        );
    }

    #[test]
    fn load_dir_fails_on_invalid_preset() {
        let temp = TempDir::new().expect("tmp");
        fs::write(temp.path().join("bad.json5"), "{ broken").expect("write");

        let mut registry = PresetRegistry::new();
        let err = registry.load_dir(temp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseFailed(_)));
    }

    #[test]
    fn lenient_load_skips_invalid_presets() {
        let temp = TempDir::new().expect("tmp");
        fs::write(temp.path().join("bad.json5"), "{ broken").expect("write");
        fs::write(temp.path().join("shape.json5"), "{ content: 'src' }").expect("write");
        fs::write(temp.path().join("motion.json5"), "{ theme: { motion: true } }").expect("write");

        let mut registry = PresetRegistry::new();
        let added = registry
            .load_dir_skipping_invalid(temp.path())
            .expect("load");
        assert_eq!(added, 1);
        assert_eq!(registry.names(), vec!["motion"]);
    }

    #[test]
    fn load_dir_skips_missing_directory() {
        let temp = TempDir::new().expect("tmp");
        let mut registry = PresetRegistry::new();
        let added = registry.load_dir(temp.path().join("nope")).expect("load");
        assert_eq!(added, 0);
        assert!(registry.is_empty());
    }
}
