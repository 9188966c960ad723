//! Site config loading, preset discovery, and composition.
//!
//! A site config file names the presets it builds on and carries the local
//! overrides. Loading builds the preset registry from the preset
//! directories, resolves the site's presets, applies runtime overrides, and
//! composes the effective configuration.

pub(crate) mod layer_io;
mod schema;
mod utils;


use crate::{
    Composer, ConfigError, Configuration, MergePolicy, Preset, PresetRef, PresetRegistry,
};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default site config filename.
pub const DEFAULT_CONFIG_FILE: &str = "stylekit.json5";
/// Default config directory under the user's home.
pub const DEFAULT_CONFIG_DIR: &str = ".stylekit";
/// Preset directory name next to a site config or under the user dir.
pub const DEFAULT_PRESET_DIR: &str = "presets";

/// A parsed site config: its preset references plus local overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleConfig {
    /// Location on disk, when loaded from a file.
    pub path: Option<PathBuf>,
    /// Presets named by the site, lowest precedence first.
    pub presets: Vec<PresetRef>,
    /// Options set by the site itself.
    pub overrides: Configuration,
}

/// Effective config plus metadata about what contributed to it.
#[derive(Debug, Clone)]
pub struct LoadedStyleConfig {
    /// The composed configuration handed to the build tool.
    pub effective: Configuration,
    /// Registry used to resolve preset names.
    pub registry: PresetRegistry,
    /// Each contribution, lowest precedence first.
    pub layers: Vec<ConfigLayer>,
}

/// Origin for a single contribution to the effective config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    /// A resolved preset.
    Preset,
    /// The site config file.
    Site,
    /// Runtime overrides (highest precedence).
    Runtime,
}

/// Metadata about a config layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayer {
    pub source: ConfigLayerSource,
    /// Preset name, for preset layers.
    pub name: Option<String>,
    /// Location on disk if known.
    pub path: Option<PathBuf>,
}

/// Options controlling config discovery, preset lookup, and overrides.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Working directory used to discover the site config.
    pub cwd: PathBuf,
    /// Explicit site config path; discovered from `cwd` when unset.
    pub config_path: Option<PathBuf>,
    /// Extra preset directories, searched before the defaults.
    pub preset_dirs: Vec<PathBuf>,
    /// User preset directory (defaults to `~/.stylekit/presets`).
    pub user_preset_dir: Option<PathBuf>,
    /// Runtime override config paths applied after the site config.
    pub runtime_paths: Vec<PathBuf>,
    /// Nested merge policy for composition.
    pub policy: MergePolicy,
}

impl LoadOptions {
    /// Create options with default locations for the provided cwd.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            config_path: None,
            preset_dirs: Vec::new(),
            user_preset_dir: layer_io::default_user_preset_dir(),
            runtime_paths: Vec::new(),
            policy: MergePolicy::default(),
        }
    }

    /// Use an explicit site config file.
    pub fn with_config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Add a preset directory searched before the defaults.
    pub fn with_preset_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.preset_dirs.push(dir.as_ref().to_path_buf());
        self
    }

    /// Add a runtime override config path that is applied last.
    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }

    pub fn with_policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set or clear the user preset directory.
    pub fn with_user_preset_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.user_preset_dir = dir;
        self
    }

    /// Build the preset registry for a site config at `config_path`.
    ///
    /// Search order: explicit preset dirs, `presets/` beside the site config,
    /// then the user preset dir. A broken file in the user dir is skipped
    /// with a warning; anywhere else it fails the load.
    pub fn build_registry(
        &self,
        config_path: Option<&Path>,
    ) -> Result<PresetRegistry, ConfigError> {
        let mut dirs = self.preset_dirs.clone();
        if let Some(site_dir) = config_path.and_then(Path::parent) {
            dirs.push(site_dir.join(DEFAULT_PRESET_DIR));
        }
        build_registry(&dirs, self.user_preset_dir.as_deref())
    }
}

impl StyleConfig {
    /// Parse a site config from JSON5 contents.
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading site config from raw contents (len={})", contents.len());
        let overrides = layer_io::parse_configuration(contents, "site")?;
        Self::from_configuration(overrides, None)
    }

    /// Parse a site config file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("loading site config from path: {}", path.display());
        let label = layer_io::layer_label("site", path);
        let overrides = layer_io::read_configuration(path, &label)?;
        Self::from_configuration(overrides, Some(path.to_path_buf()))
    }

    fn from_configuration(
        mut overrides: Configuration,
        path: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let presets = overrides.take_preset_refs()?;
        Ok(Self {
            path,
            presets,
            overrides,
        })
    }

    /// Find the nearest site config file at or above `cwd`.
    pub fn discover(cwd: impl AsRef<Path>) -> Result<PathBuf, ConfigError> {
        let cwd = utils::normalize_path(cwd.as_ref())?;
        match utils::find_config_file(&cwd, DEFAULT_CONFIG_FILE) {
            Some(path) => {
                debug!("discovered site config: {}", path.display());
                Ok(path)
            }
            None => Err(ConfigError::NotFound(cwd.join(DEFAULT_CONFIG_FILE))),
        }
    }

    /// Resolve this site's presets and compose them with its overrides.
    pub fn compose(
        &self,
        registry: &PresetRegistry,
        composer: &Composer,
    ) -> Result<Configuration, ConfigError> {
        let presets = registry.resolve(&self.presets)?;
        Ok(composer.compose(presets.iter().map(Preset::config), &self.overrides))
    }

    /// Load with default locations for `cwd`.
    pub fn load(cwd: impl AsRef<Path>) -> Result<LoadedStyleConfig, ConfigError> {
        Self::load_with_options(LoadOptions::new(cwd))
    }

    /// Load the site config, build the registry, and compose.
    ///
    /// Precedence (low -> high): presets in resolution order, site
    /// overrides, runtime overrides.
    pub fn load_with_options(options: LoadOptions) -> Result<LoadedStyleConfig, ConfigError> {
        let config_path = match options.config_path.as_deref() {
            Some(path) => path.to_path_buf(),
            None => Self::discover(&options.cwd)?,
        };
        let site = Self::load_from_path(&config_path)?;

        let registry = options.build_registry(Some(&config_path))?;

        let composer = Composer::new(options.policy);
        let mut preset_refs = site.presets.clone();
        let mut overrides = site.overrides.clone();
        let mut runtime_layers = Vec::new();
        for runtime_path in &options.runtime_paths {
            let runtime = Self::load_from_path(runtime_path)?;
            debug!("loaded runtime layer (path={})", runtime_path.display());
            preset_refs.extend(runtime.presets);
            composer.apply(&mut overrides, &runtime.overrides);
            runtime_layers.push(ConfigLayer {
                source: ConfigLayerSource::Runtime,
                name: None,
                path: Some(runtime_path.clone()),
            });
        }

        let presets = registry.resolve(&preset_refs)?;
        let mut layers: Vec<ConfigLayer> = presets
            .iter()
            .map(|preset| ConfigLayer {
                source: ConfigLayerSource::Preset,
                name: Some(preset.name().to_string()),
                path: None,
            })
            .collect();
        layers.push(ConfigLayer {
            source: ConfigLayerSource::Site,
            name: None,
            path: Some(config_path),
        });
        layers.extend(runtime_layers);

        let effective = composer.compose(presets.iter().map(Preset::config), &overrides);
        info!(
            "style config loaded (layers={}, presets={}, policy={})",
            layers.len(),
            presets.len(),
            options.policy
        );
        Ok(LoadedStyleConfig {
            effective,
            registry,
            layers,
        })
    }
}

/// Load presets from each directory into one registry; earlier
/// directories shadow later ones when a name appears twice. Lenient
/// directories skip preset files that fail to load.
fn build_registry(
    dirs: &[PathBuf],
    lenient: Option<&Path>,
) -> Result<PresetRegistry, ConfigError> {
    let mut registry = PresetRegistry::new();
    let mut seen_dirs = HashSet::new();
    let dirs = dirs.iter().map(|dir| (dir.as_path(), false));
    for (dir, skip_invalid) in dirs.chain(lenient.map(|dir| (dir, true))) {
        if !seen_dirs.insert(utils::unique_path(dir)) {
            debug!("skipping duplicate preset dir (path={})", dir.display());
            continue;
        }
        let mut dir_registry = PresetRegistry::new();
        if skip_invalid {
            dir_registry.load_dir_skipping_invalid(dir)?;
        } else {
            dir_registry.load_dir(dir)?;
        }
        for name in registry.absorb(dir_registry) {
            warn!(
                "preset shadowed by earlier dir (name={}, path={})",
                name,
                dir.display()
            );
        }
    }
    Ok(registry)
}
