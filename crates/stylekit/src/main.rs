//! Command-line entry point: compose, export, and inspect style config.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use log::{debug, info};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use stylekit::config::{ConfigLayerSource, LoadedStyleConfig, WriteOutcome};
use stylekit::{
    ContentPatterns, ExportFormat, Exporter, LoadOptions, MergePolicy, StyleConfig,
};

/// Command-line options for the stylekit CLI.
#[derive(Parser)]
#[command(name = "stylekit", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compose presets with the site config and print or write the result
    Compose {
        #[command(flatten)]
        site: SiteArgs,
        /// Output encoding
        #[arg(long, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List files matched by the effective content patterns
    Content {
        #[command(flatten)]
        site: SiteArgs,
        /// Directory scanned for content (defaults to the site config's directory)
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// List available preset names
    Presets {
        #[command(flatten)]
        site: SiteArgs,
    },
}

/// Options shared by commands that load a site config.
#[derive(Args, Clone)]
struct SiteArgs {
    /// Path to a stylekit.json5 site config (discovered from cwd when omitted)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Additional preset directory, searched before the defaults
    #[arg(long = "preset-dir")]
    preset_dirs: Vec<PathBuf>,
    /// Runtime override config applied after the site config
    #[arg(long = "override")]
    overrides: Vec<PathBuf>,
    /// User preset directory (defaults to ~/.stylekit/presets)
    #[arg(long, conflicts_with = "no_user_presets")]
    user_preset_dir: Option<PathBuf>,
    /// Skip the user preset directory entirely
    #[arg(long)]
    no_user_presets: bool,
    /// Nested merge policy
    #[arg(long, default_value_t = MergePolicy::Deep)]
    merge: MergePolicy,
}

impl SiteArgs {
    /// Relative paths resolve against `cwd`.
    fn load_options(&self, cwd: &Path) -> LoadOptions {
        let mut options = LoadOptions::new(cwd).with_policy(self.merge);
        options.config_path = self.config.as_deref().map(|path| cwd.join(path));
        options.preset_dirs = self.preset_dirs.iter().map(|dir| cwd.join(dir)).collect();
        options.runtime_paths = self.overrides.iter().map(|path| cwd.join(path)).collect();
        if self.no_user_presets {
            options = options.with_user_preset_dir(None);
        } else if let Some(dir) = &self.user_preset_dir {
            options = options.with_user_preset_dir(Some(cwd.join(dir)));
        }
        options
    }

    fn load(&self, cwd: &Path) -> anyhow::Result<LoadedStyleConfig> {
        StyleConfig::load_with_options(self.load_options(cwd))
            .context("failed to load style config")
    }
}

/// Entry point for the stylekit CLI.
fn main() -> anyhow::Result<()> {
    stylekit::init_logging();

    let cli = Cli::parse();
    let cwd = std::env::current_dir().context("failed to resolve current working directory")?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(cli.command, &cwd, &mut out)
}

fn run(command: Command, cwd: &Path, out: &mut impl Write) -> anyhow::Result<()> {
    match command {
        Command::Compose {
            site,
            format,
            output,
        } => {
            let loaded = site.load(cwd)?;
            let exporter = Exporter::new(format);
            match output.map(|path| cwd.join(path)) {
                Some(path) => {
                    let outcome = exporter
                        .write(&loaded.effective, &path)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!("compose finished (path={}, outcome={:?})", path.display(), outcome);
                    if outcome == WriteOutcome::Unchanged {
                        debug!("output already up to date");
                    }
                }
                None => {
                    let rendered = exporter
                        .render(&loaded.effective)
                        .context("failed to render config")?;
                    out.write_all(rendered.as_bytes())?;
                }
            }
        }
        Command::Content { site, root } => {
            let loaded = site.load(cwd)?;
            let root = match root {
                Some(root) => cwd.join(root),
                None => site_dir(&loaded).unwrap_or_else(|| cwd.to_path_buf()),
            };
            let patterns = ContentPatterns::from_config(&loaded.effective)
                .context("invalid content patterns")?;
            let files = patterns
                .matcher()
                .context("invalid content patterns")?
                .scan(&root)
                .with_context(|| format!("failed to scan {}", root.display()))?;
            for file in files {
                writeln!(out, "{}", file.display())?;
            }
        }
        Command::Presets { site } => {
            let options = site.load_options(cwd);
            let config_path = options
                .config_path
                .clone()
                .or_else(|| StyleConfig::discover(cwd).ok());
            let registry = options
                .build_registry(config_path.as_deref())
                .context("failed to load presets")?;
            for name in registry.names() {
                writeln!(out, "{name}")?;
            }
        }
    }
    Ok(())
}

/// Directory holding the site config, if it was loaded from disk.
fn site_dir(loaded: &LoadedStyleConfig) -> Option<PathBuf> {
    loaded
        .layers
        .iter()
        .find(|layer| layer.source == ConfigLayerSource::Site)
        .and_then(|layer| layer.path.as_deref())
        .and_then(Path::parent)
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn seed(root: &Path) {
        fs::create_dir_all(root.join("presets")).expect("presets");
        fs::create_dir_all(root.join("src")).expect("src");
        fs::write(
            root.join("presets").join("brand.json5"),
            "{ theme: { colors: { brand: '#0af' } } }",
        )
        .expect("preset");
        fs::write(
            root.join("stylekit.json5"),
            "{ presets: ['brand'], content: ['./src/**/*.ts'] }",
        )
        .expect("site");
        fs::write(root.join("src").join("main.ts"), "").expect("source");
    }

    /// Parse a command line that never reads the real user preset dir.
    fn parse(args: &[&str]) -> Command {
        let args = args.iter().copied().chain(["--no-user-presets"]);
        Cli::try_parse_from(args).expect("args").command
    }

    fn run_to_string(command: Command, cwd: &Path) -> String {
        let mut out = Vec::new();
        run(command, cwd, &mut out).expect("run");
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn compose_prints_effective_json() {
        let temp = TempDir::new().expect("tmp");
        seed(temp.path());
        let config = temp.path().join("stylekit.json5");
        let command = parse(&["stylekit", "compose", "--config", config.to_str().expect("path")]);

        let output = run_to_string(command, temp.path());
        let value: serde_json::Value = serde_json::from_str(&output).expect("json");
        assert_eq!(
            value,
            serde_json::json!({
                "content": ["./src/**/*.ts"],
                "theme": { "colors": { "brand": "#0af" } }
            })
        );
    }

    #[test]
    fn compose_writes_output_file() {
        let temp = TempDir::new().expect("tmp");
        seed(temp.path());
        let output = temp.path().join("out.yaml");
        let command = parse(&[
            "stylekit",
            "compose",
            "--format",
            "yaml",
            "--output",
            output.to_str().expect("path"),
        ]);

        let printed = run_to_string(command, temp.path());
        assert!(printed.is_empty());
        let written = fs::read_to_string(&output).expect("read");
        assert!(written.contains("brand:"));
        assert!(written.contains("#0af"));
    }

    #[test]
    fn content_lists_matching_files() {
        let temp = TempDir::new().expect("tmp");
        seed(temp.path());
        let output = run_to_string(parse(&["stylekit", "content"]), temp.path());
        assert_eq!(output, format!("{}\n", Path::new("src").join("main.ts").display()));
    }

    #[test]
    fn presets_lists_site_presets() {
        let temp = TempDir::new().expect("tmp");
        seed(temp.path());
        let output = run_to_string(parse(&["stylekit", "presets"]), temp.path());
        assert_eq!(output, "brand\n");
    }

    #[test]
    fn content_accepts_relative_config_path() {
        let temp = TempDir::new().expect("tmp");
        seed(temp.path());
        let command = parse(&["stylekit", "content", "--config", "stylekit.json5"]);
        let output = run_to_string(command, temp.path());
        assert_eq!(output, format!("{}\n", Path::new("src").join("main.ts").display()));
    }

    #[test]
    fn user_preset_dir_skips_broken_presets() {
        let temp = TempDir::new().expect("tmp");
        seed(temp.path());
        let user_dir = temp.path().join("home-presets");
        fs::create_dir_all(&user_dir).expect("user dir");
        fs::write(user_dir.join("broken.json5"), "{ theme: ").expect("broken");
        fs::write(user_dir.join("motion.json5"), "{ theme: { motion: true } }").expect("motion");

        let args = ["stylekit", "presets", "--user-preset-dir", "home-presets"];
        let command = Cli::try_parse_from(args).expect("args").command;
        let output = run_to_string(command, temp.path());
        assert_eq!(output, "brand\nmotion\n");
    }

    #[test]
    fn site_dir_ignores_bare_file_name() {
        let loaded = LoadedStyleConfig {
            effective: stylekit::Configuration::new(),
            registry: stylekit::config::PresetRegistry::new(),
            layers: vec![stylekit::config::ConfigLayer {
                source: ConfigLayerSource::Site,
                name: None,
                path: Some(PathBuf::from("stylekit.json5")),
            }],
        };
        assert_eq!(site_dir(&loaded), None);
    }

    #[test]
    fn user_preset_flags_conflict() {
        let args = ["stylekit", "presets", "--user-preset-dir", "x", "--no-user-presets"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn rejects_unknown_merge_policy() {
        assert!(Cli::try_parse_from(["stylekit", "compose", "--merge", "sideways"]).is_err());
    }
}
