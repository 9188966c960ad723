//! Content patterns: which source files the build tool scans.

use crate::{CONTENT_KEY, ConfigError, Configuration};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use log::{debug, info};
use serde_json::Value;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Prefix marking a pattern as an exclusion.
const NEGATION_PREFIX: char = '!';

/// Ordered glob patterns taken from the `content` option.
///
/// Order carries no meaning and duplicates are kept as written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentPatterns {
    patterns: Vec<String>,
}

impl ContentPatterns {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    /// Read patterns from a configuration's `content` option.
    ///
    /// Accepts either a list of strings or `{ files: [...] }`. A missing
    /// option yields no patterns.
    pub fn from_config(config: &Configuration) -> Result<Self, ConfigError> {
        let Some(value) = config.get(CONTENT_KEY) else {
            return Ok(Self::default());
        };
        let (files, path) = match value {
            Value::Object(map) => match map.get("files") {
                Some(files) => (files, format!("{CONTENT_KEY}.files")),
                None => return Ok(Self::default()),
            },
            other => (other, CONTENT_KEY.to_string()),
        };
        let Value::Array(entries) = files else {
            return Err(ConfigError::InvalidField {
                path,
                message: "expected array".to_string(),
            });
        };
        let mut patterns = Vec::with_capacity(entries.len());
        for (idx, entry) in entries.iter().enumerate() {
            match entry.as_str() {
                Some(pattern) => patterns.push(pattern.to_string()),
                None => {
                    return Err(ConfigError::InvalidField {
                        path: format!("{path}[{idx}]"),
                        message: "expected string".to_string(),
                    });
                }
            }
        }
        Ok(Self { patterns })
    }

    pub fn as_slice(&self) -> &[String] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Compile the patterns into a matcher.
    pub fn matcher(&self) -> Result<ContentMatcher, ConfigError> {
        let mut include = GlobSetBuilder::new();
        let mut exclude = GlobSetBuilder::new();
        let mut include_count = 0;
        for raw in &self.patterns {
            let (negated, pattern) = match raw.strip_prefix(NEGATION_PREFIX) {
                Some(rest) => (true, rest),
                None => (false, raw.as_str()),
            };
            let glob = GlobBuilder::new(normalize(pattern))
                .literal_separator(true)
                .build()
                .map_err(|err| ConfigError::InvalidPattern {
                    pattern: raw.clone(),
                    message: err.kind().to_string(),
                })?;
            if negated {
                exclude.add(glob);
            } else {
                include.add(glob);
                include_count += 1;
            }
        }
        let build = |builder: GlobSetBuilder| {
            builder
                .build()
                .map_err(|err| ConfigError::InvalidPattern {
                    pattern: err.glob().unwrap_or_default().to_string(),
                    message: err.kind().to_string(),
                })
        };
        debug!(
            "compiled content patterns (include={}, exclude={})",
            include_count,
            self.patterns.len() - include_count
        );
        Ok(ContentMatcher {
            include: build(include)?,
            exclude: build(exclude)?,
        })
    }
}

/// Compiled include/exclude glob sets.
#[derive(Debug, Clone)]
pub struct ContentMatcher {
    include: GlobSet,
    exclude: GlobSet,
}

impl ContentMatcher {
    /// Whether a path relative to the content root should be scanned.
    pub fn is_match(&self, relative: impl AsRef<Path>) -> bool {
        let relative = relative.as_ref();
        let relative = relative.strip_prefix(".").unwrap_or(relative);
        self.include.is_match(relative) && !self.exclude.is_match(relative)
    }

    /// Walk `root` and return matching files relative to it, sorted.
    pub fn scan(&self, root: impl AsRef<Path>) -> Result<Vec<PathBuf>, ConfigError> {
        let root = root.as_ref();
        let mut matches = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|source| ConfigError::WalkFailed {
                root: root.to_path_buf(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            if self.is_match(relative) {
                matches.push(relative.to_path_buf());
            }
        }
        matches.sort();
        info!(
            "content scan completed (root={}, matches={})",
            root.display(),
            matches.len()
        );
        Ok(matches)
    }
}

/// Drop a leading `./` so patterns line up with root-relative paths.
fn normalize(pattern: &str) -> &str {
    let mut pattern = pattern;
    while let Some(rest) = pattern.strip_prefix("./") {
        pattern = rest;
    }
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn config(value: Value) -> Configuration {
        Configuration::from_value(value).expect("object")
    }

    #[test]
    fn reads_list_and_files_forms() {
        let list = config(json!({ "content": ["./src/**/*.ts", "./src/**/*.ts"] }));
        assert_eq!(
            ContentPatterns::from_config(&list).expect("list").as_slice(),
            ["./src/**/*.ts", "./src/**/*.ts"]
        );

        let files = config(json!({ "content": { "files": ["./app/**/*.tsx"], "relative": true } }));
        assert_eq!(
            ContentPatterns::from_config(&files).expect("files").as_slice(),
            ["./app/**/*.tsx"]
        );

        assert!(ContentPatterns::from_config(&Configuration::new())
            .expect("missing")
            .is_empty());
    }

    #[test]
    fn rejects_non_string_entries() {
        let bad = config(json!({ "content": ["./src/**/*.ts", 7] }));
        let err = ContentPatterns::from_config(&bad).unwrap_err();
        assert_eq!(format!("{err}"), "invalid config at content[1]: expected string");
    }

    #[test]
    fn matches_includes_minus_excludes() {
        let matcher = ContentPatterns::new(["./src/**/*.{ts,tsx}", "!./src/**/*.test.ts"])
            .matcher()
            .expect("matcher");
        assert!(matcher.is_match("src/index.ts"));
        assert!(matcher.is_match("src/components/button.tsx"));
        assert!(matcher.is_match("./src/app.ts"));
        assert!(!matcher.is_match("src/app.test.ts"));
        assert!(!matcher.is_match("lib/index.ts"));
    }

    #[test]
    fn single_star_stays_within_directory() {
        let matcher = ContentPatterns::new(["src/*.ts"]).matcher().expect("matcher");
        assert!(matcher.is_match("src/index.ts"));
        assert!(!matcher.is_match("src/nested/index.ts"));
    }

    #[test]
    fn invalid_glob_is_reported() {
        let err = ContentPatterns::new(["src/[.ts"]).matcher().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { pattern, .. } if pattern == "src/[.ts"));
    }

    #[test]
    fn empty_patterns_match_nothing() {
        let matcher = ContentPatterns::default().matcher().expect("matcher");
        assert!(!matcher.is_match("src/index.ts"));
    }

    #[test]
    fn scan_reports_walk_failures_against_the_root() {
        let temp = TempDir::new().expect("tmp");
        let missing = temp.path().join("missing");
        let err = ContentPatterns::new(["**/*.ts"])
            .matcher()
            .expect("matcher")
            .scan(&missing)
            .unwrap_err();
        assert!(matches!(&err, ConfigError::WalkFailed { root, .. } if root == &missing));
        assert!(format!("{err}").starts_with("failed to scan "));
    }

    #[test]
    fn scan_returns_sorted_relative_paths() {
        let temp = TempDir::new().expect("tmp");
        let root = temp.path();
        for path in ["src/b.ts", "src/a.ts", "src/nested/c.ts", "src/style.css", "README.md"] {
            let full = root.join(path);
            fs::create_dir_all(full.parent().expect("parent")).expect("dir");
            fs::write(full, "").expect("write");
        }

        let found = ContentPatterns::new(["./src/**/*.ts"])
            .matcher()
            .expect("matcher")
            .scan(root)
            .expect("scan");
        assert_eq!(
            found,
            vec![
                PathBuf::from("src/a.ts"),
                PathBuf::from("src/b.ts"),
                PathBuf::from("src/nested/c.ts"),
            ]
        );
    }
}
