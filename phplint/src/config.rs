//! `phplint.toml` configuration.
//!
//! ```toml
//! [analyzer]
//! max_load_depth = 16
//! naming_conventions = true
//! strict_arity = true
//!
//! [autoload]
//! psr4 = { "App\\" = ["src/"] }
//! classmap = { "Legacy_Thing" = "lib/legacy.php" }
//! include_path = ["lib"]
//!
//! [ignore]
//! kinds = ["NamingConventionViolation"]
//! files = { "vendor/legacy.php" = ["UndefinedName"] }
//! ```
//!
//! Relative paths are resolved against the directory holding the file.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analyze::DiagnosticKind;
use crate::error::ConfigError;

pub const CONFIG_FILE_NAME: &str = "phplint.toml";
pub const CONFIG_ENV_VAR: &str = "PHPLINT_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LintConfig {
    pub analyzer: AnalyzerConfig,
    pub autoload: AutoloadConfig,
    pub ignore: IgnoreConfig,
    /// Directory relative paths are resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Bound on nested autoload/include analysis
    pub max_load_depth: usize,
    pub naming_conventions: bool,
    /// Passing more arguments than a non-variadic function accepts is an error
    pub strict_arity: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_load_depth: 16,
            naming_conventions: true,
            strict_arity: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoloadConfig {
    /// Namespace prefix to base directories
    pub psr4: BTreeMap<String, Vec<PathBuf>>,
    /// Fully qualified class name to file
    pub classmap: BTreeMap<String, PathBuf>,
    /// Directories searched for relative `include`/`require` targets
    pub include_path: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreConfig {
    /// Kinds suppressed everywhere
    pub kinds: Vec<DiagnosticKind>,
    /// Kinds suppressed in specific files
    pub files: BTreeMap<String, Vec<DiagnosticKind>>,
}

impl LintConfig {
    /// Parse a config from TOML text
    pub fn from_toml(text: &str, base_dir: impl Into<PathBuf>) -> Result<Self, toml::de::Error> {
        let mut config: LintConfig = toml::from_str(text)?;
        config.base_dir = base_dir.into();
        Ok(config)
    }

    /// Load the config at `path`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self::from_toml(&text, base_dir).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Locate the config: an explicit path, then `PHPLINT_CONFIG`, then
    /// `phplint.toml` in `cwd`. Falls back to defaults when none exists.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        if let Some(path) = env::var_os(CONFIG_ENV_VAR).filter(|v| !v.is_empty()) {
            return Self::load(Path::new(&path));
        }
        let local = cwd.join(CONFIG_FILE_NAME);
        if local.is_file() {
            return Self::load(&local);
        }
        tracing::debug!(cwd = %cwd.display(), "no {} found, using defaults", CONFIG_FILE_NAME);
        Ok(LintConfig {
            base_dir: cwd.to_path_buf(),
            ..LintConfig::default()
        })
    }

    /// `path` resolved against the config directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Whether `kind` is suppressed for diagnostics located in `file`
    pub fn is_ignored(&self, kind: DiagnosticKind, file: &Path) -> bool {
        if kind == DiagnosticKind::NamingConventionViolation && !self.analyzer.naming_conventions {
            return true;
        }
        if self.ignore.kinds.contains(&kind) {
            return true;
        }
        self.ignore
            .files
            .iter()
            .any(|(pattern, kinds)| kinds.contains(&kind) && self.file_matches(Path::new(pattern), file))
    }

    fn file_matches(&self, pattern: &Path, file: &Path) -> bool {
        file == pattern || file.ends_with(pattern) || file == self.resolve(pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[analyzer]
max_load_depth = 4
strict_arity = false

[autoload]
psr4 = { "App\\" = ["src/"] }
classmap = { "Legacy_Thing" = "lib/legacy.php" }
include_path = ["lib"]

[ignore]
kinds = ["NamingConventionViolation"]
files = { "vendor/legacy.php" = ["UndefinedName"] }
"#;

    #[test]
    fn test_defaults() {
        let config = LintConfig::default();
        assert_eq!(config.analyzer.max_load_depth, 16);
        assert!(config.analyzer.naming_conventions);
        assert!(config.analyzer.strict_arity);
        assert!(config.autoload.psr4.is_empty());
    }

    #[test]
    fn test_parse_sample() {
        let config = LintConfig::from_toml(SAMPLE, "/project").unwrap();
        assert_eq!(config.analyzer.max_load_depth, 4);
        assert!(!config.analyzer.strict_arity);
        assert!(config.analyzer.naming_conventions);
        assert_eq!(
            config.autoload.psr4.get("App\\"),
            Some(&vec![PathBuf::from("src/")])
        );
        assert_eq!(
            config.resolve(&config.autoload.include_path[0]),
            PathBuf::from("/project/lib")
        );
    }

    #[test]
    fn test_ignore_rules() {
        let config = LintConfig::from_toml(SAMPLE, "/project").unwrap();
        let any = Path::new("/project/src/a.php");
        let legacy = Path::new("/project/vendor/legacy.php");
        assert!(config.is_ignored(DiagnosticKind::NamingConventionViolation, any));
        assert!(!config.is_ignored(DiagnosticKind::UndefinedName, any));
        assert!(config.is_ignored(DiagnosticKind::UndefinedName, legacy));
        assert!(!config.is_ignored(DiagnosticKind::NoSuchMember, legacy));
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let err = LintConfig::from_toml("[ignore]\nkinds = [\"Bogus\"]\n", ".");
        assert!(err.is_err());
    }

    #[test]
    fn test_discover_prefers_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[analyzer]\nmax_load_depth = 2\n").unwrap();
        let config = LintConfig::discover(Some(&path), dir.path()).unwrap();
        assert_eq!(config.analyzer.max_load_depth, 2);
        assert_eq!(config.base_dir, dir.path());
    }
}
