//! Shared helpers for integration tests
// Each test target uses a different subset of these helpers.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use phplint::analyze::{AnalysisSession, DiagnosticKind, Report};
use phplint::config::LintConfig;
use phplint::loader::{FsLoader, MemoryLoader};
use tempfile::TempDir;

/// A temporary directory holding `files` (relative path, contents)
pub fn create_test_files(files: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    for (name, content) in files {
        let path = temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&path, content).expect("Failed to write test file");
    }
    temp_dir
}

/// Config whose relative paths resolve against `dir`
pub fn config_in(dir: &Path, toml: &str) -> LintConfig {
    LintConfig::from_toml(toml, dir).expect("invalid test config")
}

/// Analyze `file` with a filesystem loader built from `config`
pub fn analyze_file(config: LintConfig, file: &Path) -> Report {
    let loader = FsLoader::from_config(&config);
    let mut session = AnalysisSession::new(config, Box::new(loader));
    session
        .analyze_file(file)
        .unwrap_or_else(|e| panic!("failed to analyze {}: {}", file.display(), e))
}

/// Analyze `source` as `/main.php` with virtual files available
pub fn analyze_with(loader: MemoryLoader, source: &str) -> Report {
    let mut session = AnalysisSession::new(LintConfig::default(), Box::new(loader));
    session.analyze_source(PathBuf::from("/main.php"), source)
}

pub fn kinds(report: &Report) -> Vec<DiagnosticKind> {
    report.kinds()
}
