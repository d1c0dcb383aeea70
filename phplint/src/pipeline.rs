//! Source text to report.
//!
//! Parsing happens here so the engine only ever sees error-free trees;
//! parse errors surface as `SyntaxError` diagnostics instead.

use std::fs;
use std::path::{Path, PathBuf};

use phplint_parser::CstNode;

use crate::analyze::{AnalysisSession, Diagnostic, DiagnosticKind, Report};
use crate::config::LintConfig;
use crate::error::LoadError;
use crate::loader::Loader;
use crate::span::Location;

/// Parse `source`, or the syntax diagnostics that prevent analysis
pub fn parse_source(path: &Path, source: &str) -> Result<CstNode, Vec<Diagnostic>> {
    let (root, errors) = phplint_parser::parse_with_errors(source);
    if errors.is_empty() && !root.has_error() {
        return Ok(root);
    }
    let mut diagnostics: Vec<Diagnostic> = errors
        .iter()
        .map(|e| {
            Diagnostic::new(
                DiagnosticKind::SyntaxError,
                Location::from_span(path, e.span()),
                e.to_string(),
            )
        })
        .collect();
    if diagnostics.is_empty() {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::SyntaxError,
            Location::from_span(path, &root.span),
            "syntax error",
        ));
    }
    Err(diagnostics)
}

/// Analyze a single source text in a fresh session
pub fn analyze_source(
    path: impl Into<PathBuf>,
    source: &str,
    config: LintConfig,
    loader: Box<dyn Loader>,
) -> Report {
    let mut session = AnalysisSession::new(config, loader);
    session.analyze_source(path, source)
}

/// `*.php` files under `paths`, sorted; plain files are taken as given
pub fn collect_php_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>, LoadError> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            walk(path, &mut files)?;
        } else if path.exists() {
            files.push(path.clone());
        } else {
            return Err(LoadError::NotFound { path: path.clone() });
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), LoadError> {
    let entries = fs::read_dir(dir).map_err(|e| LoadError::io(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| LoadError::io(dir, e))?.path();
        if path.is_dir() {
            walk(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "php") {
            files.push(path);
        }
    }
    Ok(())
}

/// Analyze every file of `paths` in one shared session.
///
/// Reports come back filtered by the config's ignore rules, including the
/// reports of files loaded along the way.
pub fn analyze_paths(
    paths: &[PathBuf],
    config: LintConfig,
    loader: Box<dyn Loader>,
) -> Result<Vec<Report>, LoadError> {
    let files = collect_php_files(paths)?;
    let mut session = AnalysisSession::new(config, loader);
    for file in &files {
        session.analyze_file(file)?;
    }
    let config = session.config().clone();
    Ok(session.reports().map(|r| r.filtered(&config)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::NullLoader;

    #[test]
    fn test_parse_errors_become_syntax_diagnostics() {
        let diagnostics = parse_source(Path::new("a.php"), "<?php $x = ;").unwrap_err();
        assert!(!diagnostics.is_empty());
        assert!(diagnostics
            .iter()
            .all(|d| d.kind == DiagnosticKind::SyntaxError));
        assert_eq!(diagnostics[0].location.file, PathBuf::from("a.php"));
    }

    #[test]
    fn test_analyze_source_clean() {
        let report = analyze_source(
            "a.php",
            "<?php $foo = '1234'; echo $foo;",
            LintConfig::default(),
            Box::new(NullLoader),
        );
        assert!(report.success);
        assert!(report.diagnostics.is_empty());
    }
}
