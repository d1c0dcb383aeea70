//! One analysis run over a set of files.
//!
//! An [`AnalysisSession`] owns the [`Registry`] shared by every file it
//! analyzes, the [`Loader`] used to find files for unresolved classes and
//! include targets, and the per-file results. Loading is re-entrant: a file
//! that autoloads a class analyzes the declaring file with the same session
//! before it continues.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use phplint_parser::CstNode;
use tracing::{debug, warn};

use crate::analyze::diagnostics::Report;
use crate::analyze::infer::Checker;
use crate::analyze::lattice::TypeUnion;
use crate::analyze::registry::{symbol_key, Registry};
use crate::builtins;
use crate::config::LintConfig;
use crate::error::LoadError;
use crate::loader::{normalize_path, Loader};
use crate::pipeline;

/// Result of analyzing one file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileOutcome {
    pub report: Report,
    /// Value of a top-level `return`, or `1` when the file has none
    pub value: TypeUnion,
    /// Analyzed as an include target, tolerating names bound by the includer
    pub included: bool,
}

/// What an `include`/`require` of an existing file evaluated to.
#[derive(Debug, Clone, PartialEq)]
pub enum IncludeOutcome {
    /// The file was analyzed (now or earlier); its return value
    Analyzed(TypeUnion),
    /// `*_once` of a file that was already analyzed
    AlreadyIncluded,
    /// The file is being analyzed further up the stack
    InProgress,
    /// The file could not be read, or its analysis was aborted
    Failed,
}

/// Shared state for analyzing a tree of files.
#[derive(Debug)]
pub struct AnalysisSession {
    registry: Registry,
    loader: Box<dyn Loader>,
    config: LintConfig,
    in_progress: HashSet<PathBuf>,
    results: HashMap<PathBuf, FileOutcome>,
    order: Vec<PathBuf>,
    depth: usize,
    autoload_attempted: HashSet<String>,
}

impl AnalysisSession {
    /// A fresh session seeded with the built-in symbol table
    pub fn new(config: LintConfig, loader: Box<dyn Loader>) -> Self {
        Self {
            registry: builtins::registry(),
            loader,
            config,
            in_progress: HashSet::new(),
            results: HashMap::new(),
            order: Vec::new(),
            depth: 0,
            autoload_attempted: HashSet::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn config(&self) -> &LintConfig {
        &self.config
    }

    pub fn loader(&self) -> &dyn Loader {
        self.loader.as_ref()
    }

    /// Reports of every analyzed file, in completion order
    pub fn reports(&self) -> impl Iterator<Item = &Report> {
        self.order
            .iter()
            .filter_map(|path| self.results.get(path))
            .map(|outcome| &outcome.report)
    }

    pub fn outcome(&self, path: &Path) -> Option<&FileOutcome> {
        self.results.get(&normalize_path(path))
    }

    /// Stored report of a file analyzed on its own.
    ///
    /// Include targets are checked leniently, so their stored reports do
    /// not stand in for a direct analysis.
    fn direct_report(&self, path: &Path) -> Option<Report> {
        self.results
            .get(path)
            .filter(|outcome| !outcome.included)
            .map(|outcome| outcome.report.clone())
    }

    /// Analyze `source` as the contents of `path`.
    ///
    /// A file already analyzed in this session returns its stored report.
    pub fn analyze_source(&mut self, path: impl Into<PathBuf>, source: &str) -> Report {
        let path = normalize_path(&path.into());
        if let Some(report) = self.direct_report(&path) {
            return report;
        }
        self.run(&path, source, false).report
    }

    /// Read `path` through the loader and analyze it
    pub fn analyze_file(&mut self, path: &Path) -> Result<Report, LoadError> {
        let path = normalize_path(path);
        if let Some(report) = self.direct_report(&path) {
            return Ok(report);
        }
        if self.in_progress.contains(&path) {
            debug!(file = %path.display(), "re-entrant load skipped");
            return Ok(Report::new(path));
        }
        let source = self.loader.read_source(&path)?;
        Ok(self.run(&path, &source, false).report)
    }

    /// Analyze an already parsed tree
    pub fn analyze_tree(&mut self, path: impl Into<PathBuf>, root: &CstNode) -> Report {
        let path = normalize_path(&path.into());
        self.enter(&path);
        let outcome = self.check_tree(&path, root, false);
        self.leave(&path, outcome).report
    }

    /// Analyze the target of an `include`/`require`.
    pub(crate) fn include(&mut self, path: &Path, once: bool) -> IncludeOutcome {
        let path = normalize_path(path);
        if self.in_progress.contains(&path) {
            debug!(file = %path.display(), "include of a file in progress");
            return IncludeOutcome::InProgress;
        }
        if let Some(outcome) = self.results.get(&path) {
            return if once {
                IncludeOutcome::AlreadyIncluded
            } else {
                IncludeOutcome::Analyzed(outcome.value.clone())
            };
        }
        if self.depth >= self.config.analyzer.max_load_depth {
            debug!(file = %path.display(), depth = self.depth, "load depth exceeded");
            return IncludeOutcome::Failed;
        }
        match self.loader.read_source(&path) {
            Ok(source) => {
                let outcome = self.run(&path, &source, true);
                if outcome.report.diagnostics.iter().any(|d| d.kind.is_fatal()) {
                    IncludeOutcome::Failed
                } else {
                    IncludeOutcome::Analyzed(outcome.value)
                }
            }
            Err(e) => {
                debug!(file = %path.display(), error = %e, "include target unreadable");
                IncludeOutcome::Failed
            }
        }
    }

    /// Try to load the file declaring `name`.
    ///
    /// Each name is attempted once per session; returns whether a file was
    /// found and analyzed.
    pub fn autoload(&mut self, name: &str) -> bool {
        let name = name.trim_start_matches('\\');
        if !self.autoload_attempted.insert(symbol_key(name)) {
            return false;
        }
        if self.depth >= self.config.analyzer.max_load_depth {
            debug!(name, depth = self.depth, "autoload depth exceeded");
            return false;
        }
        let Some(path) = self.loader.resolve_qualified_name_to_file(name) else {
            debug!(name, "autoload found no file");
            return false;
        };
        let path = normalize_path(&path);
        if self.results.contains_key(&path) || self.in_progress.contains(&path) {
            return false;
        }
        debug!(name, file = %path.display(), "autoloading");
        match self.loader.read_source(&path) {
            Ok(source) => {
                self.run(&path, &source, false);
                true
            }
            Err(e) => {
                debug!(name, file = %path.display(), error = %e, "autoload target unreadable");
                false
            }
        }
    }

    fn run(&mut self, path: &Path, source: &str, including: bool) -> FileOutcome {
        self.enter(path);
        let outcome = match pipeline::parse_source(path, source) {
            Ok(root) => self.check_tree(path, &root, including),
            Err(diagnostics) => FileOutcome {
                report: Report::from_diagnostics(path, diagnostics),
                value: TypeUnion::mixed(),
                included: including,
            },
        };
        self.leave(path, outcome)
    }

    fn enter(&mut self, path: &Path) {
        debug!(file = %path.display(), depth = self.depth, "analyzing");
        self.in_progress.insert(path.to_path_buf());
        self.depth += 1;
    }

    fn leave(&mut self, path: &Path, outcome: FileOutcome) -> FileOutcome {
        self.depth -= 1;
        self.in_progress.remove(path);
        debug!(
            file = %path.display(),
            diagnostics = outcome.report.diagnostics.len(),
            "finished"
        );
        if !self.results.contains_key(path) {
            self.order.push(path.to_path_buf());
        }
        self.results.insert(path.to_path_buf(), outcome.clone());
        outcome
    }

    fn check_tree(&mut self, path: &Path, root: &CstNode, including: bool) -> FileOutcome {
        let mut checker = Checker::new(self, path, including);
        let result = checker.check_file(root);
        let diagnostics = checker.finish();
        let value = match result {
            Ok(value) => value,
            Err(abort) => {
                warn!(location = %abort.location, reason = %abort.reason, "analysis aborted");
                TypeUnion::mixed()
            }
        };
        let mut report = Report::from_diagnostics(path, diagnostics);
        report.sort();
        FileOutcome {
            report,
            value,
            included: including,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::DiagnosticKind;
    use crate::loader::MemoryLoader;

    fn session(loader: MemoryLoader) -> AnalysisSession {
        AnalysisSession::new(LintConfig::default(), Box::new(loader))
    }

    #[test]
    fn test_results_are_memoized() {
        let mut s = session(MemoryLoader::new());
        let first = s.analyze_source("/a.php", "<?php echo $x;");
        let second = s.analyze_source("/a.php", "<?php echo 1;");
        assert_eq!(first, second);
        assert_eq!(s.reports().count(), 1);
    }

    #[test]
    fn test_syntax_error_skips_inference() {
        let mut s = session(MemoryLoader::new());
        let report = s.analyze_source("/a.php", "<?php echo $x\n$y = ;");
        assert!(!report.success);
        assert!(report.count(DiagnosticKind::SyntaxError) >= 1);
        assert_eq!(report.count(DiagnosticKind::UndefinedName), 0);
    }

    #[test]
    fn test_autoload_attempted_once() {
        let loader = MemoryLoader::new().with_class_file(
            "App\\Thing",
            "/src/Thing.php",
            "<?php namespace App; class Thing {}",
        );
        let mut s = session(loader);
        assert!(s.autoload("\\App\\Thing"));
        assert!(s.registry().declared_class("App\\Thing").is_some());
        assert!(!s.autoload("App\\Thing"));
        assert!(!s.autoload("Missing\\Thing"));
    }

    #[test]
    fn test_analyze_file_reads_through_loader() {
        let loader = MemoryLoader::new().with_file("/p/a.php", "<?php $a = 1; echo $a;");
        let mut s = session(loader);
        let report = s.analyze_file(Path::new("/p/./a.php")).unwrap();
        assert!(report.success);
        assert!(s.outcome(Path::new("/p/a.php")).is_some());
        assert!(matches!(
            s.analyze_file(Path::new("/p/missing.php")),
            Err(LoadError::NotFound { .. })
        ));
    }

    #[test]
    fn test_direct_analysis_rechecks_included_file() {
        let loader = MemoryLoader::new()
            .with_file("/p/a.php", "<?php include '/p/b.php';")
            .with_file("/p/b.php", "<?php echo $undefined;");
        let mut s = session(loader);
        let a = s.analyze_file(Path::new("/p/a.php")).unwrap();
        assert!(a.diagnostics.is_empty());
        assert_eq!(s.outcome(Path::new("/p/b.php")).map(|o| o.included), Some(true));

        let b = s.analyze_file(Path::new("/p/b.php")).unwrap();
        assert_eq!(b.kinds(), vec![DiagnosticKind::UndefinedName]);
        assert_eq!(s.outcome(Path::new("/p/b.php")).map(|o| o.included), Some(false));
        assert_eq!(s.reports().count(), 2);
        // The strict result is kept from then on
        assert_eq!(s.analyze_file(Path::new("/p/b.php")).unwrap(), b);
    }

    #[test]
    fn test_include_once_of_analyzed_file() {
        let loader = MemoryLoader::new().with_file("/p/lib.php", "<?php return 42;");
        let mut s = session(loader);
        assert_eq!(
            s.include(Path::new("/p/lib.php"), false),
            IncludeOutcome::Analyzed(TypeUnion::of(crate::analyze::lattice::Type::Int(Some(42))))
        );
        assert_eq!(
            s.include(Path::new("/p/lib.php"), true),
            IncludeOutcome::AlreadyIncluded
        );
        assert_eq!(s.include(Path::new("/p/nope.php"), false), IncludeOutcome::Failed);
    }
}
