//! Diagnostics raised by the inference rules.
//!
//! Detection always happens; suppression is applied afterwards by
//! [`Report::filtered`], so ignoring a kind never changes what the engine
//! computes for the rest of the file.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::LintConfig;
use crate::span::Location;

/// Diagnostic taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Read of an unbound variable, constant, function or class
    UndefinedName,
    /// Member lookup found nothing and no magic method applies
    NoSuchMember,
    /// Member exists but its visibility forbids the access
    ScopeViolation,
    ArgumentArityMismatch,
    ArgumentTypeMismatch,
    ReturnTypeMismatch,
    /// Right-hand side has no value (call to a `void` function)
    AssignmentWithoutValue,
    /// Value written to a typed property does not fit its declaration
    AssignmentTypeMismatch,
    /// Doc comment type disagrees with the native declaration
    DocumentationMismatch,
    NamingConventionViolation,
    /// Construct the engine refuses to analyze (`goto`)
    UnsupportedConstruct,
    /// Autoloading found no file declaring the class
    ClassLoadFailure,
    /// `include`/`require` target could not be found
    IncludeFailure,
    /// Two imported traits define the same member
    TraitCollision,
    SyntaxError,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::UndefinedName => "UndefinedName",
            DiagnosticKind::NoSuchMember => "NoSuchMember",
            DiagnosticKind::ScopeViolation => "ScopeViolation",
            DiagnosticKind::ArgumentArityMismatch => "ArgumentArityMismatch",
            DiagnosticKind::ArgumentTypeMismatch => "ArgumentTypeMismatch",
            DiagnosticKind::ReturnTypeMismatch => "ReturnTypeMismatch",
            DiagnosticKind::AssignmentWithoutValue => "AssignmentWithoutValue",
            DiagnosticKind::AssignmentTypeMismatch => "AssignmentTypeMismatch",
            DiagnosticKind::DocumentationMismatch => "DocumentationMismatch",
            DiagnosticKind::NamingConventionViolation => "NamingConventionViolation",
            DiagnosticKind::UnsupportedConstruct => "UnsupportedConstruct",
            DiagnosticKind::ClassLoadFailure => "ClassLoadFailure",
            DiagnosticKind::IncludeFailure => "IncludeFailure",
            DiagnosticKind::TraitCollision => "TraitCollision",
            DiagnosticKind::SyntaxError => "SyntaxError",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::NamingConventionViolation
            | DiagnosticKind::TraitCollision
            | DiagnosticKind::ClassLoadFailure => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Kinds that abort the analysis of the whole file
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DiagnosticKind::UnsupportedConstruct | DiagnosticKind::SyntaxError
        )
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    #[serde(flatten)]
    pub location: Location,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, location: Location, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            message: message.into(),
            location,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: [{}] {}", self.location, self.kind, self.message)
    }
}

/// Everything found while analyzing one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub file: PathBuf,
    /// False when an error-severity diagnostic remains or analysis was aborted
    pub success: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            success: true,
            diagnostics: Vec::new(),
        }
    }

    pub fn from_diagnostics(file: impl Into<PathBuf>, diagnostics: Vec<Diagnostic>) -> Self {
        let success = !diagnostics.iter().any(Diagnostic::is_error);
        Self {
            file: file.into(),
            success,
            diagnostics,
        }
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_error() {
            self.success = false;
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }

    pub fn kinds(&self) -> Vec<DiagnosticKind> {
        self.diagnostics.iter().map(|d| d.kind).collect()
    }

    /// The report with suppressed kinds removed.
    ///
    /// A fatal diagnostic that was suppressed still leaves the report
    /// unsuccessful: the rest of the file was never analyzed.
    pub fn filtered(&self, config: &LintConfig) -> Report {
        let aborted = self.diagnostics.iter().any(|d| d.kind.is_fatal());
        let diagnostics: Vec<Diagnostic> = self
            .diagnostics
            .iter()
            .filter(|d| !config.is_ignored(d.kind, &d.location.file))
            .cloned()
            .collect();
        let mut report = Report::from_diagnostics(self.file.clone(), diagnostics);
        if aborted {
            report.success = false;
        }
        report
    }

    pub fn sort(&mut self) {
        self.diagnostics
            .sort_by(|a, b| a.location.cmp(&b.location).then(a.kind.cmp(&b.kind)));
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}
