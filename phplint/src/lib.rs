// Prevent accidental debug output in library code.
// CLI binaries (bin/) may use eprintln!() for user-facing error messages.
#![deny(clippy::print_stderr)]

// Core modules
pub mod builtins;
pub mod config;
pub mod error;
pub mod loader;
pub mod span;

// Type inference and checking
pub mod analyze;

// Pipeline: parse and analyze PHP source
pub mod pipeline;
pub use pipeline::{analyze_paths, analyze_source, collect_php_files, parse_source};

pub use analyze::{AnalysisSession, Diagnostic, DiagnosticKind, Report, Severity};
pub use config::LintConfig;
