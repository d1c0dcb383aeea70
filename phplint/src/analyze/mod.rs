//! Static analysis of parsed PHP files.
//!
//! # Module structure
//!
//! - `lattice`: the type lattice and callable signatures
//! - `registry`: classes, functions and constants known to a session
//! - `scope`: variable environments, name resolution, narrowing
//! - `docblock`: `@param`/`@return`/`@var` tags and type expressions
//! - `infer`: the per-node inference rules
//! - `diagnostics`: diagnostic kinds and per-file reports
//! - `session`: multi-file runs, autoloading and includes

pub mod diagnostics;
pub mod docblock;
pub mod infer;
pub mod lattice;
pub mod registry;
pub mod scope;
pub mod session;

pub use diagnostics::{Diagnostic, DiagnosticKind, Report, Severity};
pub use session::{AnalysisSession, FileOutcome, IncludeOutcome};
