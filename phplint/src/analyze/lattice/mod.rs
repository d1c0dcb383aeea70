//! Type lattice for PHP values.
//!
//! # Module structure
//!
//! - `types`: lattice members (`Type`, `ConstValue`, `Sentinel`)
//! - `ops`: subtype test, single-member combination, truthiness splitting
//! - `union`: deduplicated member sets (`TypeUnion`)
//! - `function`: callable signatures (`FunctionType`, `Argument`)

pub mod function;
pub mod ops;
pub mod types;
pub mod union;

pub use function::{Argument, FunctionType};
pub use ops::{Flat, Hierarchy};
pub use types::{ConstValue, Sentinel, Type};
pub use union::TypeUnion;

/// Unions with more members than this widen to `mixed`.
pub const MAX_UNION_LENGTH: usize = 8;
