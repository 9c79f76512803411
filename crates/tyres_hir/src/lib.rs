//! HIR consumed by type resolution
//!
//! This crate holds what earlier phases produce:
//! 1. Declarations (traits, impl blocks, generic parameters) with unique HirIds
//! 2. Path syntax and type expressions
//! 3. The name-scope resolution table and the module table

mod hir;
mod names;
mod program;

pub use hir::*;
pub use names::{Definition, NameResolution};
pub use program::Program;
