//! tpc-sem - Semantic analysis for the Turbo Pascal 7 dialect.
//!
//! This crate owns everything between the AST and the emitter:
//!
//! - the type model ([`DataType`], structured [`TypeDef`] descriptors);
//! - the lexically-scoped [`SymbolTable`] with per-name overload
//!   buckets;
//! - the [`Builtin`] registry for the System/CRT/DOS surface;
//! - the [`SemanticAnalyzer`], which walks the AST once and records
//!   expression types, with-bindings and type metadata into side
//!   tables keyed by node identity (the AST is never mutated);
//! - the [`UnitLoader`] that resolves `uses` clauses from the search
//!   path.

pub mod analysis;
pub mod builtins;
pub mod scope;
pub mod types;
pub mod units;

mod infer;

#[cfg(test)]
mod edge_cases;

pub use analysis::{default_search_dirs, eval_const_expr, Analysis, ConstValue, SemanticAnalyzer};
pub use builtins::Builtin;
pub use scope::{Param, Symbol, SymbolKind, SymbolTable};
pub use types::{DataType, Dimension, RecordField, Ty, TypeDef};
pub use units::UnitLoader;
