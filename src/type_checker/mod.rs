//! Semantic analysis module.
//!
//! Checks a parsed program without stopping at the first problem:
//!
//! - Builds the scope tree and the symbol table
//! - Resolves every name against the enclosing scopes
//! - Tracks initialization and usage of variables and functions
//! - Checks call arity, assignment kinds and declared return types
//!
//! All findings go to the [`Diagnostics`](crate::errors::diagnostics::Diagnostics)
//! held by the [`CompilationContext`](context::CompilationContext); errors
//! set its fatal flag, which blocks code generation.

pub mod context;
pub mod returns;
pub mod scope;
pub mod type_checker;
