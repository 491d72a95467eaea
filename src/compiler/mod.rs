//! Code generation module for the compiler.
//!
//! This module lowers the checked AST into the crate's IR. It handles:
//!
//! - Globals, functions and the C `main` wrapper ([`compiler`])
//! - Statements and structured control flow ([`stmt`])
//! - Expressions and numeric conversions ([`expr`])
//! - `escreva` / `leia` through the C library ([`io`])

pub mod compiler;
pub mod expr;
pub mod io;
pub mod stmt;

#[cfg(test)]
mod tests;
