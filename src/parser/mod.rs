//! Parser module for building an Abstract Syntax Tree (AST).
//!
//! Transforms a token stream into the typed [`Program`](crate::ast::ast::Program).
//! Expressions use a Pratt parser with binding powers for precedence
//! (logical < relational < additive < multiplicative < unary < call/index);
//! statements are dispatched on their leading keyword.
//!
//! Syntax errors are collected rather than returned early: the parser
//! resynchronizes at the next statement start and keeps going.

pub mod expr;
pub mod lookups;
pub mod parser;
pub mod stmt;

#[cfg(test)]
mod tests;
