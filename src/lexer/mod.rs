//! Lexical analysis module for the compiler.
//!
//! Converts T++ source text into a stream of tokens for parsing. It handles:
//!
//! - Tokenization of source code using an ordered regex pattern table
//! - Recognition of Portuguese keywords, identifiers, numeric literals and operators
//! - Line tracking for error reporting
//! - Nestable `{ ... }` comments and brace imbalance detection

pub mod lexer;
pub mod tokens;

#[cfg(test)]
mod tests;
