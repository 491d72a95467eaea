//! Error types and error handling for the compiler.
//!
//! This module defines the error types used throughout the compilation
//! process. It includes:
//!
//! - Front-end errors (lexical, brace imbalance, syntax) with line information
//! - The semantic diagnostic sink that collects warnings and fatal errors
//! - Error formatting and display functionality

pub mod diagnostics;
pub mod errors;
