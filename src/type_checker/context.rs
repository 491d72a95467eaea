use crate::errors::diagnostics::Diagnostics;

use super::scope::ScopeTree;

/// Name of the function every program must define.
pub const ENTRY_POINT: &str = "principal";

/// Symbols the generated module defines or declares itself: the C entry
/// point and the I/O functions.
pub const RESERVED_NAMES: [&str; 3] = ["main", "printf", "scanf"];

/// Everything semantic analysis produces for one compilation.
///
/// Created fresh per source file, filled by the resolver and the return
/// checker, then handed read-only to the code generator.
#[derive(Debug, Default)]
pub struct CompilationContext {
    pub scopes: ScopeTree,
    pub diagnostics: Diagnostics,
}

impl CompilationContext {
    pub fn new() -> Self {
        CompilationContext::default()
    }

    pub fn is_fatal(&self) -> bool {
        self.diagnostics.is_fatal()
    }
}
