//! Output backends for finished IR modules.
//!
//! [`TextBackend`] writes LLVM textual IR and needs nothing beyond the
//! crate. `LlvmBackend` (cargo feature `llvm`) rebuilds the module through
//! the LLVM C API with `inkwell`, verifies it and can also write object
//! files.

pub mod text;

#[cfg(feature = "llvm")]
pub mod llvm;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::ir::Module;

pub use text::TextBackend;

#[cfg(feature = "llvm")]
pub use llvm::LlvmBackend;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("não foi possível escrever '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("o LLVM rejeitou o módulo: {0}")]
    Llvm(String),
    #[error("backend desconhecido '{0}'")]
    Unknown(String),
    #[error("backend '{0}' indisponível nesta compilação (ative a feature `{0}`)")]
    Unavailable(String),
}

pub trait Backend {
    fn name(&self) -> &'static str;

    /// Writes `module` to `output`.
    fn emit(&self, module: &Module, output: &Path) -> Result<(), BackendError>;
}

/// Looks a backend up by the name used on the command line.
pub fn backend_by_name(name: &str) -> Result<Box<dyn Backend>, BackendError> {
    match name {
        "text" => Ok(Box::new(TextBackend)),
        #[cfg(feature = "llvm")]
        "llvm" => Ok(Box::new(LlvmBackend)),
        #[cfg(not(feature = "llvm"))]
        "llvm" => Err(BackendError::Unavailable(name.to_string())),
        other => Err(BackendError::Unknown(other.to_string())),
    }
}
