use std::{fs, path::Path};

use log::info;

use crate::ir::Module;

use super::{Backend, BackendError};

/// Writes the module's LLVM textual IR.
pub struct TextBackend;

impl Backend for TextBackend {
    fn name(&self) -> &'static str {
        "text"
    }

    fn emit(&self, module: &Module, output: &Path) -> Result<(), BackendError> {
        fs::write(output, module.to_string()).map_err(|source| BackendError::Io {
            path: output.to_path_buf(),
            source,
        })?;
        info!("wrote {} ({} backend)", output.display(), self.name());
        Ok(())
    }
}
