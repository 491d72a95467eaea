//! The external tools that turn emitted IR into a running program.
//!
//! The IR file goes through the assembler (`.ll` → `.bc`), the static
//! compiler (`.bc` → `.o`) and the linker (`.o` → executable), in that
//! order.

use std::{
    path::{Path, PathBuf},
    process::{Command, ExitStatus},
};

use log::{info, warn};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolchainError {
    #[error("não foi possível executar '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{program}' falhou ({status}): {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// Program names of the external tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub assembler: String,
    pub llc: String,
    pub linker: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Toolchain {
            assembler: String::from("llvm-as"),
            llc: String::from("llc"),
            linker: String::from("clang"),
        }
    }
}

fn run_tool(program: &str, args: &[&str]) -> Result<(), ToolchainError> {
    info!("running {} {}", program, args.join(" "));

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| ToolchainError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        warn!("{} exited with {}", program, output.status);
        return Err(ToolchainError::Failed {
            program: program.to_string(),
            status: output.status,
            stderr,
        });
    }
    Ok(())
}

impl Toolchain {
    /// Assembles, compiles and links `ir`, returning the executable's path
    /// (the IR path without extension).
    pub fn build_executable(&self, ir: &Path) -> Result<PathBuf, ToolchainError> {
        let bitcode = ir.with_extension("bc");
        let object = ir.with_extension("o");
        let executable = ir.with_extension("");

        let ir = ir.to_string_lossy();
        let bitcode_name = bitcode.to_string_lossy();
        let object_name = object.to_string_lossy();
        let executable_name = executable.to_string_lossy();

        run_tool(&self.assembler, &[&ir, "-o", &bitcode_name])?;
        run_tool(
            &self.llc,
            &[
                "-filetype=obj",
                "-relocation-model=pic",
                &bitcode_name,
                "-o",
                &object_name,
            ],
        )?;
        run_tool(
            &self.linker,
            &["-fPIE", "-pie", &object_name, "-o", &executable_name],
        )?;

        Ok(executable)
    }

    /// Runs a built program with inherited standard streams.
    pub fn run(&self, executable: &Path) -> Result<ExitStatus, ToolchainError> {
        let executable = command_path(executable);
        let program = executable.to_string_lossy().into_owned();
        info!("running {}", program);

        Command::new(&executable)
            .status()
            .map_err(|source| ToolchainError::Spawn { program, source })
    }
}

/// A bare file name is looked up in `PATH` by the OS, so it gets an
/// explicit `./`.
fn command_path(executable: &Path) -> PathBuf {
    match executable.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Path::new(".").join(executable),
        _ => executable.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::{command_path, Toolchain, ToolchainError};

    #[test]
    fn test_bare_executable_name_runs_from_current_directory() {
        assert_eq!(command_path(Path::new("module")), PathBuf::from("./module"));
        assert_eq!(
            command_path(Path::new("saida/module")),
            PathBuf::from("saida/module")
        );
        assert_eq!(command_path(Path::new("/tmp/module")), PathBuf::from("/tmp/module"));
        assert_eq!(
            command_path(Path::new("module.ll").with_extension("").as_path()),
            PathBuf::from("./module")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_run_relative_executable() {
        use std::{fs, io::Write, os::unix::fs::PermissionsExt};

        let mut script = tempfile::Builder::new()
            .prefix("tppc-run-")
            .tempfile_in(".")
            .unwrap();
        write!(script, "#!/bin/sh\nexit 3\n").unwrap();
        let script = script.into_temp_path();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let name = Path::new(script.file_name().unwrap());
        let status = Toolchain::default().run(name).unwrap();

        assert_eq!(status.code(), Some(3));
    }

    #[test]
    fn test_missing_tool_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let ir = dir.path().join("module.ll");
        std::fs::write(&ir, "").unwrap();

        let toolchain = Toolchain {
            assembler: String::from("tppc-no-such-assembler"),
            ..Toolchain::default()
        };

        match toolchain.build_executable(&ir) {
            Err(ToolchainError::Spawn { program, .. }) => {
                assert_eq!(program, "tppc-no-such-assembler")
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_tool_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let ir = dir.path().join("module.ll");

        let toolchain = Toolchain {
            assembler: String::from("false"),
            ..Toolchain::default()
        };

        assert!(matches!(
            toolchain.build_executable(&ir),
            Err(ToolchainError::Failed { ref program, .. }) if program == "false"
        ));
    }
}
