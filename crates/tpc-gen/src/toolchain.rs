//! Host C++ toolchain discovery and invocation.
//!
//! The generated translation unit is handed to whatever C++17 compiler
//! the host provides: `$CXX` if set, otherwise the first of `c++`,
//! `g++`, `clang++` found on `PATH`.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{CodeGenError, Result};

/// Compiler candidates probed on `PATH`, in order.
const CANDIDATES: [&str; 3] = ["c++", "g++", "clang++"];

/// A discovered host C++ compiler.
pub struct Toolchain {
    /// Command used to invoke the compiler.
    pub compiler: PathBuf,
}

impl Toolchain {
    /// Discovers a usable compiler.
    pub fn discover() -> Result<Self> {
        if let Ok(cxx) = std::env::var("CXX") {
            if !cxx.trim().is_empty() {
                return Ok(Self {
                    compiler: PathBuf::from(cxx),
                });
            }
        }

        for candidate in CANDIDATES {
            if let Some(path) = find_on_path(candidate) {
                return Ok(Self { compiler: path });
            }
        }

        Err(CodeGenError::ToolchainNotFound)
    }

    /// Compiles and links `cpp` into the executable at `output`.
    pub fn compile(&self, cpp: &Path, output: &Path) -> Result<()> {
        let result = Command::new(&self.compiler)
            .arg("-std=c++17")
            .arg("-O2")
            .arg("-o")
            .arg(output)
            .arg(cpp)
            .output()
            .map_err(|e| CodeGenError::Spawn(self.compiler.display().to_string(), e))?;

        if result.status.success() {
            Ok(())
        } else {
            Err(CodeGenError::CompilationFailed(
                String::from_utf8_lossy(&result.stderr).into_owned(),
            ))
        }
    }
}

/// Looks for an executable on `PATH`.
fn find_on_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
        #[cfg(windows)]
        {
            let exe = dir.join(format!("{}.exe", name));
            if exe.is_file() {
                return Some(exe);
            }
        }
    }
    None
}
