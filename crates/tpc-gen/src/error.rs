//! Error types for code generation and toolchain invocation.

use thiserror::Error;

/// Error type for the emitter and the host-toolchain wrapper.
#[derive(Debug, Error)]
pub enum CodeGenError {
    /// No usable C++ compiler was found.
    #[error("no C++ compiler found; set CXX or install c++, g++ or clang++")]
    ToolchainNotFound,

    /// The host compiler rejected the generated translation unit.
    #[error("C++ compilation failed:\n{0}")]
    CompilationFailed(String),

    /// Spawning the compiler process failed.
    #[error("failed to run '{0}': {1}")]
    Spawn(String, #[source] std::io::Error),

    /// Writing an output file failed.
    #[error("failed to write {0}: {1}")]
    WriteFailed(String, #[source] std::io::Error),

    /// Internal error - indicates a bug.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for code generation operations.
pub type Result<T> = std::result::Result<T, CodeGenError>;
