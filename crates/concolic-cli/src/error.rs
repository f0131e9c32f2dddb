//! Startup validation failures (§4.10, §7). Anything that keeps the
//! engine from reaching a valid [`concolic_core::EngineConfig`] lands
//! here; everything past validation uses the per-crate error types.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("target program {0} does not exist or is not a file")]
    ProgramMissing(PathBuf),

    #[error("target program {0} is not executable")]
    ProgramNotExecutable(PathBuf),

    #[error("output directory {path} is not writable: {source}")]
    OutputDirNotWritable { path: PathBuf, #[source] source: std::io::Error },

    #[error("missing tracer binary {0}; expected it alongside this executable")]
    MissingTracerBinary(PathBuf),

    #[error("--inputdir {0} does not exist or is not a directory")]
    InputDirMissing(PathBuf),

    #[error("--architecture {0} is not one of x86, x64")]
    InvalidArchitecture(String),
}

pub type Result<T> = std::result::Result<T, ConfigurationError>;
