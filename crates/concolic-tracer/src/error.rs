//! Errors the tracer bridge can raise while talking to a tracer subprocess.
//!
//! Every variant here is an [`ExecutionError`] in the taxonomy of §7: the
//! bridge never panics on a malformed response or a dead child, it logs
//! and bounds the blast radius to the one seed being executed.

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("failed to spawn tracer process: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("failed to write seed bytes to tracer: {0}")]
    WriteInput(#[source] std::io::Error),

    #[error("tracer wire frame ended after {read} of {expected} expected bytes")]
    ShortRead { read: usize, expected: usize },

    #[error("tracer emitted an unrecognized compare kind byte: {0}")]
    UnknownCompareKind(u8),

    #[error("fork-server handshake failed: {0}")]
    ForkServerHandshake(String),

    #[error("tracer binary not found at {0}")]
    MissingTracerBinary(std::path::PathBuf),
}

pub type Result<T> = std::result::Result<T, ExecutionError>;
