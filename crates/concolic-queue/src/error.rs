//! Errors the queue and artifact store can raise while persisting a
//! candidate or scanning an initial seed directory.

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir { path: std::path::PathBuf, #[source] source: std::io::Error },

    #[error("failed to write artifact {path}: {source}")]
    WriteArtifact { path: std::path::PathBuf, #[source] source: std::io::Error },

    #[error("failed to read initial seed directory {path}: {source}")]
    ReadInputDir { path: std::path::PathBuf, #[source] source: std::io::Error },

    #[error("tracer execution failed while confirming a timeout: {0}")]
    Execution(#[from] concolic_tracer::ExecutionError),
}

pub type Result<T> = std::result::Result<T, QueueError>;
