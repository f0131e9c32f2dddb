//! Invariant violations the tree builder can detect in its own input.

#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("extract_straight_seq saw divergent head addresses where callers guaranteed agreement")]
    DivergentHeadsInvariant,

    #[error("branch trace list is empty; the builder requires at least one trace")]
    EmptyTraceList,
}

pub type Result<T> = std::result::Result<T, TreeError>;
