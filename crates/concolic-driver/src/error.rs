//! Errors the driver can raise while running one concolic pass over a seed.

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The seed's cursor sits on a byte whose sampled range is a single
    /// point (`min == max`) -- there is nothing to perturb. This is an
    /// internal invariant violation (§4.9): callers must never invoke the
    /// driver on such a seed.
    #[error("cursor byte at position {position} has no sample range (min == max == {value})")]
    CursorOnFixedByte { position: usize, value: u8 },

    #[error("tracer execution failed: {0}")]
    Execution(#[from] concolic_tracer::ExecutionError),

    #[error("branch tree reconciliation failed: {0}")]
    Tree(#[from] concolic_tree::TreeError),
}

pub type Result<T> = std::result::Result<T, DriverError>;
