//! Errors the solver can raise while walking a branch tree.
//!
//! Every variant here is a `SolverError` in the taxonomy of §7: none of
//! them are fatal. A solve attempt that can't be encoded into a usable
//! seed just drops that one candidate; the outer walk keeps going.

#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("solved value saturated to an empty byte range")]
    EmptyRange,

    #[error("tracer execution failed while probing a solve attempt: {0}")]
    Execution(#[from] concolic_tracer::ExecutionError),
}

pub type Result<T> = std::result::Result<T, SolverError>;
