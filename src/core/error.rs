use thiserror::Error;

use super::NodeId;

/// Errors surfaced to collaborators.
///
/// Condition evaluation and propagation never produce errors; missing
/// references degrade to `false` instead.
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("{0} is already registered")]
    DuplicateId(NodeId),

    #[error("{0} is not registered")]
    NotFound(NodeId),

    #[error("Saved state codec error: {0}")]
    Codec(#[from] bincode::Error),
}

pub type LinkResult<T> = Result<T, LinkError>;
