//! Error type for graph construction, routing and configuration.

use thiserror::Error;

/// Errors produced while building or querying the simulation.
///
/// None of these can occur inside `SimWorld::tick`; they are all raised at
/// setup time and reported to whoever asked for the operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("intersection {0} not found in network")]
    UnknownNode(String),

    #[error("no route from {from} to {to}")]
    NoPathFound { from: String, to: String },

    #[error("road {road} references unknown intersection {endpoint}")]
    UnresolvedReference { road: String, endpoint: String },

    #[error("intersection {0} is defined more than once")]
    DuplicateIntersection(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type SimResult<T> = Result<T, SimError>;
