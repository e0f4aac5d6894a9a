//! Error types for update decoding.

use thiserror::Error;

/// An inbound payload that could not be applied to the state tree.
///
/// Recovered locally: the payload is dropped and the tree keeps its last
/// valid value.
#[derive(Debug, Error)]
pub enum MalformedUpdate {
    #[error("update is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("update must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}
