//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent malformed input to the resource model.
/// These are independent of network and process concerns.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("invalid node path '{path}': {message}")]
    InvalidPath { path: String, message: String },
}
