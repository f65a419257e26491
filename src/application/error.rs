//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::{DomainError, NodeKind};

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("cannot use Abstract Explorer without an API token")]
    MissingCredential,

    #[error("no {kind} with id '{id}' under {parent}")]
    NodeNotFound {
        kind: NodeKind,
        id: String,
        parent: String,
    },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("fetch failed: {context}")]
    Fetch {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
