//! Error conversion helpers for remote calls and local I/O
//!
//! Provides extension traits for attaching context while mapping into `ApplicationError`.

use std::io;

use crate::application::{ApplicationError, ApplicationResult};
use crate::infrastructure::RemoteError;

/// Extension trait for converting remote results into fetch failures.
pub trait RemoteResultExt<T> {
    /// Add the action and the scope it ran in.
    ///
    /// # Example
    /// ```ignore
    /// graph.list_files(project_id, branch_id).await
    ///     .fetch_context("list files", "org/project/branch")?;
    /// ```
    fn fetch_context(self, action: &str, scope: &str) -> ApplicationResult<T>;
}

impl<T> RemoteResultExt<T> for Result<T, RemoteError> {
    fn fetch_context(self, action: &str, scope: &str) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::Fetch {
            context: format!("{action}: {scope}"),
            source: Box::new(e),
        })
    }
}

/// Extension trait for converting `io::Result` to `ApplicationResult` with context.
pub trait IoResultExt<T> {
    fn with_action(self, action: &str) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_action(self, action: &str) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: action.to_string(),
            source: Box::new(e),
        })
    }
}
