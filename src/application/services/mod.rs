//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (ResourceGraph, CredentialStore, etc.)
//! but are themselves concrete structs, not traits.

mod credentials;
mod hierarchy;

pub use credentials::{CredentialService, TokenSource};
pub use hierarchy::{HierarchyAdapter, TreeNode, DEFAULT_LAYER_LIMIT};
