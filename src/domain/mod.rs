//! Domain layer: resource nodes and link derivation
//!
//! This layer is independent of external concerns (no network, no CLI, no config loading).

pub mod error;
pub mod links;
pub mod node;

pub use error::DomainError;
pub use links::{Descriptor, LinkResolver, LinkSettings};
pub use node::{sort_siblings, LayerRecord, Locator, Node, NodeKind, NodePath, Record};
