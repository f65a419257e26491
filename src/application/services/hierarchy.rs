//! Lazy hierarchy service
//!
//! Maps the remote organization → project → branch → file → page → layer graph
//! onto tree nodes, one level per call. Nothing is cached: every expansion goes
//! back to the service.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::debug;

use crate::application::{ApplicationError, ApplicationResult, RemoteResultExt};
use crate::domain::{sort_siblings, Locator, Node, NodeKind, NodePath};
use crate::infrastructure::traits::{LayerQuery, PreviewRef, ResourceGraph};

/// Page size used when listing the layers of a page.
pub const DEFAULT_LAYER_LIMIT: u32 = 500;

/// A node together with the children fetched for it by `expand`.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub node: Node,
    pub children: Vec<TreeNode>,
    /// Whether children were fetched (false for leaves and nodes at the depth limit).
    pub expanded: bool,
}

/// Lazy tree data source over a `ResourceGraph`.
///
/// Holds no mutable state, so concurrent expansions of different nodes do not
/// interfere with each other.
#[derive(Clone)]
pub struct HierarchyAdapter {
    graph: Arc<dyn ResourceGraph>,
    layer_limit: u32,
}

type ExpandFuture<'a> =
    Pin<Box<dyn Future<Output = ApplicationResult<Vec<TreeNode>>> + Send + 'a>>;

impl HierarchyAdapter {
    pub fn new(graph: Arc<dyn ResourceGraph>, layer_limit: u32) -> Self {
        Self { graph, layer_limit }
    }

    /// Children of `parent`, or the organizations when `parent` is `None`.
    ///
    /// Issues exactly one remote call, none for layers. A failed call fails the
    /// whole expansion; partial lists are never returned.
    pub async fn children(&self, parent: Option<&Node>) -> ApplicationResult<Vec<Node>> {
        let Some(parent) = parent else {
            debug!("children: root");
            let mut nodes: Vec<Node> = self
                .graph
                .list_organizations()
                .await
                .fetch_context("list organizations", "root")?
                .into_iter()
                .map(|r| {
                    let locator = Locator::organization(r.id.clone());
                    Node::from_record(r, locator)
                })
                .collect();
            sort_siblings(NodeKind::Organization, &mut nodes);
            return Ok(nodes);
        };

        let scope = NodePath::of(parent).to_string();
        debug!("children: kind={} scope={}", parent.kind(), scope);

        let mut nodes: Vec<Node> = match &parent.locator {
            Locator::Organization { organization_id } => self
                .graph
                .list_projects(organization_id)
                .await
                .fetch_context("list projects", &scope)?
                .into_iter()
                .map(|r| {
                    let locator = Locator::project(organization_id, r.id.clone());
                    Node::from_record(r, locator)
                })
                .collect(),
            Locator::Project {
                organization_id,
                project_id,
            } => self
                .graph
                .list_branches(project_id)
                .await
                .fetch_context("list branches", &scope)?
                .into_iter()
                .map(|r| {
                    let locator = Locator::branch(organization_id, project_id, r.id.clone());
                    Node::from_record(r, locator)
                })
                .collect(),
            Locator::Branch {
                organization_id,
                project_id,
                branch_id,
            } => self
                .graph
                .list_files(project_id, branch_id)
                .await
                .fetch_context("list files", &scope)?
                .into_iter()
                .map(|r| {
                    let locator =
                        Locator::file(organization_id, project_id, branch_id, r.id.clone());
                    Node::from_record(r, locator)
                })
                .collect(),
            Locator::File {
                organization_id,
                project_id,
                branch_id,
                file_id,
            } => self
                .graph
                .list_pages(project_id, branch_id, file_id)
                .await
                .fetch_context("list pages", &scope)?
                .into_iter()
                .map(|r| {
                    let locator = Locator::page(
                        organization_id,
                        project_id,
                        branch_id,
                        file_id,
                        r.id.clone(),
                    );
                    Node::from_record(r, locator)
                })
                .collect(),
            Locator::Page {
                organization_id,
                project_id,
                branch_id,
                file_id,
                page_id,
            } => {
                let query = LayerQuery {
                    project_id,
                    branch_id,
                    file_id,
                    page_id,
                    limit: self.layer_limit,
                };
                self.graph
                    .list_layers(&query)
                    .await
                    .fetch_context("list layers", &scope)?
                    .into_iter()
                    .map(|r| {
                        let locator = Locator::layer(
                            organization_id,
                            project_id,
                            branch_id,
                            file_id,
                            page_id,
                            r.id.clone(),
                            r.last_changed_at_sha.clone(),
                        );
                        Node::from_layer_record(r, locator)
                    })
                    .collect()
            }
            Locator::Layer { .. } => return Ok(Vec::new()),
        };

        if let Some(kind) = parent.kind().child() {
            sort_siblings(kind, &mut nodes);
        }
        debug!("children: {} nodes under {}", nodes.len(), scope);
        Ok(nodes)
    }

    /// Rendered preview of a layer at its recorded revision.
    ///
    /// Returns `None` without contacting the service for every other kind.
    pub async fn preview(&self, node: &Node) -> ApplicationResult<Option<Vec<u8>>> {
        let Locator::Layer {
            project_id,
            branch_id,
            file_id,
            page_id,
            layer_id,
            sha,
            ..
        } = &node.locator
        else {
            return Ok(None);
        };

        let preview = PreviewRef {
            project_id,
            branch_id,
            file_id,
            page_id,
            layer_id,
            sha,
        };
        let bytes = self
            .graph
            .fetch_preview(&preview)
            .await
            .fetch_context("fetch preview", &NodePath::of(node).to_string())?;
        debug!("preview: {} bytes for layer {}", bytes.len(), layer_id);
        Ok(Some(bytes))
    }

    /// Walk from the root to the node addressed by `path`, one expansion per segment.
    ///
    /// Returns `None` for the root path.
    pub async fn resolve(&self, path: &NodePath) -> ApplicationResult<Option<Node>> {
        Ok(self.resolve_trail(path).await?.pop())
    }

    /// Like `resolve`, but returns every node along the way, top first.
    pub async fn resolve_trail(&self, path: &NodePath) -> ApplicationResult<Vec<Node>> {
        let mut trail: Vec<Node> = Vec::with_capacity(path.segments().len());
        for (depth, id) in path.segments().iter().enumerate() {
            let children = self.children(trail.last()).await?;
            let parent = trail
                .last()
                .map(|n| NodePath::of(n).to_string())
                .unwrap_or_else(|| "root".to_string());
            let found = children.into_iter().find(|n| n.id() == id).ok_or_else(|| {
                ApplicationError::NodeNotFound {
                    kind: NodeKind::ALL[depth],
                    id: id.clone(),
                    parent,
                }
            })?;
            trail.push(found);
        }
        Ok(trail)
    }

    /// Expand `depth` levels below `parent`, sequentially, one call per non-leaf node.
    pub fn expand<'a>(&'a self, parent: Option<&'a Node>, depth: usize) -> ExpandFuture<'a> {
        Box::pin(async move {
            if depth == 0 {
                return Ok(Vec::new());
            }
            let children = self.children(parent).await?;
            let mut tree = Vec::with_capacity(children.len());
            for child in children {
                let expanded = depth > 1 && !child.is_leaf();
                let grandchildren = if expanded {
                    self.expand(Some(&child), depth - 1).await?
                } else {
                    Vec::new()
                };
                tree.push(TreeNode {
                    node: child,
                    children: grandchildren,
                    expanded,
                });
            }
            Ok(tree)
        })
    }
}
