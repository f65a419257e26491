//! Tests for HierarchyAdapter against an in-memory resource graph

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rstest::rstest;

use abstract_explorer::application::services::HierarchyAdapter;
use abstract_explorer::application::ApplicationError;
use abstract_explorer::domain::{LayerRecord, Locator, Node, NodeKind, NodePath, Record};
use abstract_explorer::infrastructure::traits::{LayerQuery, PreviewRef, ResourceGraph};
use abstract_explorer::infrastructure::{RemoteError, RemoteResult};
use abstract_explorer::util::testing;

/// Fixed two-level fixture below every parent; records every call.
#[derive(Default)]
struct FakeGraph {
    calls: Mutex<Vec<String>>,
    fail: bool,
}

impl FakeGraph {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn record(&self, call: String) -> RemoteResult<()> {
        self.calls.lock().unwrap().push(call.clone());
        if self.fail {
            return Err(RemoteError::Status {
                url: call,
                status: 503,
                body: "unavailable".into(),
            });
        }
        Ok(())
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn named(names: &[&str]) -> Vec<Record> {
        names
            .iter()
            .map(|n| Record::new(format!("{n}-id"), *n))
            .collect()
    }
}

#[async_trait]
impl ResourceGraph for FakeGraph {
    async fn list_organizations(&self) -> RemoteResult<Vec<Record>> {
        self.record("organizations".into())?;
        Ok(Self::named(&["Acme", "Zeta"]))
    }

    async fn list_projects(&self, organization_id: &str) -> RemoteResult<Vec<Record>> {
        self.record(format!("projects {organization_id}"))?;
        Ok(Self::named(&["alpha", "Design", "Beta"]))
    }

    async fn list_branches(&self, project_id: &str) -> RemoteResult<Vec<Record>> {
        self.record(format!("branches {project_id}"))?;
        Ok(Self::named(&["main", "feature"]))
    }

    async fn list_files(&self, project_id: &str, branch_id: &str) -> RemoteResult<Vec<Record>> {
        self.record(format!("files {project_id}/{branch_id}"))?;
        Ok(Self::named(&["Icons"]))
    }

    async fn list_pages(
        &self,
        project_id: &str,
        branch_id: &str,
        file_id: &str,
    ) -> RemoteResult<Vec<Record>> {
        self.record(format!("pages {project_id}/{branch_id}/{file_id}"))?;
        Ok(Self::named(&["Page 2", "Page 1"]))
    }

    async fn list_layers(&self, query: &LayerQuery<'_>) -> RemoteResult<Vec<LayerRecord>> {
        self.record(format!("layers {} limit={}", query.page_id, query.limit))?;
        Ok(vec![
            LayerRecord::new("L2", "zebra", "sha-2"),
            LayerRecord::new("L1", "apple", "sha-1"),
        ])
    }

    async fn fetch_preview(&self, layer: &PreviewRef<'_>) -> RemoteResult<Vec<u8>> {
        self.record(format!("preview {}@{}", layer.layer_id, layer.sha))?;
        Ok(vec![0x89, b'P', b'N', b'G'])
    }
}

fn adapter(graph: &Arc<FakeGraph>) -> HierarchyAdapter {
    testing::init_test_setup();
    HierarchyAdapter::new(graph.clone(), 50)
}

fn layer_node() -> Node {
    Node::from_layer_record(
        LayerRecord::new("L1", "apple", "sha-1"),
        Locator::layer("O", "P", "B", "F", "G", "L1", "sha-1"),
    )
}

fn node_of(kind: NodeKind) -> Node {
    let locator = match kind {
        NodeKind::Organization => Locator::organization("O"),
        NodeKind::Project => Locator::project("O", "P"),
        NodeKind::Branch => Locator::branch("O", "P", "B"),
        NodeKind::File => Locator::file("O", "P", "B", "F"),
        NodeKind::Page => Locator::page("O", "P", "B", "F", "G"),
        NodeKind::Layer => return layer_node(),
    };
    Node::from_record(Record::new(locator.id(), "node"), locator)
}

// ============================================================
// children
// ============================================================

#[rstest]
#[case(NodeKind::Organization, NodeKind::Project)]
#[case(NodeKind::Project, NodeKind::Branch)]
#[case(NodeKind::Branch, NodeKind::File)]
#[case(NodeKind::File, NodeKind::Page)]
#[case(NodeKind::Page, NodeKind::Layer)]
#[tokio::test]
async fn given_parent_when_children_then_one_level_below_with_one_call(
    #[case] parent: NodeKind,
    #[case] expected: NodeKind,
) {
    let graph = Arc::new(FakeGraph::default());
    let parent = node_of(parent);

    let children = adapter(&graph).children(Some(&parent)).await.unwrap();

    assert!(!children.is_empty());
    assert!(children.iter().all(|c| c.kind() == expected));
    assert_eq!(graph.calls().len(), 1);
}

#[tokio::test]
async fn given_root_when_children_then_organizations() {
    let graph = Arc::new(FakeGraph::default());

    let children = adapter(&graph).children(None).await.unwrap();

    let titles: Vec<&str> = children.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["Acme", "Zeta"]);
    assert!(children.iter().all(|c| c.kind() == NodeKind::Organization));
    assert_eq!(graph.calls(), vec!["organizations"]);
}

#[tokio::test]
async fn given_layer_when_children_then_empty_without_call() {
    let graph = Arc::new(FakeGraph::default());

    let children = adapter(&graph).children(Some(&layer_node())).await.unwrap();

    assert!(children.is_empty());
    assert!(graph.calls().is_empty());
}

#[tokio::test]
async fn given_projects_when_children_then_sorted_case_sensitive() {
    let graph = Arc::new(FakeGraph::default());

    let children = adapter(&graph)
        .children(Some(&node_of(NodeKind::Organization)))
        .await
        .unwrap();

    let titles: Vec<&str> = children.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["Beta", "Design", "alpha"]);
    assert_eq!(graph.calls(), vec!["projects O"]);
}

#[tokio::test]
async fn given_pages_and_layers_when_children_then_service_order_kept() {
    let graph = Arc::new(FakeGraph::default());
    let hierarchy = adapter(&graph);

    let pages = hierarchy.children(Some(&node_of(NodeKind::File))).await.unwrap();
    let layers = hierarchy.children(Some(&node_of(NodeKind::Page))).await.unwrap();

    let page_titles: Vec<&str> = pages.iter().map(|c| c.title.as_str()).collect();
    let layer_titles: Vec<&str> = layers.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(page_titles, vec!["Page 2", "Page 1"]);
    assert_eq!(layer_titles, vec!["zebra", "apple"]);
}

#[tokio::test]
async fn given_page_when_children_then_layers_carry_revision_and_limit_is_sent() {
    let graph = Arc::new(FakeGraph::default());

    let layers = adapter(&graph)
        .children(Some(&node_of(NodeKind::Page)))
        .await
        .unwrap();

    assert_eq!(layers[0].sha(), Some("sha-2"));
    assert_eq!(layers[0].locator.field("pageId"), Some("G"));
    assert_eq!(graph.calls(), vec!["layers G limit=50"]);
}

#[tokio::test]
async fn given_two_parents_when_children_interleaved_then_results_independent() {
    let graph = Arc::new(FakeGraph::default());
    let hierarchy = adapter(&graph);
    let organization = node_of(NodeKind::Organization);
    let page = node_of(NodeKind::Page);

    let (projects, layers) = tokio::join!(
        hierarchy.children(Some(&organization)),
        hierarchy.children(Some(&page)),
    );

    let projects = projects.unwrap();
    let layers = layers.unwrap();
    assert_eq!(projects.len(), 3);
    assert!(projects.iter().all(|n| n.kind() == NodeKind::Project));
    assert!(projects.iter().all(|n| n.ancestry()[&NodeKind::Organization] == "O"));
    let layer_ids: Vec<&str> = layers.iter().map(Node::id).collect();
    assert_eq!(layer_ids, vec!["L2", "L1"]);
    assert!(layers.iter().all(|n| n.locator.field("pageId") == Some("G")));
    let mut calls = graph.calls();
    calls.sort();
    assert_eq!(calls, vec!["layers G limit=50", "projects O"]);
}

#[tokio::test]
async fn given_failing_service_when_children_then_fetch_error() {
    let graph = Arc::new(FakeGraph::failing());

    let result = adapter(&graph).children(Some(&node_of(NodeKind::Branch))).await;

    assert!(matches!(result, Err(ApplicationError::Fetch { .. })));
}

// ============================================================
// preview
// ============================================================

#[rstest]
#[case(NodeKind::Organization)]
#[case(NodeKind::Project)]
#[case(NodeKind::Branch)]
#[case(NodeKind::File)]
#[case(NodeKind::Page)]
#[tokio::test]
async fn given_non_layer_when_preview_then_none_without_call(#[case] kind: NodeKind) {
    let graph = Arc::new(FakeGraph::default());

    let preview = adapter(&graph).preview(&node_of(kind)).await.unwrap();

    assert!(preview.is_none());
    assert!(graph.calls().is_empty());
}

#[tokio::test]
async fn given_layer_when_preview_then_one_call_at_recorded_revision() {
    let graph = Arc::new(FakeGraph::default());

    let preview = adapter(&graph).preview(&layer_node()).await.unwrap();

    assert_eq!(preview.as_deref(), Some(&[0x89, b'P', b'N', b'G'][..]));
    assert_eq!(graph.calls(), vec!["preview L1@sha-1"]);
}

#[tokio::test]
async fn given_failing_service_when_preview_then_fetch_error() {
    let graph = Arc::new(FakeGraph::failing());

    let result = adapter(&graph).preview(&layer_node()).await;

    assert!(matches!(result, Err(ApplicationError::Fetch { .. })));
}

// ============================================================
// resolve / expand
// ============================================================

#[tokio::test]
async fn given_path_when_resolve_then_ancestry_matches_walk() {
    let graph = Arc::new(FakeGraph::default());
    let path: NodePath = "Acme-id/Design-id/main-id".parse().unwrap();

    let branch = adapter(&graph).resolve(&path).await.unwrap().unwrap();

    assert_eq!(branch.kind(), NodeKind::Branch);
    assert_eq!(branch.title, "main");
    let expected = BTreeMap::from([
        (NodeKind::Organization, "Acme-id".to_string()),
        (NodeKind::Project, "Design-id".to_string()),
    ]);
    assert_eq!(branch.ancestry(), expected);
    assert_eq!(NodePath::of(&branch), path);
    assert_eq!(
        graph.calls(),
        vec!["organizations", "projects Acme-id", "branches Design-id"]
    );
}

#[tokio::test]
async fn given_root_path_when_resolve_then_none_without_call() {
    let graph = Arc::new(FakeGraph::default());

    let node = adapter(&graph).resolve(&NodePath::root()).await.unwrap();

    assert!(node.is_none());
    assert!(graph.calls().is_empty());
}

#[tokio::test]
async fn given_unknown_id_when_resolve_then_node_not_found() {
    let graph = Arc::new(FakeGraph::default());
    let path: NodePath = "Acme-id/missing".parse().unwrap();

    let result = adapter(&graph).resolve(&path).await;

    match result {
        Err(ApplicationError::NodeNotFound { kind, id, parent }) => {
            assert_eq!(kind, NodeKind::Project);
            assert_eq!(id, "missing");
            assert_eq!(parent, "Acme-id");
        }
        other => panic!("expected NodeNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn given_path_when_resolve_trail_then_every_level_in_order() {
    let graph = Arc::new(FakeGraph::default());
    let path: NodePath = "Acme-id/Design-id".parse().unwrap();

    let trail = adapter(&graph).resolve_trail(&path).await.unwrap();

    let kinds: Vec<NodeKind> = trail.iter().map(Node::kind).collect();
    assert_eq!(kinds, vec![NodeKind::Organization, NodeKind::Project]);
}

#[tokio::test]
async fn given_depth_two_when_expand_then_grandchildren_fetched() {
    let graph = Arc::new(FakeGraph::default());

    let tree = adapter(&graph).expand(None, 2).await.unwrap();

    assert_eq!(tree.len(), 2);
    assert!(tree.iter().all(|t| t.expanded && t.children.len() == 3));
    assert!(tree[0].children.iter().all(|t| !t.expanded && t.children.is_empty()));
    // root plus one call per organization
    assert_eq!(graph.calls().len(), 3);
}

#[tokio::test]
async fn given_page_when_expand_deep_then_layers_not_expanded() {
    let graph = Arc::new(FakeGraph::default());

    let tree = adapter(&graph)
        .expand(Some(&node_of(NodeKind::Page)), 3)
        .await
        .unwrap();

    assert_eq!(tree.len(), 2);
    assert!(tree.iter().all(|t| !t.expanded));
    assert_eq!(graph.calls().len(), 1);
}
