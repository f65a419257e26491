//! Resource tree nodes: kinds, locators and the remote record shapes they are built from.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::DomainError;

/// Level of a node in the fixed hierarchy.
///
/// The derived ordering follows the hierarchy:
/// `Organization < Project < Branch < File < Page < Layer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Organization,
    Project,
    Branch,
    File,
    Page,
    Layer,
}

impl NodeKind {
    /// All kinds, top to bottom.
    pub const ALL: [NodeKind; 6] = [
        NodeKind::Organization,
        NodeKind::Project,
        NodeKind::Branch,
        NodeKind::File,
        NodeKind::Page,
        NodeKind::Layer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Organization => "organization",
            NodeKind::Project => "project",
            NodeKind::Branch => "branch",
            NodeKind::File => "file",
            NodeKind::Page => "page",
            NodeKind::Layer => "layer",
        }
    }

    /// Key under which a node of this kind contributes its id to ancestry and descriptors.
    pub fn id_key(self) -> &'static str {
        match self {
            NodeKind::Organization => "organizationId",
            NodeKind::Project => "projectId",
            NodeKind::Branch => "branchId",
            NodeKind::File => "fileId",
            NodeKind::Page => "pageId",
            NodeKind::Layer => "layerId",
        }
    }

    /// Zero-based level (organization = 0).
    pub fn depth(self) -> usize {
        self as usize
    }

    /// Kind one level below, `None` for the leaf.
    pub fn child(self) -> Option<NodeKind> {
        NodeKind::ALL.get(self.depth() + 1).copied()
    }

    /// Only layers are leaves; everything else is expanded on demand.
    pub fn is_leaf(self) -> bool {
        self == NodeKind::Layer
    }

    /// Pages and layers keep the order the service returns them in.
    pub fn keeps_service_order(self) -> bool {
        matches!(self, NodeKind::Page | NodeKind::Layer)
    }

    /// Glyph shown next to the title in tree views.
    pub fn icon(self) -> &'static str {
        match self {
            NodeKind::Organization => "🏢",
            NodeKind::Project => "📁",
            NodeKind::Branch => "🌿",
            NodeKind::File => "📄",
            NodeKind::Page => "📑",
            NodeKind::Layer => "🔲",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of a node in the hierarchy: its own id plus the id of every ancestor.
///
/// Each variant carries exactly the ids of the levels above it, so a locator
/// cannot have gaps. Layers additionally carry the revision they were last
/// changed at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Organization {
        organization_id: String,
    },
    Project {
        organization_id: String,
        project_id: String,
    },
    Branch {
        organization_id: String,
        project_id: String,
        branch_id: String,
    },
    File {
        organization_id: String,
        project_id: String,
        branch_id: String,
        file_id: String,
    },
    Page {
        organization_id: String,
        project_id: String,
        branch_id: String,
        file_id: String,
        page_id: String,
    },
    Layer {
        organization_id: String,
        project_id: String,
        branch_id: String,
        file_id: String,
        page_id: String,
        layer_id: String,
        sha: String,
    },
}

// One constructor per level transition: each takes exactly the parent's ids.
impl Locator {
    pub fn organization(organization_id: impl Into<String>) -> Self {
        Locator::Organization {
            organization_id: organization_id.into(),
        }
    }

    pub fn project(organization_id: &str, project_id: impl Into<String>) -> Self {
        Locator::Project {
            organization_id: organization_id.to_string(),
            project_id: project_id.into(),
        }
    }

    pub fn branch(organization_id: &str, project_id: &str, branch_id: impl Into<String>) -> Self {
        Locator::Branch {
            organization_id: organization_id.to_string(),
            project_id: project_id.to_string(),
            branch_id: branch_id.into(),
        }
    }

    pub fn file(
        organization_id: &str,
        project_id: &str,
        branch_id: &str,
        file_id: impl Into<String>,
    ) -> Self {
        Locator::File {
            organization_id: organization_id.to_string(),
            project_id: project_id.to_string(),
            branch_id: branch_id.to_string(),
            file_id: file_id.into(),
        }
    }

    pub fn page(
        organization_id: &str,
        project_id: &str,
        branch_id: &str,
        file_id: &str,
        page_id: impl Into<String>,
    ) -> Self {
        Locator::Page {
            organization_id: organization_id.to_string(),
            project_id: project_id.to_string(),
            branch_id: branch_id.to_string(),
            file_id: file_id.to_string(),
            page_id: page_id.into(),
        }
    }

    pub fn layer(
        organization_id: &str,
        project_id: &str,
        branch_id: &str,
        file_id: &str,
        page_id: &str,
        layer_id: impl Into<String>,
        sha: impl Into<String>,
    ) -> Self {
        Locator::Layer {
            organization_id: organization_id.to_string(),
            project_id: project_id.to_string(),
            branch_id: branch_id.to_string(),
            file_id: file_id.to_string(),
            page_id: page_id.to_string(),
            layer_id: layer_id.into(),
            sha: sha.into(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Locator::Organization { .. } => NodeKind::Organization,
            Locator::Project { .. } => NodeKind::Project,
            Locator::Branch { .. } => NodeKind::Branch,
            Locator::File { .. } => NodeKind::File,
            Locator::Page { .. } => NodeKind::Page,
            Locator::Layer { .. } => NodeKind::Layer,
        }
    }

    /// Ids top to bottom, ending with the node's own id.
    pub fn ids(&self) -> Vec<&str> {
        match self {
            Locator::Organization { organization_id } => vec![organization_id.as_str()],
            Locator::Project {
                organization_id,
                project_id,
            } => vec![organization_id.as_str(), project_id.as_str()],
            Locator::Branch {
                organization_id,
                project_id,
                branch_id,
            } => vec![
                organization_id.as_str(),
                project_id.as_str(),
                branch_id.as_str(),
            ],
            Locator::File {
                organization_id,
                project_id,
                branch_id,
                file_id,
            } => vec![
                organization_id.as_str(),
                project_id.as_str(),
                branch_id.as_str(),
                file_id.as_str(),
            ],
            Locator::Page {
                organization_id,
                project_id,
                branch_id,
                file_id,
                page_id,
            } => vec![
                organization_id.as_str(),
                project_id.as_str(),
                branch_id.as_str(),
                file_id.as_str(),
                page_id.as_str(),
            ],
            Locator::Layer {
                organization_id,
                project_id,
                branch_id,
                file_id,
                page_id,
                layer_id,
                ..
            } => vec![
                organization_id.as_str(),
                project_id.as_str(),
                branch_id.as_str(),
                file_id.as_str(),
                page_id.as_str(),
                layer_id.as_str(),
            ],
        }
    }

    pub fn id(&self) -> &str {
        self.ids().last().copied().unwrap_or_default()
    }

    pub fn sha(&self) -> Option<&str> {
        match self {
            Locator::Layer { sha, .. } => Some(sha.as_str()),
            _ => None,
        }
    }

    /// Look up a field by its wire name (`projectId`, `sha`, ...).
    pub fn field(&self, key: &str) -> Option<&str> {
        if key == "sha" {
            return self.sha();
        }
        NodeKind::ALL
            .into_iter()
            .zip(self.ids())
            .find(|(kind, _)| kind.id_key() == key)
            .map(|(_, id)| id)
    }
}

/// One entry in the lazily loaded resource tree.
///
/// Created fresh on every expansion and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub title: String,
    pub locator: Locator,
    /// Raw fields of the remote record, shown in the details view.
    pub attributes: Map<String, Value>,
}

impl Node {
    pub fn new(title: impl Into<String>, locator: Locator, attributes: Map<String, Value>) -> Self {
        Self {
            title: title.into(),
            locator,
            attributes,
        }
    }

    pub fn from_record(record: Record, locator: Locator) -> Self {
        let title = record.name.clone();
        Self::new(title, locator, record.into_attributes())
    }

    pub fn from_layer_record(record: LayerRecord, locator: Locator) -> Self {
        let title = record.name.clone();
        Self::new(title, locator, record.into_attributes())
    }

    pub fn id(&self) -> &str {
        self.locator.id()
    }

    pub fn kind(&self) -> NodeKind {
        self.locator.kind()
    }

    pub fn sha(&self) -> Option<&str> {
        self.locator.sha()
    }

    pub fn is_leaf(&self) -> bool {
        self.kind().is_leaf()
    }

    /// Ids of all kinds strictly above this node.
    pub fn ancestry(&self) -> BTreeMap<NodeKind, String> {
        NodeKind::ALL
            .into_iter()
            .zip(self.locator.ids())
            .filter(|(kind, _)| *kind < self.kind())
            .map(|(kind, id)| (kind, id.to_string()))
            .collect()
    }

    /// Icon plus title, as rendered in tree views.
    pub fn label(&self) -> String {
        format!("{} {}", self.kind().icon(), self.title)
    }
}

/// Order siblings of one kind for display.
///
/// Titles sort ascending and case-sensitive; pages and layers keep service order.
pub fn sort_siblings(kind: NodeKind, nodes: &mut [Node]) {
    if !kind.keeps_service_order() {
        nodes.sort_by(|a, b| a.title.cmp(&b.title));
    }
}

/// Remote record for organizations, projects, branches, files and pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            extra: Map::new(),
        }
    }

    fn into_attributes(self) -> Map<String, Value> {
        let mut attrs = Map::new();
        attrs.insert("id".into(), Value::String(self.id));
        attrs.insert("name".into(), Value::String(self.name));
        attrs.extend(self.extra);
        attrs
    }
}

/// Remote record for layers; the revision is mandatory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerRecord {
    pub id: String,
    pub name: String,
    pub last_changed_at_sha: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LayerRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, sha: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            last_changed_at_sha: sha.into(),
            extra: Map::new(),
        }
    }

    fn into_attributes(self) -> Map<String, Value> {
        let mut attrs = Map::new();
        attrs.insert("id".into(), Value::String(self.id));
        attrs.insert("name".into(), Value::String(self.name));
        attrs.insert(
            "lastChangedAtSha".into(),
            Value::String(self.last_changed_at_sha),
        );
        attrs.extend(self.extra);
        attrs
    }
}

/// Slash-separated id path addressing a node from the root,
/// e.g. `org/project/branch/file/page/layer`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePath {
    segments: Vec<String>,
}

impl NodePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn of(node: &Node) -> Self {
        Self {
            segments: node.locator.ids().into_iter().map(String::from).collect(),
        }
    }
}

impl FromStr for NodePath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        let segments: Vec<String> = trimmed.split('/').map(|p| p.trim().to_string()).collect();
        if segments.iter().any(|p| p.is_empty()) {
            return Err(DomainError::InvalidPath {
                path: s.to_string(),
                message: "empty segment".into(),
            });
        }
        if segments.len() > NodeKind::ALL.len() {
            return Err(DomainError::InvalidPath {
                path: s.to_string(),
                message: format!("at most {} segments allowed", NodeKind::ALL.len()),
            });
        }
        Ok(Self { segments })
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer() -> Node {
        Node::from_layer_record(
            LayerRecord::new("L", "Button", "abc123"),
            Locator::layer("O", "P", "B", "F", "Pg", "L", "abc123"),
        )
    }

    #[test]
    fn given_kinds_when_ordered_then_follow_hierarchy() {
        assert!(NodeKind::Organization < NodeKind::Project);
        assert!(NodeKind::Page < NodeKind::Layer);
        assert_eq!(NodeKind::Branch.child(), Some(NodeKind::File));
        assert_eq!(NodeKind::Layer.child(), None);
    }

    #[test]
    fn given_layer_when_ancestry_then_contains_all_levels_above() {
        let node = layer();
        let ancestry = node.ancestry();

        assert_eq!(ancestry.len(), 5);
        assert_eq!(ancestry[&NodeKind::Page], "Pg");
        assert!(!ancestry.contains_key(&NodeKind::Layer));
        assert_eq!(node.sha(), Some("abc123"));
    }

    #[test]
    fn given_organization_when_ancestry_then_empty() {
        let node = Node::from_record(Record::new("O", "Acme"), Locator::organization("O"));
        assert!(node.ancestry().is_empty());
        assert_eq!(node.id(), "O");
    }

    #[test]
    fn given_locator_when_field_lookup_then_resolves_wire_names() {
        let loc = Locator::layer("O", "P", "B", "F", "Pg", "L", "abc123");
        assert_eq!(loc.field("fileId"), Some("F"));
        assert_eq!(loc.field("layerId"), Some("L"));
        assert_eq!(loc.field("sha"), Some("abc123"));
        assert_eq!(Locator::organization("O").field("projectId"), None);
    }

    #[test]
    fn given_layer_record_when_node_then_attributes_keep_raw_fields() {
        let mut record = LayerRecord::new("L", "Button", "abc123");
        record.extra.insert("width".into(), Value::from(120));
        let locator = Locator::layer("O", "P", "B", "F", "Pg", "L", "abc123");
        let node = Node::from_layer_record(record, locator);

        assert_eq!(node.attributes["lastChangedAtSha"], "abc123");
        assert_eq!(node.attributes["width"], 120);
    }

    #[test]
    fn given_layer_json_without_sha_when_deserialized_then_rejected() {
        let result: Result<LayerRecord, _> = serde_json::from_str(r#"{"id":"L","name":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn given_path_string_when_parsed_then_segments_trimmed() {
        let path: NodePath = "/O/P/B/".parse().unwrap();
        assert_eq!(path.segments(), ["O", "P", "B"]);
        assert_eq!(path.to_string(), "O/P/B");
        assert_eq!("".parse::<NodePath>().unwrap(), NodePath::root());
    }

    #[test]
    fn given_bad_path_when_parsed_then_error() {
        assert!("O//B".parse::<NodePath>().is_err());
        assert!("1/2/3/4/5/6/7".parse::<NodePath>().is_err());
    }

    #[test]
    fn given_node_when_path_of_then_round_trips_ids() {
        assert_eq!(NodePath::of(&layer()).to_string(), "O/P/B/F/Pg/L");
    }
}
