//! Link resolution: descriptors, web URLs and app deep links for tree nodes.
//!
//! All three are table driven: each kind maps to the fields it exposes and
//! the path it lives under. A kind without a table entry resolves to nothing.

use std::fmt;

use itertools::Itertools;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use url::Url;

use crate::domain::{Node, NodeKind};

const ORGANIZATION_FIELDS: &[&str] = &["organizationId"];
const PROJECT_FIELDS: &[&str] = &["projectId"];
const BRANCH_FIELDS: &[&str] = &["projectId", "branchId"];
const FILE_FIELDS: &[&str] = &["projectId", "branchId", "fileId"];
const PAGE_FIELDS: &[&str] = &["projectId", "branchId", "fileId", "pageId"];
const LAYER_FIELDS: &[&str] = &["projectId", "branchId", "fileId", "pageId", "layerId", "sha"];

/// Fields identifying a node of each kind.
const DESCRIPTOR_FIELDS: &[(NodeKind, &[&str])] = &[
    (NodeKind::Organization, ORGANIZATION_FIELDS),
    (NodeKind::Project, PROJECT_FIELDS),
    (NodeKind::Branch, BRANCH_FIELDS),
    (NodeKind::File, FILE_FIELDS),
    (NodeKind::Page, PAGE_FIELDS),
    (NodeKind::Layer, LAYER_FIELDS),
];

struct WebShape {
    kind: NodeKind,
    /// Path below the web base; `{field}` segments are filled from the node.
    template: &'static str,
    query: Option<(&'static str, &'static str)>,
}

const WEB_SHAPES: &[WebShape] = &[
    WebShape {
        kind: NodeKind::Organization,
        template: "organizations/{organizationId}",
        query: None,
    },
    WebShape {
        kind: NodeKind::Project,
        template: "projects/{projectId}",
        query: None,
    },
    WebShape {
        kind: NodeKind::Branch,
        template: "projects/{projectId}/branches/{branchId}",
        query: None,
    },
    WebShape {
        kind: NodeKind::File,
        template: "projects/{projectId}/branches/{branchId}/files/{fileId}",
        query: None,
    },
    WebShape {
        kind: NodeKind::Page,
        template: "projects/{projectId}/branches/{branchId}/files/{fileId}/pages/{pageId}",
        query: None,
    },
    // "build" is the inspect mode of the web app.
    WebShape {
        kind: NodeKind::Layer,
        template: "projects/{projectId}/branches/{branchId}/commits/{sha}/files/{fileId}/layers/{layerId}",
        query: Some(("mode", "build")),
    },
];

/// Kinds that have a deep link, and the query fields it carries.
const APP_SHAPES: &[(NodeKind, &[&str])] = DESCRIPTOR_FIELDS;

/// Ordered identifying fields of a node, for display and debugging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Descriptor {
    fields: Vec<(&'static str, String)>,
}

impl Descriptor {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(k, _)| *k)
    }
}

impl Serialize for Descriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = self
            .fields
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .join("\n");
        f.write_str(&body)
    }
}

/// Where links point to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSettings {
    pub web_base_url: Url,
    /// Scheme of app deep links, without `://`.
    pub app_scheme: String,
}

/// Derives descriptors and outward-facing URLs from nodes. Pure and stateless.
#[derive(Debug, Clone)]
pub struct LinkResolver {
    settings: LinkSettings,
}

impl LinkResolver {
    pub fn new(settings: LinkSettings) -> Self {
        Self { settings }
    }

    fn fields_for(
        kind: NodeKind,
        table: &[(NodeKind, &'static [&'static str])],
    ) -> Option<&'static [&'static str]> {
        table.iter().find(|(k, _)| *k == kind).map(|(_, f)| *f)
    }

    pub fn descriptor_of(&self, node: &Node) -> Descriptor {
        let fields = Self::fields_for(node.kind(), DESCRIPTOR_FIELDS)
            .unwrap_or_default()
            .iter()
            .filter_map(|key| node.locator.field(key).map(|v| (*key, v.to_string())))
            .collect();
        Descriptor { fields }
    }

    /// Browser URL of the node, `None` when the node lacks a field its path needs.
    pub fn web_url_of(&self, node: &Node) -> Option<Url> {
        let shape = WEB_SHAPES.iter().find(|s| s.kind == node.kind())?;

        let mut segments = Vec::new();
        for part in shape.template.split('/') {
            let segment = match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                Some(key) => node.locator.field(key).filter(|v| !v.is_empty())?,
                None => part,
            };
            segments.push(segment);
        }

        let mut url = self.settings.web_base_url.clone();
        url.path_segments_mut().ok()?.pop_if_empty().extend(segments);
        if let Some((key, value)) = shape.query {
            url.query_pairs_mut().append_pair(key, value);
        }
        Some(url)
    }

    /// Custom-scheme deep link, `None` for kinds without a deep-link shape.
    pub fn app_url_of(&self, node: &Node) -> Option<Url> {
        let fields = Self::fields_for(node.kind(), APP_SHAPES)?;
        let mut url = Url::parse(&format!("{}://share", self.settings.app_scheme)).ok()?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("kind", node.kind().as_str());
            for key in fields {
                query.append_pair(key, node.locator.field(key)?);
            }
        }
        Some(url)
    }
}
