use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one hierarchy: an instance/dimension pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HierarchyId {
    pub instance_id: String,
    pub dimension: String,
}

impl HierarchyId {
    pub fn new(instance_id: impl Into<String>, dimension: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            dimension: dimension.into(),
        }
    }

    /// Graph label under which the ingestion process stores this hierarchy's nodes.
    pub fn node_label(&self) -> String {
        format!("_hierarchy_node_{}_{}", self.instance_id, self.dimension)
    }
}

impl fmt::Display for HierarchyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.instance_id, self.dimension)
    }
}

/// A node as stored in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyNode {
    pub code: String,
    pub label: String,
    pub has_data: bool,
    pub number_of_children: u64,
    pub order: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Links {
    pub code: Link,
    #[serde(rename = "self")]
    pub self_link: Link,
}

/// An entry in a `children` or `breadcrumbs` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    #[serde(skip)]
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub no_of_children: u64,
    #[serde(default)]
    pub has_data: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
}

impl From<HierarchyNode> for Element {
    fn from(node: HierarchyNode) -> Self {
        Self {
            id: node.code,
            label: node.label,
            no_of_children: node.number_of_children,
            has_data: node.has_data,
            order: node.order,
            links: None,
        }
    }
}

/// The body returned for a hierarchy root or node lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    #[serde(skip)]
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub no_of_children: u64,
    #[serde(default)]
    pub has_data: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub breadcrumbs: Vec<Element>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
}

impl Response {
    pub fn new(node: HierarchyNode, children: Vec<HierarchyNode>) -> Self {
        Self {
            id: node.code,
            label: node.label,
            children: children.into_iter().map(Element::from).collect(),
            no_of_children: node.number_of_children,
            has_data: node.has_data,
            order: node.order,
            breadcrumbs: Vec::new(),
            links: None,
        }
    }

    pub fn with_breadcrumbs(mut self, ancestors: Vec<HierarchyNode>) -> Self {
        self.breadcrumbs = ancestors.into_iter().map(Element::from).collect();
        self
    }
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}
