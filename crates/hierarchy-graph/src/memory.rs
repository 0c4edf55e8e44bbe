//! In-process `GraphClient` that evaluates statements against fixture trees.
//!
//! Mirrors the Cypher semantics of each `StatementKind` closely enough for
//! the query layer, the assembler and the HTTP surface to be exercised
//! without a running database.

use crate::{
    GraphClient, Properties, Property, Statement, StatementKind, CODE, CODE_LIST, HAS_DATA,
    LABEL, NUMBER_OF_CHILDREN, ORDER,
};
use async_trait::async_trait;
use hierarchy_core::{HierarchyId, Result, StoreError};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone)]
pub struct MemoryNode {
    pub code: String,
    pub label: String,
    pub has_data: bool,
    pub number_of_children: i64,
    pub order: Option<i64>,
    pub code_list: Option<String>,
    pub parent: Option<String>,
    /// Applied last, so tests can plant malformed rows
    pub overrides: Properties,
}

impl MemoryNode {
    pub fn new(code: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
            has_data: false,
            number_of_children: 0,
            order: None,
            code_list: None,
            parent: None,
            overrides: Properties::new(),
        }
    }

    pub fn parent(mut self, code: impl Into<String>) -> Self {
        self.parent = Some(code.into());
        self
    }

    pub fn children(mut self, count: i64) -> Self {
        self.number_of_children = count;
        self
    }

    pub fn with_data(mut self) -> Self {
        self.has_data = true;
        self
    }

    pub fn order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    pub fn code_list(mut self, id: impl Into<String>) -> Self {
        self.code_list = Some(id.into());
        self
    }

    pub fn property(mut self, key: &str, value: Property) -> Self {
        self.overrides.insert(key.to_string(), value);
        self
    }

    fn properties(&self) -> Properties {
        let mut props = Properties::from([
            (CODE.to_string(), Property::from(self.code.as_str())),
            (LABEL.to_string(), Property::from(self.label.as_str())),
            (HAS_DATA.to_string(), Property::from(self.has_data)),
            (NUMBER_OF_CHILDREN.to_string(), Property::from(self.number_of_children)),
        ]);
        if let Some(order) = self.order {
            props.insert(ORDER.to_string(), Property::from(order));
        }
        if let Some(code_list) = &self.code_list {
            props.insert(CODE_LIST.to_string(), Property::from(code_list.as_str()));
        }
        props.extend(self.overrides.clone());
        props
    }
}

#[derive(Debug, Default)]
pub struct InMemoryGraph {
    labels: RwLock<HashMap<String, Vec<MemoryNode>>>,
    failure: RwLock<Option<StoreError>>,
    fetches: AtomicUsize,
    closed: RwLock<bool>,
}

impl InMemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: &HierarchyId, node: MemoryNode) {
        self.labels
            .write()
            .entry(id.node_label())
            .or_default()
            .push(node);
    }

    /// Make every following fetch fail with `err` until cleared with `None`.
    pub fn fail_with(&self, err: Option<StoreError>) {
        *self.failure.write() = err;
    }

    /// Number of statements executed so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.read()
    }

    fn evaluate(&self, statement: &Statement) -> Vec<Properties> {
        let labels = self.labels.read();
        let nodes = statement
            .label
            .as_ref()
            .and_then(|label| labels.get(label))
            .map(Vec::as_slice)
            .unwrap_or_default();
        let code = statement.code.as_deref().unwrap_or_default();

        let matched: Vec<&MemoryNode> = match statement.kind {
            StatementKind::Probe => labels.values().flatten().take(1).collect(),
            StatementKind::AnyNode => nodes.iter().take(1).collect(),
            StatementKind::Root => nodes
                .iter()
                .filter(|n| match &n.parent {
                    None => true,
                    Some(parent) => find(nodes, parent.as_str()).next().is_none(),
                })
                .collect(),
            StatementKind::Node => find(nodes, code).collect(),
            StatementKind::Children => {
                if find(nodes, code).next().is_none() {
                    Vec::new()
                } else {
                    let mut children: Vec<_> = nodes
                        .iter()
                        .filter(|n| n.parent.as_deref() == Some(code))
                        .collect();
                    children.sort_by(|a, b| a.label.cmp(&b.label));
                    children
                }
            }
            StatementKind::Ancestors => {
                let mut chain = Vec::new();
                let mut seen = HashSet::new();
                let mut current = find(nodes, code).next();
                while let Some(node) = current {
                    if !seen.insert(node.code.as_str()) {
                        break;
                    }
                    current = node.parent.as_deref().and_then(|p| find(nodes, p).next());
                    if let Some(parent) = current {
                        chain.push(parent);
                    }
                }
                chain
            }
        };

        matched.into_iter().map(MemoryNode::properties).collect()
    }
}

fn find<'a>(nodes: &'a [MemoryNode], code: &'a str) -> impl Iterator<Item = &'a MemoryNode> + 'a {
    nodes.iter().filter(move |n| n.code == code)
}

#[async_trait]
impl GraphClient for InMemoryGraph {
    async fn fetch(&self, statement: &Statement) -> Result<Vec<Properties>> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        if *self.closed.read() {
            return Err(StoreError::Transient("connection pool closed".to_string()));
        }
        if let Some(err) = self.failure.read().clone() {
            return Err(err);
        }
        Ok(self.evaluate(statement))
    }

    async fn close(&self) -> Result<()> {
        *self.closed.write() = true;
        Ok(())
    }
}
