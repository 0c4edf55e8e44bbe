use crate::{decode_code_list, decode_node, GraphClient, Statement};
use hierarchy_core::{HierarchyId, HierarchyNode, Result, StoreError};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Read-only traversal primitives over one graph database.
#[derive(Clone)]
pub struct HierarchyStore {
    client: Arc<dyn GraphClient>,
}

impl HierarchyStore {
    pub fn new(client: Arc<dyn GraphClient>) -> Self {
        Self { client }
    }

    /// Code list enumerated by the hierarchy. An unknown hierarchy, or one
    /// whose nodes carry no code list, is `NotFound`.
    pub async fn resolve_code_list(&self, id: &HierarchyId) -> Result<String> {
        let statement = Statement::any_node(id);
        let rows = self.client.fetch(&statement).await?;
        let Some(props) = rows.first() else {
            debug!(hierarchy = %id, "No nodes for hierarchy");
            return Err(StoreError::NotFound(format!("hierarchy {}", id)));
        };
        decode_code_list(props)?
            .ok_or_else(|| StoreError::NotFound(format!("code list for hierarchy {}", id)))
    }

    pub async fn fetch_root(&self, id: &HierarchyId) -> Result<HierarchyNode> {
        self.fetch_one(&Statement::root(id), format!("root of hierarchy {}", id))
            .await
    }

    pub async fn fetch_node(&self, id: &HierarchyId, code: &str) -> Result<HierarchyNode> {
        self.fetch_one(
            &Statement::node(id, code),
            format!("code {} in hierarchy {}", code, id),
        )
        .await
    }

    /// Direct children ordered by label ascending; empty for a leaf.
    pub async fn fetch_children(&self, id: &HierarchyId, code: &str) -> Result<Vec<HierarchyNode>> {
        self.fetch_many(&Statement::children(id, code)).await
    }

    /// Every ancestor of `code`, nearest first and the root last. The node
    /// itself is not included.
    pub async fn fetch_ancestors(&self, id: &HierarchyId, code: &str) -> Result<Vec<HierarchyNode>> {
        self.fetch_many(&Statement::ancestors(id, code)).await
    }

    pub async fn ping(&self) -> Result<()> {
        self.client.fetch(&Statement::probe()).await.map(|_| ())
    }

    pub async fn close(&self) -> Result<()> {
        self.client.close().await
    }

    async fn fetch_one(&self, statement: &Statement, context: String) -> Result<HierarchyNode> {
        let rows = self.client.fetch(statement).await?;
        match rows.as_slice() {
            [] => Err(StoreError::NotFound(context)),
            [props] => decode_node(props).map_err(|e| log_decode(statement, e)),
            _ => {
                error!(
                    statement = %statement.cypher,
                    code = statement.code.as_deref().unwrap_or(""),
                    rows = rows.len(),
                    "Expected a single row, hierarchy data is inconsistent"
                );
                Err(StoreError::Ambiguous {
                    rows: rows.len(),
                    context,
                })
            }
        }
    }

    async fn fetch_many(&self, statement: &Statement) -> Result<Vec<HierarchyNode>> {
        let rows = self.client.fetch(statement).await?;
        debug!(
            kind = statement.kind.as_str(),
            code = statement.code.as_deref().unwrap_or(""),
            rows = rows.len(),
            "Fetched node list"
        );
        rows.iter()
            .map(|props| decode_node(props).map_err(|e| log_decode(statement, e)))
            .collect()
    }
}

fn log_decode(statement: &Statement, err: StoreError) -> StoreError {
    warn!(statement = %statement.cypher, error = %err, "Failed to decode hierarchy node");
    err
}
