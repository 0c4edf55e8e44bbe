use crate::{GraphClient, Properties, Property, Statement, RETURN_COLUMN};
use async_trait::async_trait;
use hierarchy_core::{GraphConfig, Result, StoreError};
use neo4rs::{query, ConfigBuilder, Graph, Node};
use parking_lot::RwLock;
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Bolt client backed by the neo4rs connection pool.
pub struct Neo4jClient {
    pool: RwLock<Option<Arc<Graph>>>,
    query_timeout: Duration,
}

impl std::fmt::Debug for Neo4jClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Neo4jClient")
            .field("open", &self.pool.read().is_some())
            .field("query_timeout", &self.query_timeout)
            .finish()
    }
}

impl Neo4jClient {
    pub async fn connect(config: &GraphConfig) -> Result<Self> {
        info!(
            uri = %config.uri,
            max_connections = config.max_connections,
            "Connecting to graph database"
        );

        let password = config
            .password
            .as_ref()
            .map(|p| p.expose_secret().to_string())
            .unwrap_or_default();
        let mut builder = ConfigBuilder::default()
            .uri(config.uri.as_str())
            .user(config.username.as_str())
            .password(password.as_str())
            .max_connections(config.max_connections);
        if let Some(db) = &config.database {
            builder = builder.db(db.as_str());
        }
        let neo_config = builder
            .build()
            .map_err(|e| StoreError::Transient(format!("invalid graph configuration: {}", e)))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| StoreError::Transient(format!("failed to connect: {}", e)))?;

        info!("Graph database pool initialised");
        Ok(Self {
            pool: RwLock::new(Some(Arc::new(graph))),
            query_timeout: config.query_timeout(),
        })
    }

    fn graph(&self) -> Result<Arc<Graph>> {
        self.pool
            .read()
            .clone()
            .ok_or_else(|| StoreError::Transient("connection pool closed".to_string()))
    }

    async fn execute(&self, graph: &Graph, statement: &Statement) -> Result<Vec<Properties>> {
        let mut q = query(&statement.cypher);
        if let Some(code) = &statement.code {
            q = q.param("code", code.as_str());
        }

        let mut rows = graph
            .execute(q)
            .await
            .map_err(|e| StoreError::Transient(format!("query failed: {}", e)))?;

        let mut results = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::Transient(format!("reading rows failed: {}", e)))?
        {
            let node: Node = row
                .get(RETURN_COLUMN)
                .map_err(|e| StoreError::decode(RETURN_COLUMN, e.to_string()))?;
            results.push(node_properties(&node));
        }
        Ok(results)
    }
}

#[async_trait]
impl GraphClient for Neo4jClient {
    async fn fetch(&self, statement: &Statement) -> Result<Vec<Properties>> {
        let graph = self.graph()?;
        debug!(
            kind = statement.kind.as_str(),
            label = statement.label.as_deref().unwrap_or(""),
            "Executing graph statement"
        );

        match tokio::time::timeout(self.query_timeout, self.execute(&graph, statement)).await {
            Ok(Ok(rows)) => Ok(rows),
            Ok(Err(e)) => {
                error!(statement = %statement.cypher, error = %e, "Graph statement failed");
                Err(e)
            }
            Err(_) => {
                error!(
                    statement = %statement.cypher,
                    timeout_secs = self.query_timeout.as_secs(),
                    "Graph statement timed out"
                );
                Err(StoreError::Transient(format!(
                    "statement timed out after {:?}",
                    self.query_timeout
                )))
            }
        }
    }

    async fn close(&self) -> Result<()> {
        if self.pool.write().take().is_some() {
            info!("Graph database pool closed");
        }
        Ok(())
    }
}

fn node_properties(node: &Node) -> Properties {
    node.keys()
        .into_iter()
        .map(|key| (key.to_string(), property(node, key)))
        .collect()
}

fn property(node: &Node, key: &str) -> Property {
    if let Ok(v) = node.get::<String>(key) {
        return Property::String(v);
    }
    if let Ok(v) = node.get::<bool>(key) {
        return Property::Bool(v);
    }
    if let Ok(v) = node.get::<i64>(key) {
        return Property::Integer(v);
    }
    if let Ok(v) = node.get::<f64>(key) {
        return Property::Float(v);
    }
    Property::Other
}
