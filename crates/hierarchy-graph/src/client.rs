use crate::{Properties, Statement};
use async_trait::async_trait;
use hierarchy_core::Result;

/// A pooled graph database client.
///
/// `fetch` holds one connection for the duration of the call and returns it
/// to the pool on every exit path, including when the future is dropped.
#[async_trait]
pub trait GraphClient: Send + Sync {
    /// Execute a statement and return the property map of each node in the
    /// `n` column, in result order.
    async fn fetch(&self, statement: &Statement) -> Result<Vec<Properties>>;

    /// Release every pooled connection. Later fetches fail as transient.
    async fn close(&self) -> Result<()>;
}
