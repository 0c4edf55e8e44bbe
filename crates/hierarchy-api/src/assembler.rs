use crate::{ApiError, ApiResult, HierarchyLinks, LinkBases};
use hierarchy_core::{HierarchyId, Response, StoreError};
use hierarchy_graph::HierarchyStore;
use tracing::{error, info};

/// Builds complete, linked responses from the graph query layer.
///
/// A response is either fully assembled or not returned at all: any failure
/// while fetching the node, its children or its ancestors fails the request.
#[derive(Clone)]
pub struct HierarchyAssembler {
    store: HierarchyStore,
}

impl HierarchyAssembler {
    pub fn new(store: HierarchyStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &HierarchyStore {
        &self.store
    }

    pub async fn get_root(&self, id: &HierarchyId, bases: &LinkBases) -> ApiResult<Response> {
        let code_list_id = self.code_list(id).await?;

        let root = self.store.fetch_root(id).await.map_err(|e| match e {
            StoreError::NotFound(_) => ApiError::HierarchyNotFound(id.to_string()),
            other => internal(id, None, "error getting hierarchy root", other),
        })?;
        let children = self
            .store
            .fetch_children(id, &root.code)
            .await
            .map_err(|e| internal(id, Some(&root.code), "error getting root children", e))?;

        let mut response = Response::new(root, children);
        HierarchyLinks::new(bases, id, &code_list_id).decorate(&mut response, true);

        info!(instance_id = %id.instance_id, dimension = %id.dimension, "get hierarchy root successful");
        Ok(response)
    }

    pub async fn get_node(
        &self,
        id: &HierarchyId,
        code: &str,
        bases: &LinkBases,
    ) -> ApiResult<Response> {
        let code_list_id = self.code_list(id).await?;

        let node = match self.store.fetch_node(id, code).await {
            Ok(node) if node.label.is_empty() => {
                info!(instance_id = %id.instance_id, dimension = %id.dimension, code, "code has no label");
                return Err(ApiError::CodeNotFound(code.to_string()));
            }
            Ok(node) => node,
            Err(StoreError::NotFound(_)) => {
                info!(instance_id = %id.instance_id, dimension = %id.dimension, code, "code not found");
                return Err(ApiError::CodeNotFound(code.to_string()));
            }
            Err(e) => return Err(internal(id, Some(code), "error getting hierarchy node", e)),
        };

        let children = self
            .store
            .fetch_children(id, code)
            .await
            .map_err(|e| internal(id, Some(code), "error getting node children", e))?;
        let ancestors = self
            .store
            .fetch_ancestors(id, code)
            .await
            .map_err(|e| internal(id, Some(code), "error getting node ancestry", e))?;

        let mut response = Response::new(node, children).with_breadcrumbs(ancestors);
        HierarchyLinks::new(bases, id, &code_list_id).decorate(&mut response, false);

        info!(instance_id = %id.instance_id, dimension = %id.dimension, code, "get hierarchy node successful");
        Ok(response)
    }

    async fn code_list(&self, id: &HierarchyId) -> ApiResult<String> {
        self.store.resolve_code_list(id).await.map_err(|e| match e {
            StoreError::NotFound(_) => {
                info!(instance_id = %id.instance_id, dimension = %id.dimension, "hierarchy not found");
                ApiError::HierarchyNotFound(id.to_string())
            }
            other => internal(id, None, "error getting hierarchy code list", other),
        })
    }
}

fn internal(id: &HierarchyId, code: Option<&str>, message: &str, err: StoreError) -> ApiError {
    error!(
        instance_id = %id.instance_id,
        dimension = %id.dimension,
        code = code.unwrap_or(""),
        error = %err,
        "{}",
        message
    );
    ApiError::Store(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hierarchy_graph::{InMemoryGraph, MemoryNode};
    use std::sync::Arc;

    fn hierarchy() -> HierarchyId {
        HierarchyId::new("hier12", "dim34")
    }

    fn bases() -> LinkBases {
        LinkBases::new("http://h", "http://cl")
    }

    fn fixture() -> (Arc<InMemoryGraph>, HierarchyAssembler) {
        let graph = Arc::new(InMemoryGraph::new());
        let id = hierarchy();
        for node in [
            MemoryNode::new("root", "h-lay-bull").children(1),
            MemoryNode::new("c1", "h-child1").parent("root").children(2),
            MemoryNode::new("g2", "zeta").parent("c1"),
            MemoryNode::new("g1", "alpha").parent("c1").with_data(),
            MemoryNode::new("blank", "").parent("root"),
        ] {
            graph.insert(&id, node.code_list("clistABC"));
        }
        let assembler = HierarchyAssembler::new(HierarchyStore::new(graph.clone()));
        (graph, assembler)
    }

    #[tokio::test]
    async fn root_has_children_and_no_breadcrumbs() {
        let (_, assembler) = fixture();
        let res = assembler.get_root(&hierarchy(), &bases()).await.unwrap();
        assert_eq!(res.label, "h-lay-bull");
        assert!(res.breadcrumbs.is_empty());
        let labels: Vec<_> = res.children.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["", "h-child1"]);
        let links = res.links.unwrap();
        assert_eq!(links.self_link.href, "http://h/hierarchies/hier12/dim34");
        assert!(links.self_link.id.is_none());
        assert_eq!(links.code.id.as_deref(), Some("root"));
    }

    #[tokio::test]
    async fn node_has_ordered_children_and_breadcrumbs() {
        let (_, assembler) = fixture();
        let res = assembler.get_node(&hierarchy(), "g1", &bases()).await.unwrap();
        assert!(res.has_data);
        let crumbs: Vec<_> = res.breadcrumbs.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(crumbs, vec!["c1", "root"]);
        let root_crumb = res.breadcrumbs[1].links.as_ref().unwrap();
        assert_eq!(root_crumb.self_link.href, "http://h/hierarchies/hier12/dim34");

        let mid = assembler.get_node(&hierarchy(), "c1", &bases()).await.unwrap();
        let labels: Vec<_> = mid.children.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["alpha", "zeta"]);
        assert_eq!(
            mid.links.unwrap().self_link.href,
            "http://h/hierarchies/hier12/dim34/c1"
        );
    }

    #[tokio::test]
    async fn repeated_calls_are_identical() {
        let (_, assembler) = fixture();
        let first = assembler.get_node(&hierarchy(), "c1", &bases()).await.unwrap();
        let second = assembler.get_node(&hierarchy(), "c1", &bases()).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn unknown_hierarchy_and_code_are_not_found() {
        let (_, assembler) = fixture();
        let err = assembler
            .get_root(&HierarchyId::new("none", "dim34"), &bases())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::HierarchyNotFound(_)));

        let err = assembler.get_node(&hierarchy(), "nope", &bases()).await.unwrap_err();
        assert!(matches!(err, ApiError::CodeNotFound(_)));
    }

    #[tokio::test]
    async fn empty_label_is_treated_as_missing() {
        let (_, assembler) = fixture();
        let err = assembler.get_node(&hierarchy(), "blank", &bases()).await.unwrap_err();
        assert!(matches!(err, ApiError::CodeNotFound(code) if code == "blank"));
    }

    #[tokio::test]
    async fn transient_code_list_failure_is_internal() {
        let (graph, assembler) = fixture();
        graph.fail_with(Some(StoreError::Transient("connection refused".into())));
        let err = assembler.get_root(&hierarchy(), &bases()).await.unwrap_err();
        assert!(matches!(err, ApiError::Store(StoreError::Transient(_))));
    }

    #[tokio::test]
    async fn ambiguous_root_is_internal() {
        let (graph, assembler) = fixture();
        graph.insert(&hierarchy(), MemoryNode::new("root2", "second root").code_list("clistABC"));
        let err = assembler.get_root(&hierarchy(), &bases()).await.unwrap_err();
        assert!(matches!(err, ApiError::Store(StoreError::Ambiguous { rows: 2, .. })));
    }
}
