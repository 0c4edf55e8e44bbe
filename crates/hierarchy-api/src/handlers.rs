use crate::{ApiResult, AppState};
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use hierarchy_core::{HierarchyId, Response};
use tracing::debug;

pub async fn get_hierarchy_root(
    State(state): State<AppState>,
    Path((instance, dimension)): Path<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<Json<Response>> {
    let id = HierarchyId::new(instance, dimension);
    debug!(instance_id = %id.instance_id, dimension = %id.dimension, "get hierarchy root");

    let bases = state.resolver.resolve(&headers);
    let response = state.assembler.get_root(&id, &bases).await?;
    Ok(Json(response))
}

pub async fn get_hierarchy_node(
    State(state): State<AppState>,
    Path((instance, dimension, code)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> ApiResult<Json<Response>> {
    let id = HierarchyId::new(instance, dimension);
    debug!(instance_id = %id.instance_id, dimension = %id.dimension, code = %code, "get hierarchy node");

    let bases = state.resolver.resolve(&headers);
    let response = state.assembler.get_node(&id, &code, &bases).await?;
    Ok(Json(response))
}
