use crate::{handlers, health, AppState};
use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/hierarchies/{instance}/{dimension}",
            get(handlers::get_hierarchy_root),
        )
        .route(
            "/hierarchies/{instance}/{dimension}/{code}",
            get(handlers::get_hierarchy_node),
        )
        .with_state(state)
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
}
