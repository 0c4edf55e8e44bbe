use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hierarchy_core::StoreError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Hierarchy not found: {0}")]
    HierarchyNotFound(String),

    #[error("Code not found: {0}")]
    CodeNotFound(String),

    #[error("Graph store error: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::HierarchyNotFound(_) | ApiError::CodeNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Store details stay in the logs.
        let error_message = match &self {
            ApiError::Store(_) => "internal server error".to_string(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_variants_map_to_404() {
        assert_eq!(
            ApiError::HierarchyNotFound("i/d".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError::CodeNotFound("c".into()).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn store_failures_map_to_500_even_when_not_found() {
        // Callers translate NotFound explicitly; a leaked one is a server bug.
        for err in [
            StoreError::NotFound("x".into()),
            StoreError::Ambiguous { rows: 2, context: "x".into() },
            StoreError::Transient("timeout".into()),
        ] {
            assert_eq!(ApiError::from(err).status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}
