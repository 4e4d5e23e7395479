//! Error types for the read path.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use event_collector_repository::StoreError;

/// Errors that can occur serving event queries.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The request parameters were missing or malformed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The document store rejected or failed the search.
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),
}

impl QueryError {
    /// Create an invalid-request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            QueryError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            QueryError::StoreError(e) => {
                error!(error = %e, "Event search failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "Event store unavailable".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_request_maps_to_400() {
        let response = QueryError::invalid_request("Namespace must not be empty").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_store_error_maps_to_502() {
        let response = QueryError::from(StoreError::search("Timeout")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
