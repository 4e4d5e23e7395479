//! HTTP surface of the read path.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::errors::QueryError;
use crate::service::QueryService;
use event_collector_shared::EventDocument;

/// Events involving one object, in stored document form.
#[derive(Debug, Serialize)]
pub struct ResourceEventsResponse {
    pub events: Vec<EventDocument>,
    pub total_count: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Build the read-path router.
pub fn router(service: Arc<QueryService>) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route(
            "/v1/events/:namespace/:kind/:name",
            get(get_resource_events),
        )
        .with_state(service)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn get_resource_events(
    State(service): State<Arc<QueryService>>,
    Path((namespace, kind, name)): Path<(String, String, String)>,
) -> Result<Json<ResourceEventsResponse>, QueryError> {
    let results = service
        .get_resource_events(&namespace, &kind, &name)
        .await?;
    Ok(Json(ResourceEventsResponse {
        events: results.events,
        total_count: results.total,
    }))
}
