//! System endpoints: health check.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::app_state::AppState;
use crate::protocol::PROTOCOL_VERSION;

/// Health check response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    clients: usize,
    protocol_version: u32,
    timestamp: String,
    version: &'static str,
}

/// `GET /health`: Service health and connected client count.
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy",
            clients: state.registry.len().await,
            protocol_version: PROTOCOL_VERSION,
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

/// System routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    use super::*;
    use crate::domain::{ClientId, ClientRegistry};

    #[tokio::test]
    async fn health_reports_client_count() {
        let registry = Arc::new(ClientRegistry::new());
        let (tx, _rx) = mpsc::channel(1);
        registry.subscribe(ClientId::from_raw(0), tx).await;
        let app = routes().with_state(AppState::new(registry, 4));

        let Ok(request) = Request::builder().uri("/health").body(Body::empty()) else {
            panic!("valid request");
        };
        let Ok(response) = app.oneshot(request).await else {
            panic!("router failed");
        };
        assert_eq!(response.status(), StatusCode::OK);

        let Ok(body) = to_bytes(response.into_body(), 64 * 1024).await else {
            panic!("body read failed");
        };
        let Ok(json) = serde_json::from_slice::<serde_json::Value>(&body) else {
            panic!("body is not json");
        };
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["clients"], 1);
        assert_eq!(json["protocol_version"], PROTOCOL_VERSION);
    }
}
