//! HTTP surface: the event stream endpoint and system routes.

pub mod system;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// Builds the complete application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/events", get(ws_handler))
        .merge(system::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
