//! Axum WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;

use super::connection::ConnectionActor;
use crate::app_state::AppState;

/// `GET /events`: Upgrade HTTP connection to a WebSocket event stream.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        let actor = ConnectionActor::accept(
            &state.ids,
            Arc::clone(&state.registry),
            Arc::clone(&state.router),
            state.client_queue_capacity,
        )
        .await;
        actor.run(socket).await;
    })
}
