use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns a simple status object with service version and session load.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "cvtailor-api",
        "sessions": {
            "live": state.sessions.len().await,
            "capacity": state.config.max_sessions
        },
        "scorer": state.scorer.backend()
    }))
}
