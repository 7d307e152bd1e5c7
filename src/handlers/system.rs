use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn root() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "health": "/health",
    }))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let db_connected = state.store.health_check().await;

    Json(json!({
        "status": if db_connected { "healthy" } else { "unhealthy" },
        "database": if db_connected { "connected" } else { "disconnected" },
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
