//! Agent info and liveness endpoints.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct InterfacePaths {
    pub webchat: Option<String>,
    pub webhook: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AgentInfo {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
    pub interfaces: InterfacePaths,
}

/// GET / - Describe the served agent.
pub async fn agent_info(State(state): State<AppState>) -> Json<AgentInfo> {
    Json(AgentInfo {
        name: state.runner.name().to_string(),
        description: state.runner.description().map(str::to_string),
        version: state.runner.record().metadata.version.clone(),
        interfaces: InterfacePaths {
            webchat: state.webchat.as_ref().map(|w| w.path.clone()),
            webhook: state.webhook.as_ref().map(|w| w.path.clone()),
        },
    })
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
