use super::super::dto::{ErrorResponse, ToolListResponse};
use super::super::state::ServerState;
use super::{Rejection, reject};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use std::sync::Arc;
use toolpilot_core::model::ModelProvider;
use tracing::{debug, error};

#[utoipa::path(
    get,
    path = "/tools",
    tag = "tools",
    responses(
        (status = 200, description = "Adapted tool catalog", body = ToolListResponse),
        (status = 500, description = "Tool server unreachable", body = ErrorResponse)
    )
)]
pub async fn tools_handler<P: ModelProvider>(
    State(state): State<Arc<ServerState<P>>>,
) -> Result<Json<ToolListResponse>, Rejection> {
    let catalog = state.agent().tool_catalog().await.map_err(|err| {
        error!(%err, "Failed to list tools");
        reject(StatusCode::INTERNAL_SERVER_ERROR, err.user_message())
    })?;
    debug!(tool_count = catalog.len(), "Serving /tools request");
    Ok(Json(ToolListResponse {
        tools: catalog.schemas().cloned().collect(),
    }))
}
