use super::super::dto::{ErrorResponse, QueryRequest, QueryResponse};
use super::super::state::ServerState;
use super::{Rejection, reject};
use crate::answer::extract_answer;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use std::sync::Arc;
use toolpilot_core::model::ModelProvider;
use tracing::{error, info, warn};

#[utoipa::path(
    post,
    path = "/query",
    tag = "query",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Final answer", body = QueryResponse),
        (status = 400, description = "Empty query", body = ErrorResponse),
        (status = 500, description = "Model or tool server failure", body = ErrorResponse)
    )
)]
pub async fn query_handler<P: ModelProvider>(
    State(state): State<Arc<ServerState<P>>>,
    Json(payload): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, Rejection> {
    let query = payload.query.trim();
    if query.is_empty() {
        warn!("Rejecting /query request with an empty query");
        return Err(reject(StatusCode::BAD_REQUEST, "query cannot be empty"));
    }

    info!(query_len = query.len(), "Received /query request");
    match state.agent().process_query(query).await {
        Ok(outcome) => Ok(Json(QueryResponse {
            answer: extract_answer(outcome.answer()),
        })),
        Err(err) => {
            error!(%err, "Query failed");
            Err(reject(StatusCode::INTERNAL_SERVER_ERROR, err.user_message()))
        }
    }
}
