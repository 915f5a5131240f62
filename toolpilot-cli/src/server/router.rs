use super::docs::ApiDoc;
use super::error::ServerError;
use super::routes;
use super::state::ServerState;
use axum::Router;
use axum::routing::{get, post};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use toolpilot_core::Agent;
use toolpilot_core::model::ModelProvider;
use tower_http::cors::CorsLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Routes, docs and CORS around one shared agent.
pub fn router<P>(agent: Arc<Agent<P>>) -> Router
where
    P: ModelProvider + 'static,
{
    let state = Arc::new(ServerState::new(agent));
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .route("/query", post(routes::query::query_handler::<P>))
        .route("/tools", get(routes::tools::tools_handler::<P>))
        .route("/health", get(routes::health::health_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub(super) async fn serve<P>(agent: Arc<Agent<P>>, addr: SocketAddr) -> Result<(), ServerError>
where
    P: ModelProvider + 'static,
{
    info!(%addr, "Binding HTTP server");
    let app = router(agent);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!(%addr, "HTTP server ready to accept connections");

    axum::serve(listener, app.into_make_service())
        .await
        .map_err(ServerError::Serve)
}
