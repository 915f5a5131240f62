use super::dto::{ErrorResponse, HealthResponse, QueryRequest, QueryResponse, ToolListResponse};
use super::routes;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::query::query_handler,
        routes::tools::tools_handler,
        routes::health::health_handler
    ),
    components(
        schemas(
            QueryRequest,
            QueryResponse,
            ErrorResponse,
            ToolListResponse,
            HealthResponse
        )
    ),
    tags(
        (name = "query", description = "Answer a query with the model and the tool server"),
        (name = "tools", description = "Tools offered by the configured tool server"),
        (name = "health", description = "Liveness probe")
    )
)]
pub(super) struct ApiDoc;
