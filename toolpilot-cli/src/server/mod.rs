mod docs;
mod dto;
mod error;
mod router;
mod routes;
mod state;

pub use dto::{ErrorResponse, HealthResponse, QueryRequest, QueryResponse, ToolListResponse};
pub use error::ServerError;
pub use router::router;
pub(crate) use state::ServerState;

use std::net::SocketAddr;
use std::sync::Arc;
use toolpilot_core::Agent;
use toolpilot_core::model::ModelProvider;

pub async fn serve<P>(agent: Arc<Agent<P>>, addr: SocketAddr) -> Result<(), ServerError>
where
    P: ModelProvider + 'static,
{
    router::serve(agent, addr).await
}
