use super::{ToolServer, Transport, TransportConfig, TransportError};
use async_trait::async_trait;
use reqwest::Client;

/// Opens a fresh tool-server session for each query.
#[async_trait]
pub trait ToolConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn ToolServer>, TransportError>;
}

/// Production connector. Owns the HTTP connection pool shared by every
/// session it opens.
#[derive(Clone)]
pub struct TransportConnector {
    config: TransportConfig,
    http: Client,
}

impl TransportConnector {
    pub fn new(config: TransportConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    pub fn with_client(config: TransportConfig, http: Client) -> Self {
        Self { config, http }
    }
}

#[async_trait]
impl ToolConnector for TransportConnector {
    async fn connect(&self) -> Result<Box<dyn ToolServer>, TransportError> {
        let transport = Transport::connect(&self.config, &self.http).await?;
        Ok(Box::new(transport))
    }
}
