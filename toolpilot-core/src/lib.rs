//! # toolpilot-core
//!
//! The tool-augmented orchestration client: it lets a language model answer a
//! query by repeatedly invoking tools hosted by an MCP server until the model
//! produces a final answer or the iteration budget runs out.
//!
//! ## Layout
//!
//! - [`infrastructure::transport`] - the three wire bindings to the tool server
//!   (local pipe, streamable HTTP, server-sent events) behind [`ToolServer`]
//! - [`infrastructure::model`] - the model capability and an OpenAI-compatible client
//! - [`application::catalog`] - tool descriptors adapted to function-calling schemas
//! - [`application::serializer`] - total normalization of tool results to JSON
//! - [`application::agent`] - the bounded model/tool loop
//! - [`config`] - TOML, `.env` and environment-variable configuration
//!
//! ## Loop
//!
//! 1. Seed the conversation with the user's query
//! 2. Ask the model, passing the full conversation and the tool catalog
//! 3. Final text ends the loop; tool calls are executed in order and their
//!    results appended; the snapshot is logged after every step
//! 4. When the budget is spent, a synthetic failure turn closes the conversation

pub mod application;
pub mod config;
pub mod constants;
pub mod domain;
pub mod infrastructure;

pub use application::{agent, catalog, serializer};
pub use config::AppConfig;
pub use domain::types;
pub use infrastructure::{model, transport};

pub use agent::{Agent, AgentError, LoopOutcome, LoopStatus, ToolCallError};
pub use catalog::ToolCatalog;
pub use serializer::{ToolValue, serialize};
pub use transport::{
    ToolConnector, ToolServer, Transport, TransportConnector, TransportError, TransportKind,
};
