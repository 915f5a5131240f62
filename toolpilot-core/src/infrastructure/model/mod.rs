//! Model infrastructure module
//!
//! # Structure
//! - `types` - reply and error types
//! - `traits` - the `ModelProvider` capability
//! - `adapter` - conversation turns to chat-completion messages
//! - `clients` - the OpenAI-compatible client

pub mod adapter;
pub mod clients;
pub mod traits;
pub mod types;

pub use clients::OpenAiClient;
pub use traits::ModelProvider;
pub use types::{ModelError, ModelReply};
