//! Conversation state and conversation logging for toolpilot.
//!
//! A [`Conversation`] is the ordered, append-only record of one query: the
//! user's question, every tool result fed back to the model, and the model's
//! final answer. [`ConversationLogger`] implementations persist full snapshots
//! of that record after each loop iteration.
//!
//! ```rust,ignore
//! use toolpilot_session::{Conversation, FileConversationLogger, ConversationLogger, Turn};
//!
//! let mut conversation = Conversation::new("what is 2+2");
//! conversation.append(Turn::assistant("4"));
//!
//! let logger = FileConversationLogger::new("conversations");
//! logger.persist(&conversation.snapshot()).await?;
//! ```

mod conversation;
mod error;
mod logger;
mod turn;

pub use conversation::Conversation;
pub use error::LogError;
pub use logger::{
    ConversationLogger, FileConversationLogger, MemoryConversationLogger, NoopConversationLogger,
};
pub use turn::{Role, Turn};
