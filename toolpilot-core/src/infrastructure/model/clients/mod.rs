pub mod base;
pub mod openai;

pub use openai::OpenAiClient;
