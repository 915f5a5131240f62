pub mod http_stream;
pub mod event_stream;
pub mod openai;

pub use tools::{PID_FILE_ENV, Reply, handle};
