//! Print example completions from the Google Gemini API.
//!
//! Loads an API key from the environment or a local `.env` file, sends a
//! prompt with optional sampling and safety parameters, and returns the
//! generated text. Buffered and streamed (server-sent events) calls are
//! both supported; neither retries.

pub mod accumulator;
pub mod app;
pub mod credential;
pub mod error;
pub mod provider;
pub mod providers;
pub mod response;
pub mod settings;
pub mod sse_stream;
pub mod telemetry;
pub mod types;

// Re-export core types for easy usage
pub use credential::Credential;
pub use error::Error;
pub use provider::TextGenerator;
pub use providers::GeminiClient;
pub use response::*;
pub use settings::Settings;
pub use sse_stream::SseEvent;
pub use types::*;
