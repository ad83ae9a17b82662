//! Backends that implement [`crate::TextGenerator`].

pub mod gemini;

pub use gemini::GeminiClient;
