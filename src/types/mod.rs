//! Core types used throughout the library.

pub mod config;
pub mod request;
pub mod safety;
pub mod status;
pub mod streaming;

// Re-export commonly used types
pub use config::*;
pub use request::*;
pub use safety::*;
pub use status::*;
pub use streaming::*;
