use thiserror::Error;

/// Errors that can occur when calling the Gemini API.
#[derive(Error, Debug)]
pub enum Error {
    #[error("No API key found. Set GOOGLE_API_KEY or GEMINI_API_KEY in the environment or in a .env file")]
    MissingCredential,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Response blocked: {0}")]
    Blocked(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Streaming error: {0}")]
    Streaming(String),

    /// Writing the completion to the output failed.
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Error::Api {
            status,
            message: message.into(),
        }
    }

    pub fn blocked(reason: impl Into<String>) -> Self {
        Error::Blocked(reason.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    pub fn streaming(message: impl Into<String>) -> Self {
        Error::Streaming(message.into())
    }

    /// Whether this error was raised before any request left the process.
    pub fn is_local(&self) -> bool {
        matches!(self, Error::MissingCredential | Error::Config(_))
    }
}
