use crate::{Error, GenerationRequest, GenerationResponse, ResponseStream};

/// Anything that can turn a [`GenerationRequest`] into generated text.
///
/// Each call is one round trip to the backing service; implementations do
/// not retry.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a complete response.
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, Error>;

    /// Generate a response incrementally.
    ///
    /// The default buffers through [`TextGenerator::generate`] and replays
    /// the result as a single-chunk stream.
    async fn generate_stream(&self, request: &GenerationRequest) -> Result<ResponseStream, Error> {
        let response = self.generate(request).await?;
        Ok(ResponseStream::from_response(response))
    }
}
