use futures_util::StreamExt;
use reqwest::Client;
use std::time::Duration;

use super::types::*;
use crate::credential::Credential;
use crate::provider::TextGenerator;
use crate::settings::{Settings, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::sse_stream::SseStream;
use crate::{Error, GenerationRequest, GenerationResponse, ResponseStream, StreamEvent};

const API_VERSION: &str = "v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client for the Gemini Developer API, authenticated with an API key.
pub struct GeminiClient {
    client: Client,
    credential: Credential,
    base_url: String,
}

impl GeminiClient {
    /// Create a client against the public endpoint.
    pub fn new(credential: Credential) -> Result<Self, Error> {
        Self::with_base_url(credential, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom base URL (proxies, tests).
    pub fn with_base_url(credential: Credential, base_url: impl Into<String>) -> Result<Self, Error> {
        Self::build(credential, base_url.into(), DEFAULT_TIMEOUT)
    }

    /// Create a client from loaded settings.
    ///
    /// Fails with [`Error::MissingCredential`] before any connection is made
    /// when the settings carry no API key.
    pub fn from_settings(settings: &Settings) -> Result<Self, Error> {
        let credential = settings.credential()?.clone();
        Self::build(credential, settings.base_url.clone(), settings.timeout)
    }

    fn build(credential: Credential, base_url: String, timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            credential,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Convert a request to the wire format. Parameters are copied as-is.
    ///
    /// NaN and infinite values are rejected: they would serialize as `null`.
    fn convert_request(request: &GenerationRequest) -> Result<GeminiRequest, Error> {
        let config = request.config();
        let non_finite = config.non_finite();
        if !non_finite.is_empty() {
            return Err(Error::config(format!(
                "{} must be a finite number",
                non_finite.join(", ")
            )));
        }
        let out_of_range = config.out_of_range();
        if !out_of_range.is_empty() {
            tracing::warn!(
                fields = ?out_of_range,
                "sampling parameters outside documented range; sending unchanged"
            );
        }

        let generation_config = (!config.is_empty()).then(|| GeminiGenerationConfig {
            temperature: config.temperature,
            top_p: config.top_p,
            top_k: config.top_k,
            max_output_tokens: config.max_output_tokens,
            candidate_count: config.candidate_count,
            stop_sequences: config.stop_sequences.clone(),
        });

        Ok(GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: Some(request.prompt().to_string()),
                }],
            }],
            generation_config,
            safety_settings: request.safety_settings().iter().copied().collect(),
        })
    }

    /// Endpoint for `model`. Accepts both `gemini-x` and `models/gemini-x`.
    fn endpoint(&self, model: &str, stream: bool) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        let method = if stream {
            "streamGenerateContent?alt=sse"
        } else {
            "generateContent"
        };
        format!("{}/{API_VERSION}/models/{model}:{method}", self.base_url)
    }

    /// Send one request. Non-2xx statuses become [`Error::Api`].
    async fn send(
        &self,
        request: &GenerationRequest,
        stream: bool,
    ) -> Result<reqwest::Response, Error> {
        let body = Self::convert_request(request)?;
        let endpoint = self.endpoint(request.model(), stream);

        tracing::debug!(model = request.model(), stream, "sending generation request");
        if tracing::enabled!(tracing::Level::TRACE) {
            if let Ok(json) = serde_json::to_string(&body) {
                tracing::trace!(payload = %json, "request payload");
            }
        }

        let response = self
            .client
            .post(&endpoint)
            .header(API_KEY_HEADER, self.credential.expose())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "response status");
        if status.is_success() {
            return Ok(response);
        }

        let raw = response.text().await?;
        Err(Error::api(status.as_u16(), api_error_message(&raw)))
    }

    fn chunk_events(chunk: GeminiResponse) -> Vec<StreamEvent> {
        let mut events = Vec::new();

        if let Some(reason) = chunk.prompt_feedback.as_ref().and_then(|f| f.block_reason) {
            events.push(StreamEvent::PromptBlocked { reason });
            return events;
        }

        let usage = chunk.usage_metadata.map(Into::into).unwrap_or_default();
        if let Some(candidate) = chunk.candidates.into_iter().next() {
            let text = candidate.text();
            if !text.is_empty() {
                events.push(StreamEvent::TextDelta { delta: text });
            }
            if !candidate.safety_ratings.is_empty() {
                events.push(StreamEvent::SafetyRatings {
                    ratings: candidate.safety_ratings,
                });
            }
            if let Some(finish_reason) = candidate.finish_reason {
                events.push(StreamEvent::Done {
                    finish_reason,
                    usage,
                });
            }
        }

        events
    }
}

/// The service's message from an error body, or the body itself.
fn api_error_message(raw: &str) -> String {
    match serde_json::from_str::<GeminiErrorEnvelope>(raw) {
        Ok(envelope) => match envelope.error.status {
            Some(status) => format!("{status}: {}", envelope.error.message),
            None => envelope.error.message,
        },
        Err(_) => raw.trim().to_string(),
    }
}

#[async_trait::async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, Error> {
        let response = self.send(request, false).await?;
        let body: GeminiResponse = response.json().await?;
        Ok(body.into())
    }

    async fn generate_stream(&self, request: &GenerationRequest) -> Result<ResponseStream, Error> {
        let response = self.send(request, true).await?;

        let events = SseStream::new(response.bytes_stream())
            .map(|sse| -> Vec<Result<StreamEvent, Error>> {
                let sse = match sse {
                    Ok(sse) => sse,
                    Err(e) => return vec![Err(e)],
                };
                let data = sse.data.trim();
                if data.is_empty() {
                    return Vec::new();
                }
                match serde_json::from_str::<GeminiResponse>(data) {
                    Ok(chunk) => Self::chunk_events(chunk).into_iter().map(Ok).collect(),
                    Err(e) => vec![Err(Error::streaming(format!(
                        "cannot parse streamed chunk: {e}"
                    )))],
                }
            })
            .flat_map(futures_util::stream::iter);

        Ok(ResponseStream::from_stream(events))
    }
}
