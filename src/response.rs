//! Generation results, buffered or streamed.

use crate::providers::gemini::types::{GeminiCandidate, GeminiPromptFeedback, GeminiResponse};
use crate::{BlockReason, Error, FinishReason, SafetyRating, StreamEvent, Usage};
use futures_util::stream::{self, Stream};
use std::pin::Pin;

/// One generated candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub index: u32,
    /// All text parts joined.
    pub text: String,
    /// Why generation stopped. Absent on intermediate streamed chunks.
    pub finish_reason: Option<FinishReason>,
    pub safety_ratings: Vec<SafetyRating>,
}

impl From<GeminiCandidate> for Candidate {
    fn from(candidate: GeminiCandidate) -> Self {
        Candidate {
            index: candidate.index,
            text: candidate.text(),
            finish_reason: candidate.finish_reason,
            safety_ratings: candidate.safety_ratings,
        }
    }
}

/// Feedback about the prompt itself.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptFeedback {
    /// Set when the prompt was rejected and no candidates were produced.
    pub block_reason: Option<BlockReason>,
    pub safety_ratings: Vec<SafetyRating>,
}

impl From<GeminiPromptFeedback> for PromptFeedback {
    fn from(feedback: GeminiPromptFeedback) -> Self {
        PromptFeedback {
            block_reason: feedback.block_reason,
            safety_ratings: feedback.safety_ratings,
        }
    }
}

/// The result of a generation call: text plus whatever status the service
/// reported alongside it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationResponse {
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
    /// Token counts. Zero when the service sent no usage metadata.
    pub usage: Usage,
    /// Concrete model revision that served the call.
    pub model_version: Option<String>,
}

impl From<GeminiResponse> for GenerationResponse {
    fn from(response: GeminiResponse) -> Self {
        GenerationResponse {
            candidates: response.candidates.into_iter().map(Into::into).collect(),
            prompt_feedback: response.prompt_feedback.map(Into::into),
            usage: response.usage_metadata.map(Into::into).unwrap_or_default(),
            model_version: response.model_version,
        }
    }
}

impl GenerationResponse {
    /// Text of the first candidate.
    ///
    /// Fails when the prompt was blocked, when no candidate came back, or
    /// when the candidate was stopped by a content filter before producing
    /// any text.
    pub fn text(&self) -> Result<String, Error> {
        if let Some(reason) = self.block_reason() {
            return Err(Error::blocked(format!("prompt blocked ({reason})")));
        }
        let candidate = self
            .candidates
            .first()
            .ok_or_else(|| Error::blocked("no candidates returned"))?;

        match candidate.finish_reason {
            Some(reason) if reason.is_filtered() && candidate.text.is_empty() => {
                Err(Error::blocked(format!("candidate stopped ({reason})")))
            }
            _ => Ok(candidate.text.clone()),
        }
    }

    /// Finish reason of the first candidate.
    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.candidates.first().and_then(|c| c.finish_reason)
    }

    /// Why the prompt was blocked, if it was.
    pub fn block_reason(&self) -> Option<BlockReason> {
        self.prompt_feedback.as_ref().and_then(|f| f.block_reason)
    }

    /// Replay this response as the events a stream would have produced.
    pub fn into_events(self) -> Vec<StreamEvent> {
        if let Some(reason) = self.block_reason() {
            return vec![StreamEvent::PromptBlocked { reason }];
        }

        let mut events = Vec::new();
        let finish_reason = self.finish_reason().unwrap_or_default();
        if let Some(candidate) = self.candidates.into_iter().next() {
            if !candidate.text.is_empty() {
                events.push(StreamEvent::TextDelta {
                    delta: candidate.text,
                });
            }
            if !candidate.safety_ratings.is_empty() {
                events.push(StreamEvent::SafetyRatings {
                    ratings: candidate.safety_ratings,
                });
            }
        }
        events.push(StreamEvent::Done {
            finish_reason,
            usage: self.usage,
        });
        events
    }
}

type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, Error>> + Send>>;

/// A generation delivered incrementally.
pub struct ResponseStream {
    stream: EventStream,
}

impl ResponseStream {
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<StreamEvent, Error>> + Send + 'static,
    {
        Self {
            stream: Box::pin(stream),
        }
    }

    /// A stream over an already complete response.
    pub fn from_response(response: GenerationResponse) -> Self {
        Self::from_stream(stream::iter(response.into_events().into_iter().map(Ok)))
    }

    /// The raw event stream.
    pub fn into_stream(self) -> EventStream {
        self.stream
    }

    /// Consume the stream and assemble the full response.
    pub async fn collect(self) -> Result<GenerationResponse, Error> {
        use futures_util::StreamExt;

        let mut stream = self.stream;
        let mut accumulator = crate::accumulator::ResponseAccumulator::new();
        while let Some(event) = stream.next().await {
            let done = matches!(event, Ok(StreamEvent::Done { .. }));
            accumulator.process_event(event?);
            if done {
                break;
            }
        }
        Ok(accumulator.finalize())
    }
}
