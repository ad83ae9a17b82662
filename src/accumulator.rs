//! Folds streamed events into a complete response.

use crate::types::{BlockReason, FinishReason, SafetyRating, StreamEvent, Usage};
use crate::{Candidate, GenerationResponse, PromptFeedback};

/// Builds a [`GenerationResponse`] from [`StreamEvent`]s as they arrive.
///
/// Only the first candidate is tracked.
#[derive(Debug, Default)]
pub struct ResponseAccumulator {
    text: String,
    safety_ratings: Vec<SafetyRating>,
    block_reason: Option<BlockReason>,
    finish_reason: Option<FinishReason>,
    usage: Option<Usage>,
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event.
    pub fn process_event(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::TextDelta { delta } => self.text.push_str(&delta),
            // Later chunks carry the ratings for the whole candidate so far.
            StreamEvent::SafetyRatings { ratings } => self.safety_ratings = ratings,
            StreamEvent::PromptBlocked { reason } => self.block_reason = Some(reason),
            StreamEvent::Done {
                finish_reason,
                usage,
            } => {
                self.finish_reason = Some(finish_reason);
                self.usage = Some(usage);
            }
        }
    }

    /// Text received so far.
    pub fn current_text(&self) -> &str {
        &self.text
    }

    /// The response described by the events seen so far.
    pub fn finalize(self) -> GenerationResponse {
        if let Some(block_reason) = self.block_reason {
            return GenerationResponse {
                prompt_feedback: Some(PromptFeedback {
                    block_reason: Some(block_reason),
                    safety_ratings: self.safety_ratings,
                }),
                usage: self.usage.unwrap_or_default(),
                ..Default::default()
            };
        }

        let has_candidate =
            !self.text.is_empty() || self.finish_reason.is_some() || !self.safety_ratings.is_empty();
        let candidates = if has_candidate {
            vec![Candidate {
                index: 0,
                text: self.text,
                finish_reason: self.finish_reason,
                safety_ratings: self.safety_ratings,
            }]
        } else {
            Vec::new()
        };

        GenerationResponse {
            candidates,
            prompt_feedback: None,
            usage: self.usage.unwrap_or_default(),
            model_version: None,
        }
    }
}
