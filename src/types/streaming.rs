//! Types for streaming responses.

use crate::types::{BlockReason, FinishReason, SafetyRating, Usage};

/// Events emitted while a streamed generation is in progress.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A chunk of generated text.
    TextDelta { delta: String },
    /// Safety ratings reported for the candidate so far.
    SafetyRatings { ratings: Vec<SafetyRating> },
    /// The prompt was rejected before any text was produced.
    PromptBlocked { reason: BlockReason },
    /// The stream has finished.
    Done {
        finish_reason: FinishReason,
        usage: Usage,
    },
}

impl StreamEvent {
    /// The text carried by this event, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            StreamEvent::TextDelta { delta } => Some(delta),
            _ => None,
        }
    }
}
