use serde::{Deserialize, Serialize};

/// Sampling parameters sent with a generation request.
///
/// Every field is optional; unset fields are left to the model's defaults.
/// Values are forwarded to the service exactly as given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Randomness, documented range 0.0 to 2.0.
    pub temperature: Option<f32>,
    /// Nucleus sampling mass, documented range 0.0 to 1.0.
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    /// Upper bound on generated tokens.
    pub max_output_tokens: Option<u32>,
    pub candidate_count: Option<u32>,
    /// Generation stops at the first of these strings.
    pub stop_sequences: Option<Vec<String>>,
}

impl GenerationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    #[must_use]
    pub fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    #[must_use]
    pub fn top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    #[must_use]
    pub fn max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    #[must_use]
    pub fn candidate_count(mut self, candidate_count: u32) -> Self {
        self.candidate_count = Some(candidate_count);
        self
    }

    #[must_use]
    pub fn stop_sequences<I, S>(mut self, sequences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_sequences = Some(sequences.into_iter().map(Into::into).collect());
        self
    }

    /// True when no parameter is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Names of parameters whose values fall outside the documented ranges.
    ///
    /// Nothing is rejected locally; the service has the final say.
    pub fn out_of_range(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.temperature.is_some_and(|t| !(0.0..=2.0).contains(&t)) {
            fields.push("temperature");
        }
        if self.top_p.is_some_and(|p| !(0.0..=1.0).contains(&p)) {
            fields.push("top_p");
        }
        if self.max_output_tokens == Some(0) {
            fields.push("max_output_tokens");
        }
        if self.candidate_count == Some(0) {
            fields.push("candidate_count");
        }
        fields
    }

    /// Fields holding NaN or an infinity, which JSON cannot represent.
    pub fn non_finite(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.temperature.is_some_and(|t| !t.is_finite()) {
            fields.push("temperature");
        }
        if self.top_p.is_some_and(|p| !p.is_finite()) {
            fields.push("top_p");
        }
        fields
    }
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt.
    pub input_tokens: u32,
    /// Tokens across generated candidates.
    pub output_tokens: u32,
    pub total_tokens: u32,
}
