use super::config::GenerationConfig;
use super::safety::SafetySettings;

/// A single text-generation request.
///
/// Built once through the `with_*` methods and read through accessors;
/// there is no way to change a request after it has been handed to a client.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    model: String,
    prompt: String,
    config: GenerationConfig,
    safety_settings: SafetySettings,
}

impl GenerationRequest {
    /// Create a request for `model` with default sampling and safety settings.
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            config: GenerationConfig::default(),
            safety_settings: SafetySettings::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_safety_settings(mut self, safety_settings: SafetySettings) -> Self {
        self.safety_settings = safety_settings;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn safety_settings(&self) -> &SafetySettings {
        &self.safety_settings
    }
}
