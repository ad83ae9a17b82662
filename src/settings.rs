use crate::credential::{Credential, EnvFile};
use crate::{Error, GenerationConfig, GenerationRequest, HarmBlockThreshold, SafetySettings};
use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Prompts used when `GEMINI_PROMPT` is not set.
pub const SAMPLE_PROMPTS: [&str; 3] = [
    "Write a haiku about the Rust borrow checker.",
    "Explain in two sentences what a large language model is.",
    "Suggest three names for a command-line tool that prints text completions.",
];

/// Runtime configuration for the quickstart.
///
/// The API key is a private field reached through [`Settings::credential`],
/// so callers can stop before building a client when it is absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub generation_config: GenerationConfig,
    pub safety_settings: SafetySettings,
    pub prompts: Vec<String>,
    pub stream: bool,
    credential: Option<Credential>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            generation_config: GenerationConfig::default(),
            safety_settings: SafetySettings::default(),
            prompts: SAMPLE_PROMPTS.iter().map(|p| p.to_string()).collect(),
            stream: false,
            credential: None,
        }
    }
}

impl Settings {
    /// Load from the process environment layered over `env_file`.
    ///
    /// Non-blank variables in the environment win over the file.
    pub fn load(env_file: Option<&Path>) -> Result<Self, Error> {
        let file = match env_file {
            Some(path) => EnvFile::read(path)?,
            None => EnvFile::default(),
        };
        Self::from_lookup(layered(|key| env::var(key).ok(), &file))
    }

    /// Load from the process environment and the env file it points to
    /// (`GEMINI_ENV_FILE`, default `.env` in the working directory).
    pub fn from_env() -> Result<Self, Error> {
        let path = env::var("GEMINI_ENV_FILE").unwrap_or_else(|_| DEFAULT_ENV_FILE.to_string());
        Self::load(Some(Path::new(&path)))
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut settings = Settings {
            credential: Credential::from_lookup(&lookup).ok(),
            ..Settings::default()
        };

        if let Some(model) = get("GEMINI_MODEL") {
            settings.model = model;
        }
        if let Some(base_url) = get("GEMINI_BASE_URL") {
            settings.base_url = base_url;
        }
        if let Some(secs) = parse::<u64>(&get, "GEMINI_TIMEOUT_SECS")? {
            settings.timeout = Duration::from_secs(secs);
        }

        let config = &mut settings.generation_config;
        config.temperature = parse_finite(&get, "GEMINI_TEMPERATURE")?;
        config.top_p = parse_finite(&get, "GEMINI_TOP_P")?;
        config.top_k = parse(&get, "GEMINI_TOP_K")?;
        config.max_output_tokens = parse(&get, "GEMINI_MAX_OUTPUT_TOKENS")?;

        if let Some(threshold) = parse::<HarmBlockThreshold>(&get, "GEMINI_SAFETY_THRESHOLD")? {
            settings.safety_settings = SafetySettings::uniform(threshold);
        }
        if let Some(prompt) = get("GEMINI_PROMPT") {
            settings.prompts = vec![prompt];
        }
        if let Some(stream) = get("GEMINI_STREAM") {
            settings.stream = parse_flag(&stream)
                .ok_or_else(|| Error::config(format!("GEMINI_STREAM: expected a boolean, got {stream:?}")))?;
        }

        Ok(settings)
    }

    /// The API key, or [`Error::MissingCredential`].
    pub fn credential(&self) -> Result<&Credential, Error> {
        self.credential.as_ref().ok_or(Error::MissingCredential)
    }

    #[must_use]
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// A request for `prompt` carrying the configured model and parameters.
    pub fn request_for(&self, prompt: &str) -> GenerationRequest {
        GenerationRequest::new(&self.model, prompt)
            .with_config(self.generation_config.clone())
            .with_safety_settings(self.safety_settings.clone())
    }
}

/// `env` first, then `file`. A blank value in `env` counts as unset.
fn layered<'a>(
    env: impl Fn(&str) -> Option<String> + 'a,
    file: &'a EnvFile,
) -> impl Fn(&str) -> Option<String> + 'a {
    move |key| {
        env(key)
            .filter(|value| !value.trim().is_empty())
            .or_else(|| file.get(key))
    }
}

fn parse<T>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| Error::config(format!("{key}: cannot parse {raw:?}: {e}")))
        })
        .transpose()
}

/// Like [`parse`], but NaN and infinities are errors; JSON has no encoding for them.
fn parse_finite(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<f32>, Error> {
    match parse::<f32>(get, key)? {
        Some(value) if !value.is_finite() => Err(Error::config(format!(
            "{key}: expected a finite number, got {value}"
        ))),
        value => Ok(value),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
