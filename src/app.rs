//! The command-line flow: load settings, call the model once per prompt,
//! print what comes back.

use crate::providers::GeminiClient;
use crate::{Error, Settings, StreamEvent, TextGenerator, Usage};
use futures_util::StreamExt;
use std::io::Write;

/// What a completed run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub prompts: usize,
    pub usage: Usage,
}

/// Build a client from `settings` and run every configured prompt.
///
/// Without an API key this returns [`Error::MissingCredential`] before a
/// client exists, so no request is ever attempted.
pub async fn run_with_settings<W: Write>(settings: &Settings, out: &mut W) -> Result<RunSummary, Error> {
    let client = GeminiClient::from_settings(settings)?;
    run(settings, &client, out).await
}

/// Run every configured prompt against `generator`, writing text to `out`.
///
/// Stops at the first failure.
pub async fn run<G, W>(settings: &Settings, generator: &G, out: &mut W) -> Result<RunSummary, Error>
where
    G: TextGenerator + ?Sized,
    W: Write,
{
    let mut summary = RunSummary::default();

    for prompt in &settings.prompts {
        let request = settings.request_for(prompt);
        writeln!(out, "> {prompt}")?;

        let usage = if settings.stream {
            print_streamed(generator, &request, out).await?
        } else {
            let response = generator.generate(&request).await?;
            writeln!(out, "{}", response.text()?)?;
            response.usage
        };
        writeln!(out)?;

        tracing::info!(
            model = request.model(),
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "completion printed"
        );
        summary.prompts += 1;
        summary.usage.input_tokens = summary.usage.input_tokens.saturating_add(usage.input_tokens);
        summary.usage.output_tokens = summary.usage.output_tokens.saturating_add(usage.output_tokens);
        summary.usage.total_tokens = summary.usage.total_tokens.saturating_add(usage.total_tokens);
    }

    Ok(summary)
}

async fn print_streamed<G, W>(
    generator: &G,
    request: &crate::GenerationRequest,
    out: &mut W,
) -> Result<Usage, Error>
where
    G: TextGenerator + ?Sized,
    W: Write,
{
    let mut events = generator.generate_stream(request).await?.into_stream();
    let mut accumulator = crate::accumulator::ResponseAccumulator::new();

    while let Some(event) = events.next().await {
        let event = event?;
        if let StreamEvent::TextDelta { delta } = &event {
            write!(out, "{delta}")?;
            out.flush()?;
        }
        let done = matches!(event, StreamEvent::Done { .. });
        accumulator.process_event(event);
        if done {
            break;
        }
    }

    let response = accumulator.finalize();
    // Surfaces blocked prompts and filtered candidates the same way the
    // buffered path does.
    response.text()?;
    writeln!(out)?;
    Ok(response.usage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Candidate, FinishReason, GenerationRequest, GenerationResponse};
    use std::sync::Mutex;

    /// Records requests and answers with a canned completion.
    struct Recorder {
        requests: Mutex<Vec<GenerationRequest>>,
        reply: Result<&'static str, u16>,
        usage: Usage,
    }

    impl Recorder {
        fn replying(text: &'static str) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                reply: Ok(text),
                usage: Usage {
                    input_tokens: 2,
                    output_tokens: 3,
                    total_tokens: 5,
                },
            }
        }

        fn with_usage(mut self, usage: Usage) -> Self {
            self.usage = usage;
            self
        }

        fn failing(status: u16) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                reply: Err(status),
                usage: Usage::default(),
            }
        }

        fn requests(&self) -> Vec<GenerationRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl TextGenerator for Recorder {
        async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, Error> {
            self.requests.lock().unwrap().push(request.clone());
            match self.reply {
                Ok(text) => Ok(GenerationResponse {
                    candidates: vec![Candidate {
                        index: 0,
                        text: text.to_string(),
                        finish_reason: Some(FinishReason::Stop),
                        safety_ratings: Vec::new(),
                    }],
                    usage: self.usage,
                    ..Default::default()
                }),
                Err(status) => Err(Error::api(status, "RESOURCE_EXHAUSTED: quota exceeded")),
            }
        }
    }

    fn settings(prompts: &[&str], stream: bool) -> Settings {
        let mut settings = Settings::default();
        settings.prompts = prompts.iter().map(|p| p.to_string()).collect();
        settings.stream = stream;
        settings
    }

    #[tokio::test]
    async fn test_one_call_per_prompt() {
        let generator = Recorder::replying("Crabs all the way down.");
        let mut out = Vec::new();

        let summary = run(&settings(&["first", "second"], false), &generator, &mut out)
            .await
            .unwrap();

        assert_eq!(summary.prompts, 2);
        assert_eq!(summary.usage.total_tokens, 10);
        let prompts: Vec<_> = generator
            .requests()
            .iter()
            .map(|r| r.prompt().to_string())
            .collect();
        assert_eq!(prompts, vec!["first", "second"]);

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("> first\nCrabs all the way down.\n"));
    }

    #[tokio::test]
    async fn test_streamed_output_matches_buffered_text() {
        let generator = Recorder::replying("streamed text");
        let mut out = Vec::new();

        run(&settings(&["go"], true), &generator, &mut out)
            .await
            .unwrap();

        assert_eq!(generator.requests().len(), 1);
        assert_eq!(String::from_utf8(out).unwrap(), "> go\nstreamed text\n\n");
    }

    #[tokio::test]
    async fn test_usage_totals_saturate() {
        let generator = Recorder::replying("big").with_usage(Usage {
            input_tokens: u32::MAX,
            output_tokens: 1,
            total_tokens: u32::MAX,
        });
        let mut out = Vec::new();

        let summary = run(&settings(&["a", "b"], false), &generator, &mut out)
            .await
            .unwrap();

        assert_eq!(summary.prompts, 2);
        assert_eq!(summary.usage.input_tokens, u32::MAX);
        assert_eq!(summary.usage.output_tokens, 2);
        assert_eq!(summary.usage.total_tokens, u32::MAX);
    }

    #[tokio::test]
    async fn test_remote_failure_stops_the_run() {
        let generator = Recorder::failing(429);
        let mut out = Vec::new();

        let err = run(&settings(&["a", "b"], false), &generator, &mut out)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Api { status: 429, .. }));
        assert_eq!(generator.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_any_client() {
        let mut out = Vec::new();
        let err = run_with_settings(&settings(&["a"], false), &mut out)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MissingCredential));
        assert!(err.is_local());
        assert!(out.is_empty());
    }
}
