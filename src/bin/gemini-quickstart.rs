//! Print example completions from the Gemini API.
//!
//! Reads `GOOGLE_API_KEY` (or `GEMINI_API_KEY`) from the environment or a
//! `.env` file in the working directory. Takes no flags.

use gemini_quickstart::{app, telemetry, Error, Settings};
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    telemetry::init();

    match run().await {
        Ok(summary) => {
            tracing::debug!(
                prompts = summary.prompts,
                total_tokens = summary.usage.total_tokens,
                "done"
            );
            ExitCode::SUCCESS
        }
        Err(Error::MissingCredential) => {
            eprintln!("error: {}", Error::MissingCredential);
            eprintln!("Get a key at https://aistudio.google.com/app/apikey and export it, e.g.");
            eprintln!("  export GOOGLE_API_KEY=...");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<app::RunSummary, Error> {
    let settings = Settings::from_env()?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    app::run_with_settings(&settings, &mut out).await
}
