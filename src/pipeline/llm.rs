//! LLM interaction: build the extraction messages and call the provider.
//!
//! This module converts raw OCR text plus the declared document kind into a
//! chat completion call. It is intentionally thin — all prompt engineering
//! lives in [`crate::prompts`] so it can be changed without touching retry
//! or error-handling logic here.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 errors from LLM APIs are transient and frequent.
//! Exponential backoff (`retry_backoff_ms * 2^attempt`) avoids hammering a
//! recovering endpoint: with 500 ms base and 3 retries the wait sequence is
//! 500 ms → 1 s → 2 s. Each attempt is capped at `api_timeout_secs`; a hung
//! connection counts as a failed attempt and retries like any other error.

use crate::config::ExtractionConfig;
use crate::document::DocumentKind;
use crate::error::ExtractError;
use crate::prompts::{build_user_prompt, DEFAULT_SYSTEM_PROMPT};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// The model's reply plus call accounting.
#[derive(Debug, Clone)]
pub struct LlmReply {
    pub content: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub retries: u32,
    pub duration_ms: u64,
}

/// Submit the OCR text for field extraction and return the raw reply.
///
/// The request contains two messages: the JSON-envelope system prompt (or a
/// caller-supplied override) and a user message carrying the declared kind,
/// its fixed field rules, and the document text.
pub async fn extract_fields(
    provider: &Arc<dyn LLMProvider>,
    kind: DocumentKind,
    text: &str,
    config: &ExtractionConfig,
) -> Result<LlmReply, ExtractError> {
    let start = Instant::now();
    let system_prompt = config
        .system_prompt
        .as_deref()
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);

    let messages = vec![
        ChatMessage::system(system_prompt),
        ChatMessage::user(build_user_prompt(kind, text)),
    ];

    let options = build_options(config);

    let mut last_err: Option<String> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config.retry_backoff_ms * 2u64.pow(attempt - 1);
            warn!(
                "Field extraction: retry {}/{} after {}ms",
                attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        let call = provider.chat(&messages, Some(&options));
        match call_with_timeout(config.api_timeout_secs, call).await {
            Ok(response) => {
                let duration = start.elapsed();
                debug!(
                    "Field extraction: {} input tokens, {} output tokens, {:?}",
                    response.prompt_tokens, response.completion_tokens, duration
                );

                return Ok(LlmReply {
                    content: response.content,
                    input_tokens: response.prompt_tokens as u64,
                    output_tokens: response.completion_tokens as u64,
                    retries: attempt,
                    duration_ms: duration.as_millis() as u64,
                });
            }
            Err(err_msg) => {
                warn!("Field extraction: attempt {} failed — {}", attempt + 1, err_msg);
                last_err = Some(err_msg);
            }
        }
    }

    Err(ExtractError::LlmApiError {
        retries: config.max_retries,
        message: last_err.unwrap_or_else(|| "Unknown error".to_string()),
    })
}

/// Run one API call with the configured deadline.
///
/// Both outcomes collapse into a message string so the retry loop treats a
/// hung connection exactly like a provider error: log, back off, retry.
async fn call_with_timeout<T, E, F>(timeout_secs: u64, fut: F) -> Result<T, String>
where
    F: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    match timeout(Duration::from_secs(timeout_secs), fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(format!("{}", e)),
        Err(_) => Err(format!("API call timed out after {}s", timeout_secs)),
    }
}

/// Build `CompletionOptions` from the extraction config.
fn build_options(config: &ExtractionConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_defaults() {
        let config = ExtractionConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.1));
        assert_eq!(opts.max_tokens, Some(2048));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_call_elapses_the_deadline() {
        let hang = async {
            sleep(Duration::from_secs(3600)).await;
            Ok::<_, std::io::Error>("never")
        };
        let err = call_with_timeout(5, hang).await.unwrap_err();
        assert!(err.contains("timed out after 5s"), "got: {err}");
    }

    #[tokio::test(start_paused = true)]
    async fn fast_call_passes_through() {
        let ok = async { Ok::<_, std::io::Error>(42) };
        assert_eq!(call_with_timeout(5, ok).await.unwrap(), 42);

        let fail = async {
            Err::<i32, _>(std::io::Error::new(std::io::ErrorKind::Other, "HTTP 503"))
        };
        let err = call_with_timeout(5, fail).await.unwrap_err();
        assert!(err.contains("HTTP 503"), "got: {err}");
    }
}
