//! Summarization gateway.
//!
//! The pipeline only sees the `Summarizer` trait; the production
//! implementation talks to an OpenAI-compatible chat-completions endpoint
//! over blocking HTTP. Calls are never retried here — a failed chapter is
//! the caller's decision to abort or skip.

use crate::config::AppConfig;
use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// The external summarization boundary: chapter text in, summary text out.
pub trait Summarizer {
    fn summarize(&self, text: &str) -> Result<String>;
}

/// Chat-completions client. Built once at startup from the loaded
/// configuration; the credential comes from the environment variable the
/// config names and is read exactly once.
pub struct OpenAiSummarizer {
    client: reqwest::blocking::Client,
    api_url: String,
    api_key: String,
    model: String,
    prompt: String,
}

impl OpenAiSummarizer {
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let api_key = std::env::var(&cfg.api_key_env)
            .with_context(|| format!("Missing API credential in ${}", cfg.api_key_env))?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(OpenAiSummarizer {
            client,
            api_url: cfg.api_url.clone(),
            api_key,
            model: cfg.model.clone(),
            prompt: cfg.prompt.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl Summarizer for OpenAiSummarizer {
    fn summarize(&self, text: &str) -> Result<String> {
        debug!(model = %self.model, chars = text.len(), "Requesting summary");
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "messages": [
                    {"role": "system", "content": self.prompt},
                    {"role": "user", "content": text},
                ],
            }))
            .send()
            .context("Summarization request failed")?;

        let status = response.status();
        let body = response
            .text()
            .context("Failed to read summarization response")?;
        if !status.is_success() {
            return Err(anyhow!(
                "Summarization endpoint returned {status}: {}",
                body.trim()
            ));
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).context("Unexpected summarization response format")?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("Summarization response contained no choices"))?;

        Ok(content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_content_is_extracted() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "  Summary text.  "}}
            ]
        }"#;

        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        let content = parsed.choices.into_iter().next().unwrap().message.content;
        assert_eq!(content.trim(), "Summary text.");
    }

    #[test]
    fn empty_choices_are_detectable() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(parsed.choices.is_empty());
    }
}
