//! OpenRouter-backed primary fixer

use super::extract::extract_fixed_source;
use super::prompts::{build_user_prompt, FIX_FILE_SYSTEM};
use super::{FixBackend, FixOutcome, ProviderErrorKind};
use crate::diagnostics::Diagnostic;
use crate::util::truncate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const MODEL: &str = "anthropic/claude-sonnet-4.5";
const MAX_TOKENS: u32 = 16384;

pub struct OpenRouterFixer {
    client: reqwest::Client,
    api_key: String,
}

impl OpenRouterFixer {
    pub fn new(api_key: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, api_key })
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: &'static str,
    messages: Vec<Message>,
    max_tokens: u32,
    stream: bool,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    content: String,
}

impl FixBackend for OpenRouterFixer {
    fn name(&self) -> &'static str {
        "openrouter"
    }

    async fn fix(&self, file: &Path, content: &str, diagnostics: &[Diagnostic]) -> FixOutcome {
        let request = ChatRequest {
            model: MODEL,
            messages: vec![
                Message {
                    role: "system",
                    content: FIX_FILE_SYSTEM.to_string(),
                },
                Message {
                    role: "user",
                    content: build_user_prompt(file, content, diagnostics),
                },
            ],
            max_tokens: MAX_TOKENS,
            stream: false,
        };

        let response = match self
            .client
            .post(OPENROUTER_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", "https://typemend.dev")
            .header("X-Title", "Typemend")
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => return transport_error(err),
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(err) => return transport_error(err),
        };

        if !status.is_success() {
            return FixOutcome::ProviderError {
                kind: classify_status(status.as_u16()),
                detail: format!("HTTP {}: {}", status.as_u16(), truncate(&text, 200)),
            };
        }

        let parsed: ChatResponse = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(err) => {
                return FixOutcome::ProviderError {
                    kind: ProviderErrorKind::Malformed,
                    detail: format!("response envelope did not decode: {}", err),
                }
            }
        };

        let Some(reply) = parsed.choices.first().map(|c| c.message.content.as_str()) else {
            return FixOutcome::ProviderError {
                kind: ProviderErrorKind::Malformed,
                detail: "response had no choices".to_string(),
            };
        };

        match extract_fixed_source(reply, file) {
            Some(fixed) => FixOutcome::Fixed(fixed),
            None => FixOutcome::NoUsableOutput,
        }
    }
}

// 402 is OpenRouter's out-of-credits signal, the same capacity class as 429.
fn classify_status(status: u16) -> ProviderErrorKind {
    match status {
        429 | 402 => ProviderErrorKind::RateLimited,
        500..=599 => ProviderErrorKind::Unavailable,
        _ => ProviderErrorKind::Unknown,
    }
}

fn transport_error(err: reqwest::Error) -> FixOutcome {
    let kind = if err.is_timeout() || err.is_connect() {
        ProviderErrorKind::Unavailable
    } else {
        ProviderErrorKind::Unknown
    };
    FixOutcome::ProviderError {
        kind,
        detail: format!("transport: {}", err),
    }
}
