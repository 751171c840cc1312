//! Gemini-backed fallback fixer
//!
//! Same contract as the primary; only the endpoint, model and response
//! envelope differ.

use super::extract::extract_fixed_source;
use super::prompts::{build_user_prompt, FIX_FILE_SYSTEM};
use super::{FixBackend, FixOutcome, ProviderErrorKind};
use crate::diagnostics::Diagnostic;
use crate::util::truncate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const GEMINI_URL_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const MODEL: &str = "gemini-2.5-flash";

pub struct GeminiFixer {
    client: reqwest::Client,
    api_key: String,
}

impl GeminiFixer {
    pub fn new(api_key: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, api_key })
    }
}

#[derive(Serialize)]
struct GenerateRequest {
    #[serde(rename = "systemInstruction")]
    system_instruction: RequestContent,
    contents: Vec<RequestContent>,
}

#[derive(Serialize)]
struct RequestContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl FixBackend for GeminiFixer {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn fix(&self, file: &Path, content: &str, diagnostics: &[Diagnostic]) -> FixOutcome {
        let request = GenerateRequest {
            system_instruction: RequestContent {
                role: None,
                parts: vec![RequestPart {
                    text: FIX_FILE_SYSTEM.to_string(),
                }],
            },
            contents: vec![RequestContent {
                role: Some("user"),
                parts: vec![RequestPart {
                    text: build_user_prompt(file, content, diagnostics),
                }],
            }],
        };

        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_URL_BASE, MODEL, self.api_key
        );

        let response = match self.client.post(&url).json(&request).send().await {
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

        let parsed: GenerateResponse = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(err) => {
                return FixOutcome::ProviderError {
                    kind: ProviderErrorKind::Malformed,
                    detail: format!("response envelope did not decode: {}", err),
                }
            }
        };

        let Some(candidate) = parsed.candidates.first() else {
            return FixOutcome::ProviderError {
                kind: ProviderErrorKind::Malformed,
                detail: "response had no candidates".to_string(),
            };
        };

        let reply: String = candidate
            .content
            .as_ref()
            .map(|c| {
                c.parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        match extract_fixed_source(&reply, file) {
            Some(fixed) => FixOutcome::Fixed(fixed),
            None => FixOutcome::NoUsableOutput,
        }
    }
}

// Gemini reports quota exhaustion as 429 RESOURCE_EXHAUSTED.
fn classify_status(status: u16) -> ProviderErrorKind {
    match status {
        429 => ProviderErrorKind::RateLimited,
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
