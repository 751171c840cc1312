//! AI code-fix backends
//!
//! A backend takes one file's content plus its diagnostics and returns a
//! replacement body or a typed failure. Providers differ only in endpoint,
//! model identifier and response envelope; the shared contract is what makes
//! failover possible without special-casing call sites.

pub mod extract;
pub mod failover;
pub mod gemini;
pub mod openrouter;
pub mod prompts;

use crate::diagnostics::Diagnostic;
use std::path::Path;

/// How a provider call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Quota or rate-limit signal
    RateLimited,
    /// Connectivity or server-side failure
    Unavailable,
    /// The provider answered but the envelope could not be decoded
    Malformed,
    Unknown,
}

impl ProviderErrorKind {
    /// Failover routes around capacity problems only. A malformed response
    /// signals a prompt or extraction problem the fallback would hit too.
    pub fn triggers_failover(&self) -> bool {
        matches!(
            self,
            ProviderErrorKind::RateLimited | ProviderErrorKind::Unavailable
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProviderErrorKind::RateLimited => "rate-limited",
            ProviderErrorKind::Unavailable => "unavailable",
            ProviderErrorKind::Malformed => "malformed response",
            ProviderErrorKind::Unknown => "unknown error",
        }
    }
}

/// Outcome of a single provider call for a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixOutcome {
    /// Replacement file content extracted from the response
    Fixed(String),
    /// The call succeeded but no usable code came back
    NoUsableOutput,
    ProviderError {
        kind: ProviderErrorKind,
        detail: String,
    },
}

/// One backend invocation outcome, tagged with the provider that produced it.
#[derive(Debug, Clone)]
pub struct FixAttempt {
    pub provider: &'static str,
    pub outcome: FixOutcome,
}

/// Shared contract for all providers. `fix` is total: every transport or
/// envelope problem comes back as a `FixOutcome`, never as a panic or Err.
#[allow(async_fn_in_trait)]
pub trait FixBackend {
    fn name(&self) -> &'static str;

    async fn fix(&self, file: &Path, content: &str, diagnostics: &[Diagnostic]) -> FixOutcome;
}
