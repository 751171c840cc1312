//! Primary/fallback composition
//!
//! Tries the primary; on a capacity-class failure retries once with the
//! fallback. Malformed or unknown failures are terminal for the file, and
//! so is a response with no usable output.

use super::{FixAttempt, FixBackend, FixOutcome, ProviderErrorKind};
use crate::diagnostics::Diagnostic;
use std::path::Path;

/// Result of one file's full fix attempt across providers.
#[derive(Debug, Clone)]
pub enum FixResolution {
    Fixed {
        provider: &'static str,
        content: String,
    },
    /// One entry per provider consulted, in call order
    Failed { errors: Vec<String> },
}

pub struct FailoverFixer<P, F> {
    primary: P,
    fallback: Option<F>,
}

impl<P: FixBackend, F: FixBackend> FailoverFixer<P, F> {
    pub fn new(primary: P, fallback: Option<F>) -> Self {
        Self { primary, fallback }
    }

    pub async fn fix(
        &self,
        file: &Path,
        content: &str,
        diagnostics: &[Diagnostic],
    ) -> FixResolution {
        let FixAttempt { provider, outcome } =
            attempt(&self.primary, file, content, diagnostics).await;

        let (kind, detail) = match outcome {
            FixOutcome::Fixed(fixed) => {
                return FixResolution::Fixed {
                    provider,
                    content: fixed,
                }
            }
            FixOutcome::NoUsableOutput => {
                return FixResolution::Failed {
                    errors: vec![describe_no_output(provider)],
                }
            }
            FixOutcome::ProviderError { kind, detail } => (kind, detail),
        };

        let primary_error = describe_error(provider, kind, &detail);
        if !kind.triggers_failover() {
            return FixResolution::Failed {
                errors: vec![primary_error],
            };
        }

        let Some(fallback) = &self.fallback else {
            return FixResolution::Failed {
                errors: vec![
                    primary_error,
                    "fallback provider is not configured".to_string(),
                ],
            };
        };

        let FixAttempt { provider, outcome } = attempt(fallback, file, content, diagnostics).await;
        match outcome {
            FixOutcome::Fixed(fixed) => FixResolution::Fixed {
                provider,
                content: fixed,
            },
            FixOutcome::NoUsableOutput => FixResolution::Failed {
                errors: vec![primary_error, describe_no_output(provider)],
            },
            FixOutcome::ProviderError { kind, detail } => FixResolution::Failed {
                errors: vec![primary_error, describe_error(provider, kind, &detail)],
            },
        }
    }
}

async fn attempt<B: FixBackend>(
    backend: &B,
    file: &Path,
    content: &str,
    diagnostics: &[Diagnostic],
) -> FixAttempt {
    FixAttempt {
        provider: backend.name(),
        outcome: backend.fix(file, content, diagnostics).await,
    }
}

fn describe_error(provider: &str, kind: ProviderErrorKind, detail: &str) -> String {
    format!("{}: {} - {}", provider, kind.label(), detail)
}

fn describe_no_output(provider: &str) -> String {
    format!("{}: response contained no usable code block", provider)
}
