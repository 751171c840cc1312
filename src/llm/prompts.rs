//! Prompt construction for the fix backends
//!
//! The prompt is deterministic: the same file and diagnostics always
//! produce the same text, so provider behavior is the only variable.

use crate::diagnostics::Diagnostic;
use std::path::Path;

/// Upper bound on file size sent to a provider.
pub const MAX_FIX_FILE_CHARS: usize = 20000;

pub const FIX_FILE_SYSTEM: &str = r#"You are a senior developer fixing type checker errors. You will receive one file and the exact diagnostics reported against it.

OUTPUT FORMAT:
- Emit exactly ONE fenced code block containing the complete fixed file
- Label the fence with the file path, e.g. ```ts src/app.ts
- No prose, no explanations, nothing outside the block

CRITICAL RULES:
- Preserve the file's structure, formatting and comments
- Fix ONLY the listed diagnostics; do not refactor, rename or clean up unrelated code
- Keep imports, exports and public signatures intact unless a diagnostic requires the change
- The block must contain the ENTIRE file, not a snippet"#;

/// Render diagnostics as `line, column: code - message` lines.
pub fn render_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| format!("{}, {}: {} - {}", d.line, d.column, d.code, d.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the user message: diagnostics first, then the full file body.
pub fn build_user_prompt(file: &Path, content: &str, diagnostics: &[Diagnostic]) -> String {
    format!(
        "File: {}\n\nDiagnostics:\n{}\n\nCurrent Code:\n```\n{}\n```\n\nReturn the complete fixed file in one fenced code block labeled with the file path.",
        file.display(),
        render_diagnostics(diagnostics),
        content
    )
}
