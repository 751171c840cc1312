//! Extraction of fixed source from a provider response
//!
//! Patterns are tried most-specific first: a fence labeled with the file
//! path, then a language-tagged fence, then any fence, then the raw
//! response if it resembles source. Each pattern is total and returns
//! `None` rather than partial structure.

use regex::Regex;
use std::path::Path;

/// Markers that make a candidate look like an actual source file rather
/// than conversational filler.
const SOURCE_MARKERS: &[&str] = &[
    "import ",
    "export ",
    "function ",
    "class ",
    "const ",
    "let ",
    "var ",
    "interface ",
    "type ",
    "enum ",
    "=>",
    "require(",
    "module.exports",
];

/// Pull replacement file content out of a provider response. Returns `None`
/// when nothing usable can be extracted.
pub fn extract_fixed_source(response: &str, file: &Path) -> Option<String> {
    extract_file_labeled_block(response, file)
        .or_else(|| extract_language_block(response))
        .or_else(|| extract_any_block(response))
        .or_else(|| extract_raw_source(response))
        .filter(|text| looks_like_source(text))
}

fn extract_file_labeled_block(response: &str, file: &Path) -> Option<String> {
    let label = regex::escape(&file.display().to_string().replace('\\', "/"));
    let pattern = format!(r"(?s)```[^\n]*{}[^\n]*\n(.*?)```", label);
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(response)?;
    non_empty(caps.get(1)?.as_str())
}

fn extract_language_block(response: &str) -> Option<String> {
    let re = Regex::new(r"(?s)```(?:typescript|javascript|tsx|jsx|ts|js)[ \t]*\n(.*?)```").ok()?;
    let caps = re.captures(response)?;
    non_empty(caps.get(1)?.as_str())
}

fn extract_any_block(response: &str) -> Option<String> {
    let re = Regex::new(r"(?s)```[^\n]*\n(.*?)```").ok()?;
    let caps = re.captures(response)?;
    non_empty(caps.get(1)?.as_str())
}

fn extract_raw_source(response: &str) -> Option<String> {
    let trimmed = response.trim();
    if trimmed.contains("```") {
        return None;
    }
    if !looks_like_source(trimmed) {
        return None;
    }
    non_empty(trimmed)
}

fn looks_like_source(text: &str) -> bool {
    SOURCE_MARKERS.iter().any(|marker| text.contains(marker))
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Match the extracted content's trailing newline to the original file so a
/// fix never flips the file's final-newline convention.
pub fn align_trailing_newline(original: &str, content: String) -> String {
    let original_ends_newline = original.ends_with('\n');
    let mut aligned = content;

    if original_ends_newline {
        if !aligned.ends_with('\n') {
            if original.ends_with("\r\n") {
                aligned.push_str("\r\n");
            } else {
                aligned.push('\n');
            }
        }
    } else {
        while aligned.ends_with('\n') {
            if aligned.ends_with("\r\n") {
                let new_len = aligned.len().saturating_sub(2);
                aligned.truncate(new_len);
            } else {
                let new_len = aligned.len().saturating_sub(1);
                aligned.truncate(new_len);
            }
        }
    }

    aligned
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn file() -> PathBuf {
        PathBuf::from("src/app.ts")
    }

    #[test]
    fn test_file_labeled_block_wins_over_other_fences() {
        let response = "\
Some notes first.

```ts
const wrong = true;
```

```ts src/app.ts
const right = true;
```";
        let extracted = extract_fixed_source(response, &file()).unwrap();
        assert_eq!(extracted, "const right = true;");
    }

    #[test]
    fn test_language_tagged_fence() {
        let response = "```typescript\nexport const x = 1;\n```";
        let extracted = extract_fixed_source(response, &file()).unwrap();
        assert_eq!(extracted, "export const x = 1;");
    }

    #[test]
    fn test_any_fence_as_last_fence_resort() {
        let response = "```\nfunction main() {}\n```";
        let extracted = extract_fixed_source(response, &file()).unwrap();
        assert_eq!(extracted, "function main() {}");
    }

    #[test]
    fn test_raw_response_accepted_when_it_resembles_source() {
        let response = "import { x } from './x';\nexport const y = x + 1;";
        let extracted = extract_fixed_source(response, &file()).unwrap();
        assert_eq!(extracted, response);
    }

    #[test]
    fn test_conversational_filler_is_rejected() {
        let response = "Sure! I looked at the diagnostics and the code seems fine to me.";
        assert!(extract_fixed_source(response, &file()).is_none());
    }

    #[test]
    fn test_fenced_filler_is_rejected_by_marker_check() {
        let response = "```\nno code here, just words\n```";
        assert!(extract_fixed_source(response, &file()).is_none());
    }

    #[test]
    fn test_empty_response_yields_nothing() {
        assert!(extract_fixed_source("", &file()).is_none());
        assert!(extract_fixed_source("```\n\n```", &file()).is_none());
    }

    #[test]
    fn test_align_trailing_newline_adds_when_original_had() {
        let aligned = align_trailing_newline("line\n", "line".to_string());
        assert_eq!(aligned, "line\n");
    }

    #[test]
    fn test_align_trailing_newline_strips_when_original_missing() {
        let aligned = align_trailing_newline("line", "line\n\n".to_string());
        assert_eq!(aligned, "line");
    }

    #[test]
    fn test_align_trailing_newline_preserves_crlf() {
        let aligned = align_trailing_newline("line\r\n", "line".to_string());
        assert_eq!(aligned, "line\r\n");
    }
}
