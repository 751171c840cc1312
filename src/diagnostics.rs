//! Diagnostic parsing and per-file grouping
//!
//! Turns the type checker's text output into structured diagnostics. The
//! parser is intentionally lossy: a line either matches the full grammar
//! `<file>(<line>,<col>): error <code>: <message>` or produces nothing.
//! Summary banners, blank lines and multi-line continuations are ignored,
//! so the parser under-reports rather than mis-structures.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// One checker-reported problem at a specific source position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Path relative to the project root, forward-slash normalized
    pub file: PathBuf,
    /// 1-based line
    pub line: usize,
    /// 1-based column
    pub column: usize,
    /// Checker-specific code, e.g. `TS2345`
    pub code: String,
    pub message: String,
    /// Original unparsed line, kept for prompts and debugging
    pub raw_line: String,
}

/// Diagnostics for a single file, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiagnostics {
    pub file: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
}

/// The full result of one checker run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticSet {
    /// True iff the checker exited cleanly with zero diagnostics
    pub succeeded: bool,
    /// All diagnostics, in emission order
    pub diagnostics: Vec<Diagnostic>,
    groups: Vec<FileDiagnostics>,
}

impl DiagnosticSet {
    /// Build a set from parsed diagnostics. The per-file groups are derived
    /// here and nowhere else, so they cannot drift from the flat list.
    pub fn new(succeeded: bool, diagnostics: Vec<Diagnostic>) -> Self {
        let mut groups: Vec<FileDiagnostics> = Vec::new();
        for diag in &diagnostics {
            match groups.iter_mut().find(|g| g.file == diag.file) {
                Some(group) => group.diagnostics.push(diag.clone()),
                None => groups.push(FileDiagnostics {
                    file: diag.file.clone(),
                    diagnostics: vec![diag.clone()],
                }),
            }
        }
        Self {
            succeeded,
            diagnostics,
            groups,
        }
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.len()
    }

    /// Per-file groups, in first-seen file order.
    pub fn groups(&self) -> &[FileDiagnostics] {
        &self.groups
    }

    /// Files with diagnostics, in first-seen order.
    pub fn files(&self) -> Vec<PathBuf> {
        self.groups.iter().map(|g| g.file.clone()).collect()
    }

    pub fn for_file(&self, file: &Path) -> Option<&[Diagnostic]> {
        self.groups
            .iter()
            .find(|g| g.file == file)
            .map(|g| g.diagnostics.as_slice())
    }
}

fn diagnostic_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(.+?)\((\d+),(\d+)\):\s*error\s+([A-Za-z0-9_-]+):\s*(.*\S)\s*$")
            .expect("diagnostic grammar regex")
    })
}

/// Parse one checker output line. Returns `None` for anything that does not
/// match the grammar exactly; a partially-matching line never yields a
/// partially-filled diagnostic.
pub fn parse_line(line: &str, root: &Path) -> Option<Diagnostic> {
    let caps = diagnostic_line_re().captures(line)?;
    let line_no: usize = caps[2].parse().ok()?;
    let column: usize = caps[3].parse().ok()?;
    if line_no == 0 || column == 0 {
        return None;
    }
    Some(Diagnostic {
        file: normalize_path(&caps[1], root),
        line: line_no,
        column,
        code: caps[4].to_string(),
        message: caps[5].to_string(),
        raw_line: line.to_string(),
    })
}

/// Parse a full checker output (stdout and stderr already combined).
pub fn parse_output(output: &str, exited_clean: bool, root: &Path) -> DiagnosticSet {
    let diagnostics: Vec<Diagnostic> = output
        .lines()
        .filter_map(|line| parse_line(line, root))
        .collect();
    let succeeded = exited_clean && diagnostics.is_empty();
    DiagnosticSet::new(succeeded, diagnostics)
}

/// Normalize a checker-emitted path to a stable, root-relative grouping key.
pub fn normalize_path(raw: &str, root: &Path) -> PathBuf {
    let forward = raw.trim().replace('\\', "/");
    let trimmed = forward.strip_prefix("./").unwrap_or(&forward);
    let path = Path::new(trimmed);
    if path.is_absolute() {
        if let Ok(rel) = path.strip_prefix(root) {
            return rel.to_path_buf();
        }
    }
    PathBuf::from(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> PathBuf {
        PathBuf::from("/project")
    }

    #[test]
    fn test_parse_well_formed_line() {
        let line = "src/app.ts(12,5): error TS2345: Argument of type 'string' is not assignable.";
        let diag = parse_line(line, &root()).unwrap();
        assert_eq!(diag.file, PathBuf::from("src/app.ts"));
        assert_eq!(diag.line, 12);
        assert_eq!(diag.column, 5);
        assert_eq!(diag.code, "TS2345");
        assert_eq!(
            diag.message,
            "Argument of type 'string' is not assignable."
        );
        assert_eq!(diag.raw_line, line);
    }

    #[test]
    fn test_parse_ignores_non_matching_lines() {
        for line in [
            "",
            "Found 3 errors in 2 files.",
            "  Type 'string' is not assignable to type 'number'.",
            "src/app.ts(12,5): warning TS1234: not an error",
        ] {
            assert!(parse_line(line, &root()).is_none(), "matched: {:?}", line);
        }
    }

    #[test]
    fn test_parse_drops_zero_positions() {
        let line = "src/app.ts(0,5): error TS2345: bad position";
        assert!(parse_line(line, &root()).is_none());
    }

    #[test]
    fn test_normalize_path_strips_dot_slash_and_backslashes() {
        assert_eq!(
            normalize_path("./src/app.ts", &root()),
            PathBuf::from("src/app.ts")
        );
        assert_eq!(
            normalize_path("src\\sub\\app.ts", &root()),
            PathBuf::from("src/sub/app.ts")
        );
    }

    #[test]
    fn test_normalize_path_makes_absolute_relative_to_root() {
        assert_eq!(
            normalize_path("/project/src/app.ts", &root()),
            PathBuf::from("src/app.ts")
        );
    }

    #[test]
    fn test_grouping_preserves_first_seen_order() {
        let output = "\
b.ts(1,1): error TS1: one
a.ts(2,2): error TS2: two
b.ts(3,3): error TS3: three
Found 3 errors.";
        let set = parse_output(output, false, &root());
        assert_eq!(set.error_count(), 3);
        assert_eq!(
            set.files(),
            vec![PathBuf::from("b.ts"), PathBuf::from("a.ts")]
        );
        let b = set.for_file(Path::new("b.ts")).unwrap();
        assert_eq!(b.len(), 2);
        assert_eq!(b[0].line, 1);
        assert_eq!(b[1].line, 3);
    }

    #[test]
    fn test_groups_match_flat_list() {
        let output = "\
a.ts(1,1): error TS1: one
b.ts(2,2): error TS2: two
a.ts(3,3): error TS3: three";
        let set = parse_output(output, false, &root());
        let regrouped: Vec<&Diagnostic> = set
            .groups()
            .iter()
            .flat_map(|g| g.diagnostics.iter())
            .collect();
        assert_eq!(regrouped.len(), set.diagnostics.len());
        for group in set.groups() {
            let from_flat: Vec<&Diagnostic> = set
                .diagnostics
                .iter()
                .filter(|d| d.file == group.file)
                .collect();
            let from_group: Vec<&Diagnostic> = group.diagnostics.iter().collect();
            assert_eq!(from_group, from_flat);
        }
    }

    #[test]
    fn test_parse_is_idempotent() {
        let output = "a.ts(1,1): error TS1: one\nb.ts(2,2): error TS2: two";
        let first = parse_output(output, false, &root());
        let second = parse_output(output, false, &root());
        assert_eq!(first, second);
    }

    #[test]
    fn test_succeeded_requires_clean_exit_and_no_diagnostics() {
        assert!(parse_output("", true, &root()).succeeded);
        assert!(!parse_output("", false, &root()).succeeded);
        assert!(!parse_output("a.ts(1,1): error TS1: x", true, &root()).succeeded);
    }
}
