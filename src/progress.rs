//! Progress reporting
//!
//! One structured event per attempted file, emitted as soon as the file's
//! report exists, so a long-running fix session is observable incrementally
//! rather than only at the end.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// 1-based pass index
    pub pass: usize,
    /// Configured pass budget
    pub total_passes: usize,
    /// 1-based position within the pass
    pub position: usize,
    /// Number of files in this pass
    pub pass_size: usize,
    pub file: PathBuf,
    /// True when the file was changed on disk
    pub changed: bool,
}

impl ProgressEvent {
    pub fn glyph(&self) -> &'static str {
        if self.changed {
            "+"
        } else {
            "●"
        }
    }
}

pub trait ProgressSink {
    fn file_attempted(&self, event: &ProgressEvent);
}

/// Prints one line per attempted file.
pub struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn file_attempted(&self, event: &ProgressEvent) {
        println!(
            "  [{}/{}] {} {}",
            event.pass,
            event.total_passes,
            event.file.display(),
            event.glyph()
        );
    }
}

/// Swallows events; for callers that do not want progress display.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn file_attempted(&self, _event: &ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyphs() {
        let mut event = ProgressEvent {
            pass: 1,
            total_passes: 5,
            position: 1,
            pass_size: 2,
            file: PathBuf::from("src/app.ts"),
            changed: true,
        };
        assert_eq!(event.glyph(), "+");
        event.changed = false;
        assert_eq!(event.glyph(), "●");
    }
}
