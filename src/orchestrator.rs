//! End-to-end fix orchestration
//!
//! parse → batch → fix → write-with-backup → report → re-measure. Every
//! per-file failure becomes report data; only the upfront checker
//! invocation can abort the run.

use crate::backup;
use crate::checker::TypeChecker;
use crate::diagnostics::DiagnosticSet;
use crate::llm::extract::align_trailing_newline;
use crate::llm::failover::{FailoverFixer, FixResolution};
use crate::llm::prompts::MAX_FIX_FILE_CHARS;
use crate::llm::FixBackend;
use crate::progress::{ProgressEvent, ProgressSink};
use crate::util::truncate;
use anyhow::Context;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Outward-facing result for one file within one pass.
#[derive(Debug, Clone)]
pub struct FileFixReport {
    pub file: PathBuf,
    pub changed: bool,
    pub backup_path: Option<PathBuf>,
    pub notes: Option<String>,
    pub errors: Vec<String>,
}

impl FileFixReport {
    fn untouched(file: &Path) -> Self {
        Self {
            file: file.to_path_buf(),
            changed: false,
            backup_path: None,
            notes: None,
            errors: Vec::new(),
        }
    }
}

/// Bookkeeping for one iteration of the pass loop. Sealed once every file
/// in it has been attempted.
#[derive(Debug, Clone)]
pub struct Pass {
    pub index: usize,
    pub reports: Vec<FileFixReport>,
}

/// Aggregate before/after result for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub initial_error_count: usize,
    pub final_error_count: usize,
    /// May be zero or negative; a regression is reported, not rolled back
    pub errors_fixed: i64,
    pub files_changed: usize,
    pub backups_created: usize,
}

impl RunSummary {
    fn zero_work() -> Self {
        Self {
            initial_error_count: 0,
            final_error_count: 0,
            errors_fixed: 0,
            files_changed: 0,
            backups_created: 0,
        }
    }
}

/// Everything a run produced: the summary plus the per-file reports it was
/// derived from.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub summary: RunSummary,
    pub reports: Vec<FileFixReport>,
}

/// Cooperative cancellation flag, checked at pass and file boundaries. A
/// file whose backup has been written is always carried through its content
/// write before cancellation takes effect.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct Orchestrator<C, P, F> {
    root: PathBuf,
    checker: C,
    fixer: FailoverFixer<P, F>,
    progress: Box<dyn ProgressSink>,
    max_files_per_pass: usize,
    max_passes: usize,
    cancel: CancelToken,
}

impl<C: TypeChecker, P: FixBackend, F: FixBackend> Orchestrator<C, P, F> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        root: PathBuf,
        checker: C,
        fixer: FailoverFixer<P, F>,
        progress: Box<dyn ProgressSink>,
        max_files_per_pass: usize,
        max_passes: usize,
        cancel: CancelToken,
    ) -> Self {
        Self {
            root,
            checker,
            fixer,
            progress,
            max_files_per_pass: max_files_per_pass.max(1),
            max_passes,
            cancel,
        }
    }

    pub async fn run(&self) -> anyhow::Result<RunOutcome> {
        let initial = self
            .checker
            .check()
            .context("initial type checker run failed")?;
        let initial_count = initial.error_count();

        if initial.succeeded {
            return Ok(RunOutcome {
                summary: RunSummary::zero_work(),
                reports: Vec::new(),
            });
        }

        let mut queue: VecDeque<PathBuf> = initial.files().into();
        let mut reports: Vec<FileFixReport> = Vec::new();

        for pass_index in 1..=self.max_passes {
            if queue.is_empty() || self.cancel.is_cancelled() {
                break;
            }

            let batch: Vec<PathBuf> = (0..self.max_files_per_pass)
                .map_while(|_| queue.pop_front())
                .collect();
            let short_pass = batch.len() < self.max_files_per_pass;
            let mut pass = Pass {
                index: pass_index,
                reports: Vec::new(),
            };

            for (position, file) in batch.iter().enumerate() {
                if self.cancel.is_cancelled() {
                    break;
                }

                let report = self.fix_file(file, &initial).await;
                self.progress.file_attempted(&ProgressEvent {
                    pass: pass.index,
                    total_passes: self.max_passes,
                    position: position + 1,
                    pass_size: batch.len(),
                    file: file.clone(),
                    changed: report.changed,
                });
                pass.reports.push(report);
            }

            reports.extend(pass.reports);

            if short_pass {
                break;
            }
        }

        let final_count = match self.checker.check() {
            Ok(set) => set.error_count(),
            Err(err) => {
                eprintln!(
                    "  Warning: final re-check failed ({}); reporting the initial count",
                    err
                );
                initial_count
            }
        };

        let summary = RunSummary {
            initial_error_count: initial_count,
            final_error_count: final_count,
            errors_fixed: initial_count as i64 - final_count as i64,
            files_changed: reports.iter().filter(|r| r.changed).count(),
            backups_created: reports.iter().filter(|r| r.backup_path.is_some()).count(),
        };

        Ok(RunOutcome { summary, reports })
    }

    async fn fix_file(&self, file: &Path, initial: &DiagnosticSet) -> FileFixReport {
        let mut report = FileFixReport::untouched(file);

        let absolute = self.root.join(file);
        let content = match fs::read_to_string(&absolute) {
            Ok(content) => content,
            Err(err) => {
                report.errors.push(format!("file could not be read: {}", err));
                return report;
            }
        };

        let char_count = content.chars().count();
        if char_count > MAX_FIX_FILE_CHARS {
            report.errors.push(format!(
                "file too large to fix safely ({} chars, limit {})",
                char_count, MAX_FIX_FILE_CHARS
            ));
            return report;
        }

        let diagnostics = initial.for_file(file).unwrap_or(&[]);

        match self.fixer.fix(file, &content, diagnostics).await {
            FixResolution::Fixed {
                provider,
                content: fixed,
            } => {
                let fixed = align_trailing_newline(&content, fixed);
                if fixed == content {
                    report.notes = Some(format!("{} returned unchanged content", provider));
                    return report;
                }

                // Backup first, always; the overwrite never happens without it.
                match backup::write_backup(&absolute, &content) {
                    Ok(backup_path) => {
                        report.backup_path = Some(backup_path);
                        match fs::write(&absolute, &fixed) {
                            Ok(()) => {
                                report.changed = true;
                                report.notes = Some(format!(
                                    "{} targeted {} diagnostic(s)",
                                    provider,
                                    diagnostics.len()
                                ));
                            }
                            Err(err) => report
                                .errors
                                .push(format!("fixed content could not be written: {}", err)),
                        }
                    }
                    Err(err) => report.errors.push(truncate(&format!("{:#}", err), 300)),
                }
            }
            FixResolution::Failed { errors } => report.errors.extend(errors),
        }

        report
    }
}
