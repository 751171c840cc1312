//! Type checker invocation
//!
//! Runs the configured checker as a synchronous subprocess from the project
//! root and parses its combined output. Checker-reported errors are the
//! expected path; only a process that cannot be started at all is an `Err`.

use crate::diagnostics::{self, DiagnosticSet};
use crate::util::run_command_with_timeout;
use anyhow::Context;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

/// A source of diagnostics. The orchestrator only ever sees this trait, so
/// tests can substitute canned results for the real subprocess.
pub trait TypeChecker {
    fn check(&self) -> anyhow::Result<DiagnosticSet>;
}

/// Invokes a tsc-style checker subprocess.
pub struct CommandChecker {
    root: PathBuf,
    argv: Vec<String>,
    timeout: Duration,
}

impl CommandChecker {
    pub fn new(root: PathBuf, argv: Vec<String>, timeout: Duration) -> anyhow::Result<Self> {
        anyhow::ensure!(!argv.is_empty(), "checker command is empty");
        Ok(Self {
            root,
            argv,
            timeout,
        })
    }
}

impl TypeChecker for CommandChecker {
    fn check(&self) -> anyhow::Result<DiagnosticSet> {
        let mut command = Command::new(&self.argv[0]);
        command.args(&self.argv[1..]).current_dir(&self.root);

        let run = run_command_with_timeout(&mut command, self.timeout).with_context(|| {
            format!("type checker could not be invoked: `{}`", self.argv.join(" "))
        })?;

        if run.timed_out {
            // Partial output beats none for a remediation pipeline.
            eprintln!(
                "  Warning: type checker timed out after {}s; using partial output",
                self.timeout.as_secs()
            );
        }

        let mut output = run.stdout;
        if !run.stderr.is_empty() {
            if !output.is_empty() {
                output.push('\n');
            }
            output.push_str(&run.stderr);
        }

        let exited_clean = !run.timed_out && run.status.map(|s| s.success()).unwrap_or(false);
        Ok(diagnostics::parse_output(&output, exited_clean, &self.root))
    }
}
