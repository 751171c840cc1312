use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use typemend::checker::CommandChecker;
use typemend::config::Config;
use typemend::llm::failover::FailoverFixer;
use typemend::llm::gemini::GeminiFixer;
use typemend::llm::openrouter::OpenRouterFixer;
use typemend::orchestrator::{CancelToken, Orchestrator, RunSummary};
use typemend::progress::ConsoleSink;

#[derive(Parser, Debug)]
#[command(
    name = "typemend",
    about = "Automated, AI-assisted repair for type checker diagnostics",
    version
)]
struct Args {
    /// Maximum number of fix passes
    #[arg(default_value_t = 5)]
    passes: usize,

    /// Project root containing the checker configuration
    #[arg(short, long, default_value = ".")]
    path: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(summary) => {
            print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<RunSummary> {
    let args = Args::parse();
    let root = args
        .path
        .canonicalize()
        .with_context(|| format!("project root not found: {}", args.path.display()))?;

    let config = Config::load();

    // Fail fast on missing credentials, before the checker ever runs.
    let Some(openrouter_key) = config.openrouter_key() else {
        anyhow::bail!(
            "no OpenRouter API key configured. Set OPENROUTER_API_KEY, store a key in the system keychain, or add it to {}.",
            Config::config_location()
        );
    };

    let request_timeout = Duration::from_secs(config.request_timeout_secs);
    let primary = OpenRouterFixer::new(openrouter_key, request_timeout)?;
    let fallback = match config.gemini_key() {
        Some(key) => Some(GeminiFixer::new(key, request_timeout)?),
        None => {
            eprintln!("  No Gemini API key configured; failover is disabled.");
            None
        }
    };

    let checker = CommandChecker::new(
        root.clone(),
        config.checker_command.clone(),
        Duration::from_secs(config.checker_timeout_secs),
    )?;

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\n  Cancellation requested; finishing the current file...");
                cancel.cancel();
            }
        });
    }

    eprintln!("  Running type checker...");
    let orchestrator = Orchestrator::new(
        root,
        checker,
        FailoverFixer::new(primary, fallback),
        Box::new(ConsoleSink),
        config.max_files_per_pass,
        args.passes,
        cancel,
    );

    let outcome = orchestrator.run().await?;
    Ok(outcome.summary)
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("  ┌────────────────────────────────────┐");
    println!("  │  typemend run complete             │");
    println!("  └────────────────────────────────────┘");
    println!("  initial errors : {}", summary.initial_error_count);
    println!("  final errors   : {}", summary.final_error_count);
    println!("  errors fixed   : {}", summary.errors_fixed);
    println!("  files changed  : {}", summary.files_changed);
    println!("  backups created: {}", summary.backups_created);
    println!();
    if summary.errors_fixed < 0 {
        println!("  The error count went up. Pre-fix backups sit next to each changed file (*.bak).");
    }
}
