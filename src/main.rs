//! CLI entry point for the phonecheck tool.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use phonecheck_core::config::load_config;
use phonecheck_core::lookup::RetryPolicy;
use phonecheck_core::store::ResumePolicy;
use phonecheck_core::{
    CsvStore, PHONE_NUMBER_COLUMN, Pipeline, PipelineConfig, RunPlan, RunSummary, read_input,
};
use tracing::{debug, error, info};

mod cli;
mod exit;

use cli::Args;
use exit::{ProcessExit, determine_exit_outcome};

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Logs go to stderr; stdout is reserved for the summary.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    match run(args).await {
        Ok(exit) => exit.into(),
        Err(err) => {
            error!(error = %err, "run aborted");
            eprintln!("Error: {err:?}");
            ProcessExit::Failure.into()
        }
    }
}

async fn run(args: Args) -> Result<ProcessExit> {
    let config = build_config(&args)?;
    info!(
        input = %args.input.display(),
        output = %args.output.display(),
        batch_size = config.batch_size,
        interval_ms = config.interval.as_millis(),
        "phonecheck starting"
    );

    let inputs = read_input(&args.input, PHONE_NUMBER_COLUMN)
        .with_context(|| format!("Failed to read input '{}'", args.input.display()))?;

    let lookup = config
        .lookup_client()
        .context("Failed to build lookup client")?;
    let interval = config.interval;
    let mut pipeline = Pipeline::new(config, lookup, CsvStore::new(&args.output));

    if args.dry_run {
        let plan = pipeline.plan(&inputs)?;
        report_plan(&args, &plan, interval)?;
        return Ok(ProcessExit::Success);
    }

    let summary = pipeline.run(&inputs).await?;
    report_summary(&args, &summary)?;

    Ok(determine_exit_outcome(
        summary.succeeded,
        summary.failed + summary.rejected,
    ))
}

/// Layers CLI flags over the config file over built-in defaults.
fn build_config(args: &Args) -> Result<PipelineConfig> {
    let file = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    let mut config = PipelineConfig::from_file(file)?;

    if let Some(batch_size) = args.batch_size {
        config.batch_size = usize::from(batch_size);
    }
    if let Some(secs) = args.timeout_secs {
        config.request_timeout = Duration::from_secs(secs);
    }
    if let Some(ms) = args.interval_ms {
        config.interval = Duration::from_millis(ms);
    }
    if let Some(max_attempts) = args.max_attempts {
        config.retry_policy = RetryPolicy::with_max_attempts(max_attempts);
    }
    if args.retry_failed {
        config.resume_policy = ResumePolicy::SuccessfulOnly;
    }
    Ok(config)
}

fn report_summary(args: &Args, summary: &RunSummary) -> Result<()> {
    if args.summary_json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else if !args.quiet {
        println!(
            "Looked up {} numbers: {} succeeded, {} failed. {} invalid, {} already done, {} blank. {} rows written to {}",
            summary.lookups(),
            summary.succeeded,
            summary.failed,
            summary.rejected,
            summary.skipped_duplicate,
            summary.skipped_blank,
            summary.rows_written,
            args.output.display()
        );
    }
    Ok(())
}

fn report_plan(args: &Args, plan: &RunPlan, interval: Duration) -> Result<()> {
    if args.summary_json {
        println!("{}", serde_json::to_string_pretty(plan)?);
        return Ok(());
    }
    if args.quiet {
        return Ok(());
    }
    println!(
        "Dry run: {} numbers to look up, {} invalid, {} already done, {} blank (estimated wait {}s)",
        plan.lookups.len(),
        plan.rejected,
        plan.skipped_duplicate,
        plan.skipped_blank,
        plan.estimated_wait(interval).as_secs()
    );
    for number in &plan.lookups {
        println!("  {number}");
    }
    Ok(())
}
