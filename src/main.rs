use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use gkedeploy_core::{Cli, GitCli, Logger, Operation, ProcessRunner, RunContext, StageRunner};
use tokio::sync::mpsc;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Returns whether every requested stage succeeded. Pipeline errors are
/// reported here; only unexpected internal failures escape as `Err`.
async fn run(cli: Cli, logger: Arc<Logger>) -> Result<bool> {
    let operation: Operation = cli.command.operation();
    let working_dir = cli
        .working_directory()
        .context("Failed to resolve working directory")?;

    tracing::debug!(%operation, config = %cli.config.display(), "starting");

    let context = match RunContext::build(&cli.config, &working_dir, &GitCli::new()).await {
        Ok(context) => context,
        Err(err) => {
            logger.error(&err.to_string());
            return Ok(false);
        }
    };

    let (step_tx, mut step_rx) = mpsc::unbounded_channel();
    let display_logger = logger.clone();
    let display_handle = tokio::spawn(async move {
        while let Some(update) = step_rx.recv().await {
            display_logger.handle_update(&update);
        }
    });

    let mut stage_runner = StageRunner::new(Arc::new(ProcessRunner::new()));
    let outcome = stage_runner.execute(operation, &context, &step_tx).await;

    drop(step_tx);
    display_handle.await.context("Output task panicked")?;

    logger.summary(&stage_runner.report());

    match outcome {
        Ok(_) => Ok(true),
        Err(err) => {
            logger.error(&err.to_string());
            Ok(false)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    init_tracing();
    let logger = Arc::new(Logger::new());

    match run(cli, logger.clone()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            logger.error(&format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}
