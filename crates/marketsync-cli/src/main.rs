mod cli;
mod commands;
mod error;
mod output;

use std::io;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use marketsync_core::{CancelSignal, UtcDateTime};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::cli::Cli;
use crate::error::CliError;
use crate::output::{Envelope, EnvelopeMeta, SCHEMA_VERSION};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

async fn run() -> Result<ExitCode, CliError> {
    let cli = Cli::parse();
    let started = Instant::now();

    let token = CancellationToken::new();
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("ctrl-c received, finishing the current item");
                ctrl_c_token.cancel();
            }
            Err(error) => warn!(%error, "cannot listen for ctrl-c"),
        }
    });

    let mut signal = CancelSignal::from_token(token);
    if let Some(secs) = cli.deadline_secs {
        signal = signal.with_timeout(Duration::from_secs(secs));
    }

    let result = commands::run(&cli, signal).await?;
    let envelope = Envelope {
        meta: EnvelopeMeta {
            request_id: Uuid::new_v4(),
            schema_version: SCHEMA_VERSION,
            command: cli.command.name(),
            generated_at: UtcDateTime::now(),
            latency_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            warnings: result.warnings,
        },
        data: result.data,
        errors: result.errors,
    };

    let stdout = io::stdout();
    output::render(&mut stdout.lock(), &envelope, cli.pretty)?;

    if !envelope.errors.is_empty() {
        return Ok(ExitCode::from(3));
    }
    Ok(ExitCode::SUCCESS)
}
