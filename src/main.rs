use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use filekeeper::{
    application::{
        builder::{ApplicationBuilder, FileLifecycle},
        expiration::SweepRun,
    },
    config::LogFormat,
    Config,
};

#[derive(Parser)]
#[command(name = "filekeeper", version, about = "File lifecycle manager")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the expiration sweeper until Ctrl-C
    Run,
    /// Run a single expiration sweep and print its summary
    SweepOnce,
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env();
    init_tracing(config.log_format);

    config
        .validate()
        .map_err(|e| anyhow!("Invalid configuration: {}", e))?;

    match cli.command {
        Command::Migrate => {
            ApplicationBuilder::new(config)
                .with_database()
                .await
                .map_err(|e| anyhow!(e))
                .context("Migration failed")?;
            info!("Migrations applied");
        }
        Command::SweepOnce => {
            let app = build(config).await?;
            match app.sweeper.sweep_once().await {
                SweepRun::Completed(result) => {
                    println!(
                        "candidates={} deleted={} already_gone={} skipped_malformed={} left_deleting={} errors={}",
                        result.candidates,
                        result.deleted,
                        result.already_gone,
                        result.skipped_malformed,
                        result.left_deleting,
                        result.errors.len()
                    );
                    for e in &result.errors {
                        println!("  {}", e);
                    }
                }
                SweepRun::SkippedInFlight => println!("sweep skipped: another sweep in flight"),
            }
        }
        Command::Run => {
            let app = build(config).await?;
            run(app).await;
        }
    }

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.with_thread_ids(true).init(),
    }
}

async fn build(config: Config) -> anyhow::Result<FileLifecycle> {
    info!("Starting filekeeper");

    ApplicationBuilder::new(config)
        .with_database()
        .await
        .map_err(|e| anyhow!(e))?
        .with_infrastructure()
        .await
        .map_err(|e| anyhow!(e))?
        .build()
        .map_err(|e| anyhow!(e))
}

async fn run(app: FileLifecycle) {
    let sweeper = tokio::spawn(Arc::clone(&app.sweeper).run());
    info!(
        interval_secs = app.sweeper.config().interval.as_secs(),
        retention_secs = app.sweeper.config().retention.as_secs(),
        "Expiration sweeper started"
    );

    let mut events = app.notifier.subscribe();
    let notifications = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => info!(
                    file_id = %event.file_id,
                    owner_id = %event.owner_id,
                    display_name = %event.display_name,
                    storage_key = %event.storage_key,
                    "Upload completed"
                ),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Notification subscriber lagged")
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }

    info!("Shutting down");
    sweeper.abort();
    notifications.abort();
}
