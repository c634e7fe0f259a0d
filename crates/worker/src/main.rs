use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sqlsweep_core::QueryCatalog;
use sqlsweep_db::TdsConnectionFactory;
use sqlsweep_events::{LogNotifier, Notifier, Reporter, SlackNotifier, SnsNotifier};
use sqlsweep_worker::{NotifierConfig, Orchestrator, SweepJob, WorkerConfig};

/// Name shown in Slack failure attachments.
const APP_NAME: &str = "sqlsweep";

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "sqlsweep_worker=info,sqlsweep_db=info,sqlsweep_events=info".into()
            }),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();

    // --- Configuration ---
    let config = WorkerConfig::from_env().context("Invalid worker configuration")?;
    tracing::info!(
        instances = config.instances.len(),
        port = config.port,
        query_dir = %config.query_dir.display(),
        "Loaded worker configuration",
    );

    // --- Query catalog ---
    let catalog = QueryCatalog::load_dir(&config.query_dir, &config.discovery_script)
        .context("Failed to load query catalog")?;
    tracing::info!(
        discovery = catalog.discovery_name(),
        scripts = catalog.maintenance_count(),
        "Query catalog loaded",
    );

    // --- Notifier ---
    let notifier: Arc<dyn Notifier> = match &config.notifier {
        NotifierConfig::Sns { topic_arn } => Arc::new(SnsNotifier::from_env(topic_arn.clone()).await),
        NotifierConfig::Slack { webhook_url } => Arc::new(
            SlackNotifier::new(webhook_url.clone(), APP_NAME)
                .context("Failed to build Slack client")?,
        ),
        NotifierConfig::Log => Arc::new(LogNotifier::default()),
    };

    let orchestrator = Orchestrator::new(
        Arc::new(TdsConnectionFactory::new(config.port)),
        Arc::new(catalog),
        config.credentials.clone(),
    );
    let job = SweepJob::new(
        orchestrator,
        Reporter::new(notifier, config.subject.clone()),
        config.instances.clone(),
    );

    let Some(period) = config.interval else {
        let report = job.run_once().await;
        return Ok(if report.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    };

    // --- Scheduled sweeps ---
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            return;
        }
        tracing::info!("Received SIGINT (Ctrl-C), stopping after the current sweep");
        signal_cancel.cancel();
    });

    let completed = job.run_every(period, cancel).await;
    tracing::info!(completed, "Worker stopped");

    Ok(ExitCode::SUCCESS)
}
