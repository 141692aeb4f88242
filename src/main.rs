use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod generator;
mod messaging;
mod metrics;
mod models;
mod publisher;

use config::{Cli, ProducerConfig};
use generator::{OrderGenerator, ReferenceData};
use messaging::{FaultInjectingSink, KafkaSink, OrderSink};
use publisher::{LoopSettings, Publisher, RunSummary};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug order_producer --count 5
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,order_producer=debug")),
        )
        .init();

    let config = Cli::parse().into_config().context("Invalid configuration")?;

    tracing::info!("🚀 Starting Kafka order producer");
    tracing::info!(brokers = %config.kafka.bootstrap_servers(), "Brokers");
    tracing::info!(topic = %config.topic, "Topic");
    tracing::info!(count = config.count, "Message count");
    tracing::info!(delay_secs = config.delay.as_secs_f64(), "Delay between messages");
    tracing::info!("Order IDs will be: b1, b2, b3, ..., b{}", config.count);

    let metrics = Arc::new(metrics::Metrics::new()?);
    if let Some(port) = config.metrics_port {
        metrics::spawn_metrics_server(metrics.registry().clone(), port);
    }

    let sink = KafkaSink::new(config.kafka.clone()).context("Failed to create Kafka producer")?;
    sink.probe().await.context("Kafka brokers unreachable")?;

    if config.create_topic {
        sink.ensure_topic(&config.topic, config.partitions)
            .await
            .context("Failed to create topic")?;
    }

    let tables = ReferenceData::default();
    let mut generator = match config.seed {
        Some(seed) => OrderGenerator::seeded(tables, seed)?,
        None => OrderGenerator::from_entropy(tables)?,
    };

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    let summary = if config.fail_on.is_empty() {
        run(sink, &config, metrics, &mut generator, &shutdown).await
    } else {
        tracing::warn!(fail_on = ?config.fail_on, "Fault injection enabled");
        let sink = FaultInjectingSink::new(sink, config.fail_on.iter().copied());
        run(sink, &config, metrics, &mut generator, &shutdown).await
    };

    if let (Some(first), Some(last)) = (summary.order_uids.first(), summary.order_uids.last()) {
        tracing::info!(first = %first, last = %last, "Published order id range");
    }

    if summary.interrupted {
        tracing::info!("🛑 Interrupted by user");
    } else {
        tracing::info!("🎉 Done");
    }

    Ok(())
}

async fn run<S: OrderSink>(
    sink: S,
    config: &ProducerConfig,
    metrics: Arc<metrics::Metrics>,
    generator: &mut OrderGenerator,
    shutdown: &CancellationToken,
) -> RunSummary {
    let settings = LoopSettings {
        topic: config.topic.clone(),
        count: config.count,
        delay: config.delay,
        flush_timeout: config.flush_timeout,
    };

    Publisher::new(sink, settings, metrics)
        .run(generator, shutdown)
        .await
}

/// Cancel the run once a shutdown signal arrives. A listener that cannot
/// be installed leaves the run going.
async fn cancel_on_signal<F>(signal: F, shutdown: CancellationToken)
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            tracing::info!("Shutdown signal received");
            shutdown.cancel();
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install signal handler, Ctrl-C will not stop the run");
        }
    }
}

async fn watch_signals(shutdown: CancellationToken) {
    cancel_on_signal(shutdown_signal(), shutdown).await;
}

/// Ctrl-C or SIGTERM.
#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(terminate) => terminate,
        Err(e) => {
            tracing::warn!(error = %e, "Cannot listen for SIGTERM, Ctrl-C only");
            return tokio::signal::ctrl_c().await;
        }
    };

    tokio::select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, "Cannot listen for Ctrl-C, SIGTERM only");
                terminate.recv().await;
                Ok(())
            }
        },
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
