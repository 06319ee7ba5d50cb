use anyhow::{Context, Result};
use colored::Colorize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use sync_monitor::config::Config;
use sync_monitor::display::{DisplayMode, LogSink, PresentationSink, SharedSnapshot, TableSink, TableView};
use sync_monitor::notify::{LogNotifier, Notifier, NtfyNotifier};
use sync_monitor::rpc::HttpRpcClient;
use sync_monitor::sync::{Scheduler, SyncTracker};
use sync_monitor::utils;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging; the table view needs the terminal to itself
    match config.display {
        DisplayMode::Log => {
            utils::logger::init_logger();
            print_banner();
        }
        DisplayMode::Table => utils::logger::init_file_logger(&config.log_file)?,
    }
    info!("Starting sync monitor");

    // Log configuration settings
    utils::config_logger::log_config(&config);

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    match config.display {
        DisplayMode::Log => {
            let scheduler = build_scheduler(&config, Box::new(LogSink::new()))?;
            scheduler.run(shutdown).await;
        }
        DisplayMode::Table => {
            let snapshot = SharedSnapshot::default();
            let scheduler = build_scheduler(&config, Box::new(TableSink::new(snapshot.clone())))?;
            let view = TableView::new(snapshot, config.refresh_interval);

            let view_task = async {
                let result = view.run(shutdown.clone()).await;
                if result.is_err() {
                    // Without a view nothing would ever stop the poll loop
                    shutdown.cancel();
                }
                result
            };

            let ((), view_result) = tokio::join!(scheduler.run(shutdown.clone()), view_task);
            view_result.context("Table view failed")?;
        }
    }

    info!("Sync monitor shutdown gracefully");
    Ok(())
}

/// Wire the RPC client, notifier and tracker described by `config`
fn build_scheduler(config: &Config, sink: Box<dyn PresentationSink>) -> Result<Scheduler> {
    let rpc = HttpRpcClient::new(config.rpc_timeout)
        .context("Failed to create RPC client")?
        .with_methods(config.sync_method.clone(), config.health_method.clone());

    let notifier: Arc<dyn Notifier> = match &config.ntfy_topic {
        Some(topic) => Arc::new(
            NtfyNotifier::new(&config.ntfy_url, topic, config.notify_timeout)
                .context("Failed to create notifier")?,
        ),
        None => Arc::new(LogNotifier),
    };

    let tracker = SyncTracker::new(config.policy)
        .with_lag_tolerance(config.lag_tolerance)
        .with_seconds_per_block(config.seconds_per_block);

    Ok(Scheduler::new(config.nodes.clone(), Arc::new(rpc), notifier, sink, tracker)
        .with_poll_interval(config.poll_interval)
        .with_health(config.fetch_health))
}

/// Cancel `shutdown` on Ctrl+C or SIGTERM
async fn watch_signals(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
    shutdown.cancel();
}

fn print_banner() {
    println!("{}", "=".repeat(80).bright_blue());
    println!("{}", "NODE SYNC MONITOR".bold().bright_green());
    println!("{}", "Sync progress, ETA and synced notifications".bright_cyan());
    println!("{}", "=".repeat(80).bright_blue());
    println!();
}
