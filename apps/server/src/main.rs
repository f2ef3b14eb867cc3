//! Wallet Watch Bot - Headless Server
//!
//! Polls the market-data provider for every registered wallet and pushes
//! price alerts to Telegram subscribers.

mod config;

use clap::Parser;
use config::{AppConfig, ConfigError, Credentials};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use walletwatch_alerts::{
    AlertEvaluator, Database, DbError, EvaluatorConfig, Notifier, NotifierConfig, TelegramBot,
};
use walletwatch_provider::{BirdeyeClient, PriceWindow, ProviderConfig, ProviderError, RetryPolicy};

/// Wallet Watch Bot CLI
#[derive(Parser, Debug)]
#[command(name = "walletwatch-bot")]
#[command(about = "Wallet price-change alerts over Telegram", long_about = None)]
struct Args {
    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Seconds between background alert sweeps
    #[arg(long, default_value_t = 300)]
    interval_secs: u64,

    /// Timeout for an on-demand /alert check in seconds
    #[arg(long, default_value_t = 60)]
    alert_timeout_secs: u64,

    /// Provider request timeout in seconds
    #[arg(long, default_value_t = 15)]
    http_timeout_secs: u64,

    /// Provider retries after the first attempt
    #[arg(long, default_value_t = 3)]
    max_retries: u32,

    /// Price-change window: 1m, 5m, 30m, 1h, 2h, 4h, 6h, 8h, 12h, 24h
    #[arg(short, long, default_value = "5m")]
    window: PriceWindow,

    /// Directory for daily-rolling JSON log files
    #[arg(long)]
    log_dir: Option<String>,
}

#[derive(Debug, Error)]
enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Database error: {0}")]
    Db(#[from] DbError),
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Console logging, plus a JSON file layer when `log_dir` is set.
/// The returned guard must live until shutdown so buffered lines are flushed.
fn init_logging(level: &str, log_dir: Option<&str>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "walletwatch.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .json()
                .with_current_span(false)
                .with_span_list(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    if let Err(e) = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
    {
        eprintln!("Failed to set tracing subscriber: {e}");
    }

    guard
}

fn build_config(args: &Args) -> Result<(AppConfig, Credentials), ConfigError> {
    let mut config = AppConfig::default();
    config.log_level = args.log_level.clone();
    config.alerts.interval_secs = args.interval_secs;
    config.alerts.alert_timeout_secs = args.alert_timeout_secs;
    config.alerts.window = args.window;
    config.provider.http_timeout_secs = args.http_timeout_secs;
    config.provider.max_retries = args.max_retries;

    let lookup = |key: &str| std::env::var(key).ok();
    config.apply_env(lookup)?;
    let credentials = Credentials::from_env(lookup)?;
    Ok((config, credentials))
}

async fn run(config: AppConfig, credentials: Credentials) -> Result<(), StartupError> {
    let db = Database::connect(&config.database_url).await?;
    info!(database_url = %config.database_url, "Database ready");

    let provider = BirdeyeClient::new(&ProviderConfig {
        api_key: credentials.birdeye_api_key.clone(),
        chain: config.provider.chain,
        base_url: config.provider.base_url.clone(),
        timeout: Duration::from_secs(config.provider.http_timeout_secs),
        retry: RetryPolicy::new(300, 10_000, config.provider.max_retries),
    })?;

    let evaluator = Arc::new(AlertEvaluator::new(
        db.clone(),
        Arc::new(provider),
        config.wrapped_tokens.clone(),
        EvaluatorConfig {
            chain: config.provider.chain,
            window: config.alerts.window,
            holder_limit: config.alerts.holder_limit,
        },
    ));

    let bot = Arc::new(TelegramBot::new(
        &credentials.telegram_bot_token,
        db.clone(),
        evaluator.clone(),
        Duration::from_secs(config.alerts.alert_timeout_secs),
    ));

    let notifier = Arc::new(Notifier::new(
        db.clone(),
        evaluator,
        bot.clone(),
        NotifierConfig {
            interval: Duration::from_secs(config.alerts.interval_secs),
        },
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let notifier_rx = shutdown_rx.clone();
    let notifier_handle = tokio::spawn(async move {
        notifier.run(notifier_rx).await;
    });
    let bot_handle = tokio::spawn(bot.run(shutdown_rx));

    info!("Press Ctrl+C to stop...");
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
    }

    warn!("Shutdown signal received");
    let _ = shutdown_tx.send(true);

    // A sweep in progress finishes before the scheduler observes shutdown.
    if tokio::time::timeout(Duration::from_secs(30), notifier_handle)
        .await
        .is_err()
    {
        warn!("Alert sweep did not stop in time");
    }
    if tokio::time::timeout(Duration::from_secs(5), bot_handle)
        .await
        .is_err()
    {
        warn!("Telegram dispatcher did not stop in time");
    }

    db.close().await;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let _log_guard = init_logging(&args.log_level, args.log_dir.as_deref());

    let (config, credentials) = match build_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    info!("Wallet Watch Bot starting...");
    info!(
        chain = %config.provider.chain,
        window = %config.alerts.window,
        interval_secs = config.alerts.interval_secs,
        alert_timeout_secs = config.alerts.alert_timeout_secs,
        wrapped_tokens = config.wrapped_tokens.len(),
        "Configuration loaded"
    );

    match run(config, credentials).await {
        Ok(()) => {
            info!("Wallet Watch Bot stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}
