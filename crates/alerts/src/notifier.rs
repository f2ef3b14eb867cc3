//! Scheduled alert sweeps.

use crate::db::Database;
use crate::evaluator::{AlertEvaluator, Evaluation};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Telegram API error: {0}")]
    Api(#[from] teloxide::RequestError),
    #[error("Delivery rejected: {0}")]
    Rejected(String),
}

/// Destination for rendered alert messages.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Send one HTML message to a subscriber.
    async fn deliver(&self, subscriber_id: i64, text: &str) -> Result<(), DeliveryError>;
}

/// Configuration for the notifier.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Time between sweeps.
    pub interval: Duration,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
        }
    }
}

/// Totals for one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Complete watches evaluated
    pub checked: usize,
    /// Subscribers with at least one qualifying token
    pub alerted: usize,
    pub messages_sent: usize,
    /// Storage, provider and delivery faults
    pub failures: usize,
}

/// Summary line sent before a subscriber's cards.
pub fn sweep_header(count: usize, threshold: f64) -> String {
    format!(
        "🚨 <b>Price Alert!</b> Found {} tokens that meet your {}% threshold:",
        count, threshold
    )
}

/// Periodically evaluates every watch and pushes cards to subscribers.
pub struct Notifier {
    db: Database,
    evaluator: Arc<AlertEvaluator>,
    sink: Arc<dyn AlertSink>,
    config: NotifierConfig,
}

impl Notifier {
    /// Create a new notifier.
    pub fn new(
        db: Database,
        evaluator: Arc<AlertEvaluator>,
        sink: Arc<dyn AlertSink>,
        config: NotifierConfig,
    ) -> Self {
        Self {
            db,
            evaluator,
            sink,
            config,
        }
    }

    /// Sweep on every tick until `shutdown` flips to true or its sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            interval_secs = self.config.interval.as_secs(),
            "Alert sweep scheduler started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.run_sweep().await;
                    info!(
                        checked = report.checked,
                        alerted = report.alerted,
                        messages_sent = report.messages_sent,
                        failures = report.failures,
                        "Alert sweep complete"
                    );
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Alert sweep scheduler stopped");
                        break;
                    }
                }
            }
        }
    }

    /// Evaluate every complete watch once and deliver the results.
    pub async fn run_sweep(&self) -> SweepReport {
        let mut report = SweepReport::default();

        let watches = match self.db.list_all_watches().await {
            Ok(watches) => watches,
            Err(e) => {
                error!(error = %e, "Failed to load watches");
                report.failures += 1;
                return report;
            }
        };

        for watch in watches.iter().filter(|w| w.is_complete()) {
            report.checked += 1;
            let subscriber_id = watch.subscriber_id;

            let (threshold, cards) = match self.evaluator.evaluate_watch(watch).await {
                Ok(Evaluation::Alerts { threshold, cards }) if !cards.is_empty() => {
                    (threshold, cards)
                }
                Ok(_) => {
                    debug!(subscriber_id, "No alerts for subscriber");
                    continue;
                }
                Err(e) => {
                    warn!(subscriber_id, error = %e, "Failed to evaluate watch");
                    report.failures += 1;
                    continue;
                }
            };

            report.alerted += 1;
            let messages = std::iter::once(sweep_header(cards.len(), threshold))
                .chain(cards.into_iter().map(|card| card.text));

            for text in messages {
                match self.sink.deliver(subscriber_id, &text).await {
                    Ok(()) => report.messages_sent += 1,
                    Err(e) => {
                        // Remaining cards for this subscriber are dropped.
                        warn!(subscriber_id, error = %e, "Failed to deliver alert");
                        report.failures += 1;
                        break;
                    }
                }
            }
        }

        report
    }
}
