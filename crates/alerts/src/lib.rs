//! Wallet price alerts.
//!
//! This crate provides:
//! - SQLite-based watch storage
//! - Alert evaluation against the market-data provider
//! - Alert card formatting
//! - Scheduled sweeps and the Telegram command surface

pub mod card;
pub mod config;
pub mod db;
pub mod evaluator;
pub mod format;
pub mod notifier;
pub mod telegram;

pub use card::{render_card, AlertCard, SecurityFlags, TokenSnapshot};
pub use config::WatchConfig;
pub use db::{Database, DbError};
pub use evaluator::{qualifies, AlertEvaluator, Evaluation, EvaluatorConfig, EvaluatorError};
pub use notifier::{AlertSink, DeliveryError, Notifier, NotifierConfig, SweepReport};
pub use telegram::{Command, TelegramBot, TelegramError};
