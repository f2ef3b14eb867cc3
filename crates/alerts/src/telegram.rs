//! Telegram bot handlers.

use crate::config::WatchConfig;
use crate::db::{Database, DbError};
use crate::evaluator::{AlertEvaluator, Evaluation, EvaluatorError};
use crate::notifier::{AlertSink, DeliveryError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::command::BotCommands;
use teloxide::utils::html::escape;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("Telegram API error: {0}")]
    Api(#[from] teloxide::RequestError),
}

/// Bot commands.
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot")]
    Start,
    #[command(description = "Show help")]
    Help,
    #[command(description = "Register wallet and threshold. Usage: /setup <wallet> <threshold>")]
    Setup(String),
    #[command(description = "Change the watched wallet. Usage: /wallet <address>")]
    Wallet(String),
    #[command(description = "Change the threshold in percent. Usage: /threshold 5")]
    Threshold(String),
    #[command(description = "Show current configuration")]
    Config,
    #[command(description = "Check your wallet for price alerts now")]
    Alert,
}

// Replies are sent as HTML, so placeholders are written as entities.
pub const SETUP_USAGE: &str =
    "Usage: /setup &lt;wallet&gt; &lt;threshold&gt;\nExample: /setup 7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU 5";
pub const NOT_CONFIGURED_REPLY: &str =
    "Please setup your wallet and threshold first! Use /setup &lt;wallet&gt; &lt;threshold&gt;";
pub const TIMEOUT_REPLY: &str = "Checking your wallet took too long. Please try again later.";

const MAX_WALLET_LEN: usize = 64;

/// Validate a wallet address argument.
pub fn parse_wallet(arg: &str) -> Result<String, String> {
    let wallet = arg.trim();
    if wallet.is_empty() {
        return Err("Usage: /wallet &lt;address&gt;".to_string());
    }
    if wallet.len() > MAX_WALLET_LEN || !wallet.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(format!("'{}' is not a valid wallet address", escape(wallet)));
    }
    Ok(wallet.to_string())
}

/// Parse a percentage threshold; a trailing `%` is accepted.
pub fn parse_threshold(arg: &str) -> Result<f64, String> {
    let value = arg.trim().trim_end_matches('%').trim();
    if value.is_empty() {
        return Err("Usage: /threshold &lt;percent&gt;\nExample: /threshold 5".to_string());
    }
    match value.parse::<f64>() {
        Ok(threshold) if threshold.is_finite() => Ok(threshold),
        _ => Err(format!("'{}' is not a valid threshold", escape(value))),
    }
}

/// Parse `/setup <wallet> <threshold>`.
pub fn parse_setup_args(args: &str) -> Result<(String, f64), String> {
    let parts: Vec<&str> = args.split_whitespace().collect();
    let [wallet, threshold] = parts.as_slice() else {
        return Err(SETUP_USAGE.to_string());
    };
    Ok((parse_wallet(wallet)?, parse_threshold(threshold)?))
}

/// Current configuration as shown by `/config`.
pub fn format_watch(watch: Option<&WatchConfig>) -> String {
    let wallet = watch
        .and_then(|w| w.wallet_address.as_deref())
        .map(|w| format!("<code>{}</code>", escape(w)))
        .unwrap_or_else(|| "Not set".to_string());
    let threshold = watch
        .and_then(|w| w.threshold)
        .map(|t| format!("{}%", t))
        .unwrap_or_else(|| "Not set".to_string());
    let status = if watch.is_some_and(WatchConfig::is_complete) {
        "Active"
    } else {
        "Incomplete"
    };

    format!(
        "<b>Current Configuration</b>\n\n\
         Status: {}\n\
         Wallet: {}\n\
         Threshold: {}",
        status, wallet, threshold
    )
}

fn storage_error_reply(action: &str, subscriber_id: i64, err: &DbError) -> String {
    warn!(subscriber_id, error = %err, "Error {}", action);
    format!("Error {}: {}", action, escape(&err.to_string()))
}

/// Store `/setup` arguments and build the reply.
pub async fn setup_reply(db: &Database, subscriber_id: i64, args: &str) -> String {
    let (wallet, threshold) = match parse_setup_args(args) {
        Ok(parsed) => parsed,
        Err(usage) => return usage,
    };
    let stored = match db.upsert_wallet(subscriber_id, &wallet).await {
        Ok(()) => db.upsert_threshold(subscriber_id, threshold).await,
        Err(e) => Err(e),
    };
    match stored {
        Ok(()) => {
            info!(subscriber_id, threshold, "Watch registered");
            format!(
                "Watching wallet <code>{}</code> with threshold {}%",
                escape(&wallet),
                threshold
            )
        }
        Err(e) => storage_error_reply("setting up wallet", subscriber_id, &e),
    }
}

pub async fn wallet_reply(db: &Database, subscriber_id: i64, arg: &str) -> String {
    let wallet = match parse_wallet(arg) {
        Ok(wallet) => wallet,
        Err(usage) => return usage,
    };
    match db.upsert_wallet(subscriber_id, &wallet).await {
        Ok(()) => format!("Wallet set to <code>{}</code>", escape(&wallet)),
        Err(e) => storage_error_reply("updating wallet", subscriber_id, &e),
    }
}

pub async fn threshold_reply(db: &Database, subscriber_id: i64, arg: &str) -> String {
    let threshold = match parse_threshold(arg) {
        Ok(threshold) => threshold,
        Err(usage) => return usage,
    };
    match db.upsert_threshold(subscriber_id, threshold).await {
        Ok(()) => format!("Threshold set to {}%", threshold),
        Err(e) => storage_error_reply("updating threshold", subscriber_id, &e),
    }
}

pub async fn config_reply(db: &Database, subscriber_id: i64) -> String {
    match db.get_watch(subscriber_id).await {
        Ok(watch) => format_watch(watch.as_ref()),
        Err(e) => storage_error_reply("loading configuration", subscriber_id, &e),
    }
}

/// Messages answering an on-demand check, in sending order. Never empty.
pub fn evaluation_replies(outcome: Result<Evaluation, EvaluatorError>) -> Vec<String> {
    match outcome {
        Ok(Evaluation::NotConfigured) => vec![NOT_CONFIGURED_REPLY.to_string()],
        Ok(Evaluation::NoTokens { wallet }) => vec![format!(
            "No tokens found in wallet <code>{}</code>.",
            escape(&wallet)
        )],
        Ok(Evaluation::Alerts { threshold, cards }) if cards.is_empty() => {
            vec![format!("No tokens found that met threshold {}%!", threshold)]
        }
        Ok(Evaluation::Alerts { cards, .. }) => {
            let mut replies = Vec::with_capacity(cards.len() + 1);
            replies.push(format!(
                "Found {} tokens that meet your threshold!",
                cards.len()
            ));
            replies.extend(cards.into_iter().map(|card| card.text));
            replies
        }
        Err(e) => vec![format!(
            "Error occurred while getting token alerts: {}",
            escape(&e.to_string())
        )],
    }
}

/// Telegram bot wrapper.
pub struct TelegramBot {
    bot: Bot,
    db: Database,
    evaluator: Arc<AlertEvaluator>,
    alert_timeout: Duration,
}

impl TelegramBot {
    /// Create a new bot with the given token.
    pub fn new(
        token: &str,
        db: Database,
        evaluator: Arc<AlertEvaluator>,
        alert_timeout: Duration,
    ) -> Self {
        let bot = Bot::new(token);
        Self {
            bot,
            db,
            evaluator,
            alert_timeout,
        }
    }

    /// Get the underlying bot for sending messages.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    async fn send_html(&self, chat_id: ChatId, text: &str) -> Result<(), teloxide::RequestError> {
        self.bot
            .send_message(chat_id, text)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }

    /// Run the command dispatcher until `shutdown` flips to true.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let bot = self.bot.clone();
        let handler = Update::filter_message().filter_command::<Command>().endpoint(
            move |msg: Message, cmd: Command| {
                let this = Arc::clone(&self);
                async move { this.handle_command(msg, cmd).await }
            },
        );

        let mut dispatcher = Dispatcher::builder(bot, handler)
            .default_handler(|_| async {})
            .build();

        let token = dispatcher.shutdown_token();
        tokio::spawn(async move {
            while !*shutdown.borrow() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
            match token.shutdown() {
                Ok(done) => done.await,
                Err(e) => debug!(error = %e, "Dispatcher was not running"),
            }
        });

        info!("Telegram dispatcher started");
        dispatcher.dispatch().await;
        info!("Telegram dispatcher stopped");
    }

    async fn handle_command(&self, msg: Message, cmd: Command) -> Result<(), TelegramError> {
        let chat_id = msg.chat.id;
        let subscriber_id = chat_id.0;
        debug!(subscriber_id, command = ?cmd, "Command received");

        match cmd {
            Command::Start => {
                let text = format!(
                    "Welcome to the Wallet Watch bot!\n\n\
                     Register a wallet and a price-change threshold with /setup \
                     and you will get an alert card for every token in the wallet \
                     that moves at least that much.\n\n{}",
                    Command::descriptions()
                );
                self.bot.send_message(chat_id, text).await?;
            }

            Command::Help => {
                self.bot
                    .send_message(chat_id, Command::descriptions().to_string())
                    .await?;
            }

            Command::Setup(args) => {
                let reply = setup_reply(&self.db, subscriber_id, &args).await;
                self.send_html(chat_id, &reply).await?;
            }

            Command::Wallet(arg) => {
                let reply = wallet_reply(&self.db, subscriber_id, &arg).await;
                self.send_html(chat_id, &reply).await?;
            }

            Command::Threshold(arg) => {
                let reply = threshold_reply(&self.db, subscriber_id, &arg).await;
                self.send_html(chat_id, &reply).await?;
            }

            Command::Config => {
                let reply = config_reply(&self.db, subscriber_id).await;
                self.send_html(chat_id, &reply).await?;
            }

            Command::Alert => {
                self.bot
                    .send_message(chat_id, "Checking your wallet...")
                    .await?;

                let replies = match tokio::time::timeout(
                    self.alert_timeout,
                    self.evaluator.evaluate(subscriber_id),
                )
                .await
                {
                    Ok(outcome) => {
                        if let Err(e) = &outcome {
                            warn!(subscriber_id, error = %e, "On-demand alert check failed");
                        }
                        evaluation_replies(outcome)
                    }
                    Err(_) => {
                        warn!(subscriber_id, "On-demand alert check timed out");
                        vec![TIMEOUT_REPLY.to_string()]
                    }
                };

                for reply in replies {
                    self.send_html(chat_id, &reply).await?;
                }
            }
        }

        Ok(())
    }
}

#[async_trait]
impl AlertSink for TelegramBot {
    async fn deliver(&self, subscriber_id: i64, text: &str) -> Result<(), DeliveryError> {
        self.send_html(ChatId(subscriber_id), text).await?;
        Ok(())
    }
}
