//! SQLite database for subscriber watches.

use crate::config::WatchConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Database connection for watches.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

impl Database {
    /// Connect to SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self, DbError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        // Every in-memory connection is its own database; keep exactly one alive.
        let pool = if is_memory_url(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Run database migrations.
    async fn run_migrations(&self) -> Result<(), DbError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS wallet (
                subscriber_id INTEGER PRIMARY KEY,
                wallet_address TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS price_watch (
                subscriber_id INTEGER PRIMARY KEY,
                threshold REAL NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Set the wallet for a subscriber, replacing any previous one.
    pub async fn upsert_wallet(&self, subscriber_id: i64, address: &str) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO wallet (subscriber_id, wallet_address)
            VALUES (?, ?)
            ON CONFLICT(subscriber_id)
            DO UPDATE SET wallet_address = excluded.wallet_address, updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(subscriber_id)
        .bind(address)
        .execute(&self.pool)
        .await?;

        debug!(subscriber_id, "Wallet stored");
        Ok(())
    }

    /// Set the threshold for a subscriber, replacing any previous one.
    pub async fn upsert_threshold(&self, subscriber_id: i64, threshold: f64) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO price_watch (subscriber_id, threshold)
            VALUES (?, ?)
            ON CONFLICT(subscriber_id)
            DO UPDATE SET threshold = excluded.threshold, updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(subscriber_id)
        .bind(threshold)
        .execute(&self.pool)
        .await?;

        debug!(subscriber_id, threshold, "Threshold stored");
        Ok(())
    }

    /// Wallet and threshold for one subscriber. `None` if neither was ever set.
    pub async fn get_watch(&self, subscriber_id: i64) -> Result<Option<WatchConfig>, DbError> {
        let row = sqlx::query_as::<_, (i64, Option<String>, Option<f64>)>(
            r#"
            SELECT ids.subscriber_id, w.wallet_address, p.threshold
            FROM (
                SELECT subscriber_id FROM wallet WHERE subscriber_id = ?
                UNION
                SELECT subscriber_id FROM price_watch WHERE subscriber_id = ?
            ) AS ids
            LEFT JOIN wallet w ON w.subscriber_id = ids.subscriber_id
            LEFT JOIN price_watch p ON p.subscriber_id = ids.subscriber_id
            "#,
        )
        .bind(subscriber_id)
        .bind(subscriber_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(subscriber_id, wallet_address, threshold)| WatchConfig {
            subscriber_id,
            wallet_address,
            threshold,
        }))
    }

    /// Every subscriber with at least one record, ordered by ID.
    pub async fn list_all_watches(&self) -> Result<Vec<WatchConfig>, DbError> {
        let rows = sqlx::query_as::<_, (i64, Option<String>, Option<f64>)>(
            r#"
            SELECT ids.subscriber_id, w.wallet_address, p.threshold
            FROM (
                SELECT subscriber_id FROM wallet
                UNION
                SELECT subscriber_id FROM price_watch
            ) AS ids
            LEFT JOIN wallet w ON w.subscriber_id = ids.subscriber_id
            LEFT JOIN price_watch p ON p.subscriber_id = ids.subscriber_id
            ORDER BY ids.subscriber_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(subscriber_id, wallet_address, threshold)| WatchConfig {
                subscriber_id,
                wallet_address,
                threshold,
            })
            .collect())
    }

    /// Close the pool. Later queries fail with a storage error.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_unknown_subscriber() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        assert_eq!(db.get_watch(123456).await.unwrap(), None);
        assert!(db.list_all_watches().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_last_write_wins() {
        let db = Database::connect("sqlite::memory:").await.unwrap();

        db.upsert_wallet(7, "WalletA").await.unwrap();
        db.upsert_wallet(7, "WalletA").await.unwrap();
        db.upsert_threshold(7, 2.5).await.unwrap();

        let watch = db.get_watch(7).await.unwrap().unwrap();
        assert_eq!(watch.wallet_address.as_deref(), Some("WalletA"));
        assert_eq!(watch.threshold, Some(2.5));

        db.upsert_wallet(7, "WalletB").await.unwrap();
        db.upsert_threshold(7, 10.0).await.unwrap();

        let watch = db.get_watch(7).await.unwrap().unwrap();
        assert_eq!(
            watch,
            WatchConfig {
                subscriber_id: 7,
                wallet_address: Some("WalletB".to_string()),
                threshold: Some(10.0),
            }
        );
        assert_eq!(db.list_all_watches().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_partial_watches_listed() {
        let db = Database::connect("sqlite::memory:").await.unwrap();

        db.upsert_threshold(30, 1.0).await.unwrap();
        db.upsert_wallet(10, "OnlyWallet").await.unwrap();
        db.upsert_wallet(20, "Shared").await.unwrap();
        db.upsert_wallet(40, "Shared").await.unwrap();
        db.upsert_threshold(20, 5.0).await.unwrap();

        let watches = db.list_all_watches().await.unwrap();
        let ids: Vec<i64> = watches.iter().map(|w| w.subscriber_id).collect();
        assert_eq!(ids, vec![10, 20, 30, 40]);

        assert!(!watches[0].is_complete());
        assert!(watches[1].is_complete());
        assert_eq!(watches[2].wallet_address, None);
        assert_eq!(watches[2].threshold, Some(1.0));

        let only_threshold = db.get_watch(30).await.unwrap().unwrap();
        assert!(!only_threshold.is_complete());
    }
}
