//! Connection pool shared by the ledger and graph stores.
//!
//! Queries are built at runtime (no compile-time checking), so building the
//! crate never needs a live database.

use std::time::Duration;

use caravan_core::config::InfrastructureConfig;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use crate::error::DbError;

/// How long a turn commit waits for a free connection.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Pooled connections to the Caravan database.
#[derive(Debug, Clone)]
pub struct PostgresPool {
    pool: PgPool,
}

impl PostgresPool {
    /// Open the database named by `infrastructure.postgres_url`.
    ///
    /// Returns `None` when no URL is configured; the caller then runs
    /// against the in-memory store.
    ///
    /// # Errors
    ///
    /// Same as [`PostgresPool::connect`].
    pub async fn open(config: &InfrastructureConfig) -> Result<Option<Self>, DbError> {
        let Some(url) = config.postgres_url.as_deref() else {
            return Ok(None);
        };
        Self::connect(url, config.max_connections).await.map(Some)
    }

    /// Connect to `url` with at most `max_connections` pooled connections.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if the URL cannot be parsed or the pool
    /// size is zero, or [`DbError::Postgres`] if the connection fails.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, DbError> {
        if max_connections == 0 {
            return Err(DbError::Config(String::from("max_connections must be at least 1")));
        }
        let options: PgConnectOptions = url
            .parse()
            .map_err(|e: sqlx::Error| DbError::Config(format!("Invalid database URL: {e}")))?;
        let host = options.get_host().to_owned();
        let database = options.get_database().map(str::to_owned);

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await?;

        tracing::info!(host, database = ?database, max_connections, "Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Create or upgrade the ledger and graph tables.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Migration`] if a migration fails.
    pub async fn run_migrations(&self) -> Result<(), DbError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Ledger schema up to date");
        Ok(())
    }

    /// The underlying [`PgPool`], for building stores.
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("PostgreSQL pool closed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_url_means_no_pool() {
        let config = InfrastructureConfig {
            postgres_url: None,
            max_connections: 5,
        };
        assert!(PostgresPool::open(&config).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_url_is_a_config_error() {
        let config = InfrastructureConfig {
            postgres_url: Some(String::from("not a url")),
            max_connections: 5,
        };
        assert!(matches!(PostgresPool::open(&config).await, Err(DbError::Config(_))));
    }

    #[tokio::test]
    async fn empty_pool_is_a_config_error() {
        let result = PostgresPool::connect("postgresql://localhost/caravan", 0).await;
        assert!(matches!(result, Err(DbError::Config(_))));
    }
}
