//! `PostgreSQL` implementation of [`LedgerStore`].
//!
//! Each committed turn owns one row in `ledger_turns` and one row per city
//! in `city_ledgers`, holding the ledger's JSON blob. A commit deletes any
//! earlier commit of the same turn and writes the new rows in a single
//! transaction, so readers see either the whole turn or none of it.

use caravan_ledger::{LedgerBlobs, LedgerStore, StoreError};
use caravan_types::CityName;
use sqlx::PgPool;

use crate::error::DbError;

/// Ledger store backed by the `ledger_turns` and `city_ledgers` tables.
#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: PgPool,
}

impl PostgresLedgerStore {
    /// Create a ledger store over a connection pool.
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Read every ledger of `turn` inside one snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if a query fails.
    pub async fn fetch_turn(&self, turn: u64) -> Result<Option<LedgerBlobs>, DbError> {
        let turn_i64 = turn_to_db(turn)?;
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let committed: Option<i64> =
            sqlx::query_scalar("SELECT turn FROM ledger_turns WHERE turn = $1")
                .bind(turn_i64)
                .fetch_optional(&mut *tx)
                .await?;
        if committed.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let rows = sqlx::query_as::<_, CityLedgerRow>(
            r"SELECT turn, city, data, created_at
              FROM city_ledgers
              WHERE turn = $1
              ORDER BY city",
        )
        .bind(turn_i64)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::debug!(turn, cities = rows.len(), "Loaded turn from PostgreSQL");
        Ok(Some(
            rows.into_iter()
                .map(|row| (CityName::new(row.city), row.data))
                .collect(),
        ))
    }

    /// Replace every ledger of `turn` in one transaction.
    ///
    /// Ledgers are inserted with a single UNNEST statement.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::CorruptRow`] if the turn or city count does not
    /// fit its column, or [`DbError::Postgres`] if any statement fails. The
    /// transaction is rolled back and the previous state stays visible.
    pub async fn replace_turn(&self, turn: u64, ledgers: LedgerBlobs) -> Result<(), DbError> {
        let turn_i64 = turn_to_db(turn)?;
        let cities = city_count_to_db(ledgers.len())?;

        let mut names = Vec::with_capacity(ledgers.len());
        let mut blobs = Vec::with_capacity(ledgers.len());
        for (city, blob) in ledgers {
            names.push(city.into_inner());
            blobs.push(blob);
        }

        let mut tx = self.pool.begin().await?;

        // Cascades to city_ledgers.
        sqlx::query("DELETE FROM ledger_turns WHERE turn = $1")
            .bind(turn_i64)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO ledger_turns (turn, cities) VALUES ($1, $2)")
            .bind(turn_i64)
            .bind(cities)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r"INSERT INTO city_ledgers (turn, city, data)
              SELECT $1::BIGINT, city, data FROM UNNEST($2::TEXT[], $3::JSONB[]) AS t (city, data)",
        )
        .bind(turn_i64)
        .bind(&names)
        .bind(&blobs)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(turn, cities, "Committed turn to PostgreSQL");
        Ok(())
    }

    /// The most recent committed turn.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails, or
    /// [`DbError::CorruptRow`] if the stored turn is negative.
    pub async fn fetch_latest_turn(&self) -> Result<Option<u64>, DbError> {
        let latest: Option<i64> = sqlx::query_scalar("SELECT MAX(turn) FROM ledger_turns")
            .fetch_one(&self.pool)
            .await?;
        latest.map(turn_from_db).transpose()
    }

    /// Every stored ledger of one city, oldest turn first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn city_history(&self, city: &CityName) -> Result<Vec<CityLedgerRow>, DbError> {
        let rows = sqlx::query_as::<_, CityLedgerRow>(
            r"SELECT turn, city, data, created_at
              FROM city_ledgers
              WHERE city = $1
              ORDER BY turn",
        )
        .bind(city.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

impl LedgerStore for PostgresLedgerStore {
    async fn load_turn(&self, turn: u64) -> Result<Option<LedgerBlobs>, StoreError> {
        self.fetch_turn(turn).await.map_err(StoreError::from)
    }

    async fn commit_turn(&mut self, turn: u64, ledgers: LedgerBlobs) -> Result<(), StoreError> {
        self.replace_turn(turn, ledgers).await.map_err(StoreError::from)
    }

    async fn latest_turn(&self) -> Result<Option<u64>, StoreError> {
        self.fetch_latest_turn().await.map_err(StoreError::from)
    }
}

/// A row from the `city_ledgers` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CityLedgerRow {
    /// Turn the ledger was committed for.
    pub turn: i64,
    /// City owning the ledger.
    pub city: String,
    /// The ledger in its JSON wire shape.
    pub data: serde_json::Value,
    /// When the row was written.
    pub created_at: chrono::DateTime<chrono::Utc>,
}

fn turn_to_db(turn: u64) -> Result<i64, DbError> {
    i64::try_from(turn)
        .map_err(|e| DbError::CorruptRow(format!("turn {turn} exceeds BIGINT: {e}")))
}

fn turn_from_db(turn: i64) -> Result<u64, DbError> {
    u64::try_from(turn).map_err(|e| DbError::CorruptRow(format!("negative turn {turn}: {e}")))
}

fn city_count_to_db(cities: usize) -> Result<i32, DbError> {
    i32::try_from(cities)
        .map_err(|e| DbError::CorruptRow(format!("{cities} city ledgers exceed INT: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_city_count_is_rejected() {
        assert!(matches!(city_count_to_db(5), Ok(5)));
        assert!(matches!(
            city_count_to_db(usize::MAX),
            Err(DbError::CorruptRow(message)) if message.contains("exceed INT")
        ));
    }

    #[test]
    fn turn_conversion_rejects_out_of_range() {
        assert!(matches!(turn_to_db(7), Ok(7)));
        assert!(matches!(turn_to_db(u64::MAX), Err(DbError::CorruptRow(_))));
        assert!(matches!(turn_from_db(3), Ok(3)));
        assert!(matches!(turn_from_db(-1), Err(DbError::CorruptRow(_))));
    }
}
