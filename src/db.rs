//! PostgreSQL session used for catalog introspection.

use crate::dictionary::extractor::{CatalogColumn, CatalogSource};
use crate::error::{Result, ResultExt as _};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Pool, Postgres};
use std::time::Duration;

/// Constraint-name suffix PostgreSQL gives primary keys by default.
pub const PRIMARY_KEY_SUFFIX: &str = "_pkey";

const LIST_TABLES_SQL: &str = "\
    SELECT table_name::text
    FROM information_schema.tables
    WHERE table_schema = $1
    ORDER BY table_name";

const LIST_COLUMNS_SQL: &str = "\
    SELECT column_name::text,
           data_type::text,
           (is_nullable = 'YES') AS is_nullable,
           column_default::text
    FROM information_schema.columns
    WHERE table_schema = $1
      AND table_name = $2
    ORDER BY ordinal_position";

const LIST_PRIMARY_KEYS_SQL: &str = "\
    SELECT column_name::text
    FROM information_schema.key_column_usage
    WHERE table_schema = $1
      AND table_name = $2
      AND right(constraint_name::text, length($3::text)) = $3::text
    ORDER BY ordinal_position";

/// A single-session connection to the database being documented.
pub struct DbClient {
    pool: Pool<Postgres>,
}

impl DbClient {
    /// Open the session.
    ///
    /// # Errors
    ///
    /// Returns `DictError::Database` if the server is unreachable, rejects
    /// the credentials, or does not answer within `timeout`.
    pub async fn connect(options: PgConnectOptions, timeout: Duration) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .acquire_timeout(timeout)
            .connect_with(options)
            .await
            .with_context(|| {
                format!(
                    "Failed to connect to PostgreSQL (timeout after {}s)",
                    timeout.as_secs()
                )
            })?;
        Ok(Self { pool })
    }

    /// Close the session, waiting for the connection to shut down.
    pub async fn close(self) {
        self.pool.close().await;
        tracing::debug!("Database session closed");
    }
}

impl CatalogSource for DbClient {
    async fn list_tables(&self, schema: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(LIST_TABLES_SQL)
            .bind(schema)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    async fn list_columns(&self, schema: &str, table: &str) -> Result<Vec<CatalogColumn>> {
        let rows: Vec<(String, String, bool, Option<String>)> = sqlx::query_as(LIST_COLUMNS_SQL)
            .bind(schema)
            .bind(table)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(name, data_type, is_nullable, default_value)| CatalogColumn {
                name,
                data_type,
                is_nullable,
                default_value,
            })
            .collect())
    }

    async fn list_primary_keys(&self, schema: &str, table: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(LIST_PRIMARY_KEYS_SQL)
            .bind(schema)
            .bind(table)
            .bind(PRIMARY_KEY_SUFFIX)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }
}
