//! Database connection management

use sqlx::{PgPool, Postgres, Transaction, migrate::MigrateError, query};

/// Order writes need at least read-committed isolation; pin it rather than
/// trusting the server default.
const SET_ISOLATION_SQL: &str = "SET TRANSACTION ISOLATION LEVEL READ COMMITTED";

/// Shared handle to the order database.
#[derive(Debug, Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    /// Wrap a connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool, for reads that don't need a transaction.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Begin a read-committed transaction for an order write.
    ///
    /// # Errors
    ///
    /// Returns an error when starting the transaction or setting isolation fails.
    pub async fn begin_order_transaction(
        &self,
    ) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        query(SET_ISOLATION_SQL).execute(&mut *tx).await?;

        Ok(tx)
    }
}

/// Connect to `PostgreSQL`.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPool::connect(database_url).await
}

/// Apply pending migrations.
///
/// # Errors
///
/// Returns an error if a migration fails or the history doesn't match.
pub async fn migrate(pool: &PgPool) -> Result<(), MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}
