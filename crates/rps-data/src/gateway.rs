//! Pooled connection to Postgres with per-statement timing.
//!
//! Every statement goes through one of the helpers below so it is logged at
//! `debug` with its table, operation label, elapsed time, and row count.
//! Bound parameters are never logged.

use std::str::FromStr;
use std::time::Instant;

use rps_config::DatabaseConfig;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPoolOptions, PgRow, PgSslMode};
use sqlx::query::{Query, QueryAs, QueryScalar};
use sqlx::{FromRow, PgConnection, PgPool, Postgres, Transaction};
use tracing::debug;

use crate::error::{DataError, Result};

/// Statement with positional arguments.
pub type PgQuery<'q> = Query<'q, Postgres, PgArguments>;
/// Statement mapped onto a row type.
pub type PgQueryAs<'q, T> = QueryAs<'q, Postgres, T, PgArguments>;
/// Statement returning a single column.
pub type PgQueryScalar<'q, T> = QueryScalar<'q, Postgres, T, PgArguments>;

/// Shared handle to the connection pool. Cloning shares the pool.
#[derive(Clone, Debug)]
pub struct Gateway {
    pool: PgPool,
}

impl Gateway {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool using the service database settings.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::UnexpectedPersistence`] when the connection string
    /// is rejected or the first connection cannot be established.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let options = connect_options(config)
            .map_err(|source| DataError::unexpected("connect", "database", source))?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await
            .map_err(|source| DataError::unexpected("connect", "database", source))?;
        debug!(
            url = %config.redacted_url(),
            max_connections = config.max_connections,
            "database pool ready"
        );
        Ok(Self { pool })
    }

    /// Access the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Start a transaction on a pooled connection.
    ///
    /// # Errors
    ///
    /// Returns the driver error when no connection can be acquired.
    pub async fn begin(&self) -> std::result::Result<Transaction<'static, Postgres>, sqlx::Error> {
        self.pool.begin().await
    }

    /// Execute a statement on the pool, returning affected rows.
    ///
    /// # Errors
    ///
    /// Returns the driver error unchanged for classification by the caller.
    pub async fn execute(
        &self,
        table: &'static str,
        operation: &'static str,
        query: PgQuery<'_>,
    ) -> std::result::Result<u64, sqlx::Error> {
        let started = Instant::now();
        let rows = query.execute(&self.pool).await?.rows_affected();
        record(table, operation, started, rows);
        Ok(rows)
    }

    /// Execute a statement on an existing connection (usually a transaction).
    ///
    /// # Errors
    ///
    /// Returns the driver error unchanged for classification by the caller.
    pub async fn execute_on(
        &self,
        connection: &mut PgConnection,
        table: &'static str,
        operation: &'static str,
        query: PgQuery<'_>,
    ) -> std::result::Result<u64, sqlx::Error> {
        let started = Instant::now();
        let rows = query.execute(connection).await?.rows_affected();
        record(table, operation, started, rows);
        Ok(rows)
    }

    /// Fetch at most one mapped row.
    ///
    /// # Errors
    ///
    /// Returns the driver error unchanged for classification by the caller.
    pub async fn fetch_optional<T>(
        &self,
        table: &'static str,
        operation: &'static str,
        query: PgQueryAs<'_, T>,
    ) -> std::result::Result<Option<T>, sqlx::Error>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let started = Instant::now();
        let row = query.fetch_optional(&self.pool).await?;
        record(table, operation, started, u64::from(row.is_some()));
        Ok(row)
    }

    /// Fetch every mapped row.
    ///
    /// # Errors
    ///
    /// Returns the driver error unchanged for classification by the caller.
    pub async fn fetch_all<T>(
        &self,
        table: &'static str,
        operation: &'static str,
        query: PgQueryAs<'_, T>,
    ) -> std::result::Result<Vec<T>, sqlx::Error>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let started = Instant::now();
        let rows = query.fetch_all(&self.pool).await?;
        record(table, operation, started, rows.len() as u64);
        Ok(rows)
    }

    /// Fetch a single scalar, or `None` when the statement yields no row.
    ///
    /// # Errors
    ///
    /// Returns the driver error unchanged for classification by the caller.
    pub async fn fetch_scalar<T>(
        &self,
        table: &'static str,
        operation: &'static str,
        query: PgQueryScalar<'_, T>,
    ) -> std::result::Result<Option<T>, sqlx::Error>
    where
        T: Send + Unpin,
        (T,): for<'r> FromRow<'r, PgRow>,
    {
        let started = Instant::now();
        let value = query.fetch_optional(&self.pool).await?;
        record(table, operation, started, u64::from(value.is_some()));
        Ok(value)
    }
}

fn record(table: &'static str, operation: &'static str, started: Instant, rows: u64) {
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    debug!(table, operation, elapsed_ms, rows, "statement executed");
}

/// Build connection options, applying TLS material when configured.
///
/// # Errors
///
/// Returns the driver error when the URL is not a valid Postgres DSN.
pub fn connect_options(config: &DatabaseConfig) -> std::result::Result<PgConnectOptions, sqlx::Error> {
    let mut options = PgConnectOptions::from_str(config.url.as_str())?;
    if let Some(tls) = &config.tls {
        options = options.ssl_mode(ssl_mode(tls.reject_unauthorized));
        if let Some(path) = &tls.ca_cert {
            options = options.ssl_root_cert(path);
        }
        if let Some(path) = &tls.client_cert {
            options = options.ssl_client_cert(path);
        }
        if let Some(path) = &tls.client_key {
            options = options.ssl_client_key(path);
        }
    }
    Ok(options)
}

const fn ssl_mode(reject_unauthorized: bool) -> PgSslMode {
    if reject_unauthorized {
        PgSslMode::VerifyFull
    } else {
        PgSslMode::Require
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rps_config::DatabaseTls;
    use std::path::PathBuf;
    use std::time::Duration;

    fn database(tls: Option<DatabaseTls>) -> DatabaseConfig {
        DatabaseConfig {
            url: "postgres://rps:pw@db.internal:6543/rpsdb"
                .parse()
                .expect("valid url"),
            max_connections: 4,
            acquire_timeout: Duration::from_secs(3),
            tls,
        }
    }

    #[test]
    fn ssl_mode_follows_reject_unauthorized() {
        assert!(matches!(ssl_mode(true), PgSslMode::VerifyFull));
        assert!(matches!(ssl_mode(false), PgSslMode::Require));
    }

    #[test]
    fn connect_options_parse_url() {
        let options = connect_options(&database(None)).expect("options");
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_database(), Some("rpsdb"));
    }

    #[test]
    fn connect_options_accept_tls_material() {
        let tls = DatabaseTls {
            ca_cert: Some(PathBuf::from("/certs/ca.pem")),
            client_cert: Some(PathBuf::from("/certs/client.pem")),
            client_key: Some(PathBuf::from("/certs/client.key")),
            reject_unauthorized: false,
        };
        assert!(connect_options(&database(Some(tls))).is_ok());
    }
}
