//! Typed configuration models.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

/// Complete service configuration assembled from the environment.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Relational store settings.
    pub database: DatabaseConfig,
    /// Secret store selection.
    pub secrets: SecretsConfig,
    /// Logging overrides.
    pub logging: LogSettings,
}

/// Postgres connection pool settings.
#[derive(Clone)]
pub struct DatabaseConfig {
    /// Connection string, including credentials.
    pub url: Url,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
    /// Time to wait for a pooled connection.
    pub acquire_timeout: Duration,
    /// TLS material; `None` keeps the driver defaults.
    pub tls: Option<DatabaseTls>,
}

impl DatabaseConfig {
    /// Connection string with any password replaced, safe for logs.
    #[must_use]
    pub fn redacted_url(&self) -> String {
        let mut url = self.url.clone();
        if url.password().is_some() {
            let _ = url.set_password(Some("***"));
        }
        url.to_string()
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("DatabaseConfig")
            .field("url", &self.redacted_url())
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .field("tls", &self.tls)
            .finish()
    }
}

/// TLS material used when connecting to Postgres.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseTls {
    /// Root certificate used to verify the server.
    pub ca_cert: Option<PathBuf>,
    /// Client certificate presented to the server.
    pub client_cert: Option<PathBuf>,
    /// Private key matching `client_cert`.
    pub client_key: Option<PathBuf>,
    /// Verify the server certificate and host name when `true`.
    pub reject_unauthorized: bool,
}

/// Secret store backing password and certificate lookups.
#[derive(Debug, Clone)]
pub enum SecretsConfig {
    /// No secret store; every lookup is absent.
    Disabled,
    /// HashiCorp Vault KV-v2.
    Vault(VaultConfig),
}

/// Vault connection settings.
#[derive(Clone)]
pub struct VaultConfig {
    /// Base address, e.g. `http://vault:8200`.
    pub address: Url,
    /// Access token sent as `X-Vault-Token`.
    pub token: String,
    /// Mount prefix prepended to every secret path, always `/`-terminated.
    pub secrets_path: String,
}

impl fmt::Debug for VaultConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("VaultConfig")
            .field("address", &self.address.as_str())
            .field("token", &"***")
            .field("secrets_path", &self.secrets_path)
            .finish()
    }
}

/// Logging overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Level directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Requested output format (`json` / `pretty`), if any.
    pub format: Option<String>,
}
