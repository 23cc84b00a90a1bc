//! Environment lookup for [`ServiceConfig`].

use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use crate::defaults;
use crate::error::{ConfigError, ConfigResult};
use crate::model::{
    DatabaseConfig, DatabaseTls, LogSettings, SecretsConfig, ServiceConfig, VaultConfig,
};
use crate::validate::{
    ensure_positive, normalize_secrets_path, parse_base_url, parse_bool, parse_u32, parse_u64,
    parse_url,
};

impl ServiceConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error when a required variable is missing or a value fails
    /// to parse.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns an error when a required variable is missing or a value fails
    /// to parse.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };
        let database = load_database(&env)?;
        let secrets = load_secrets(&env)?;
        let logging = LogSettings {
            level: env
                .get("LOG_LEVEL")
                .unwrap_or_else(|| defaults::LOG_LEVEL.to_string()),
            format: env.get("LOG_FORMAT"),
        };
        debug!(database = ?database, secrets = ?secrets, "service configuration loaded");
        Ok(Self {
            database,
            secrets,
            logging,
        })
    }
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|value| !value.trim().is_empty())
    }

    fn require(&self, name: &'static str) -> ConfigResult<String> {
        self.get(name).ok_or(ConfigError::MissingEnv { name })
    }
}

fn load_database<F>(env: &Env<F>) -> ConfigResult<DatabaseConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let url = parse_url("DATABASE_URL", &env.require("DATABASE_URL")?)?;
    let max_connections = match env.get("DATABASE_MAX_CONNECTIONS") {
        Some(value) => ensure_positive(
            "DATABASE_MAX_CONNECTIONS",
            parse_u32("DATABASE_MAX_CONNECTIONS", &value)?,
        )?,
        None => defaults::DATABASE_MAX_CONNECTIONS,
    };
    let acquire_timeout = match env.get("DATABASE_ACQUIRE_TIMEOUT_SECS") {
        Some(value) => parse_u64("DATABASE_ACQUIRE_TIMEOUT_SECS", &value)?,
        None => defaults::DATABASE_ACQUIRE_TIMEOUT_SECS,
    };

    let ca_cert = env.get("POSTGRES_SSL_CA").map(PathBuf::from);
    let client_cert = env.get("POSTGRES_SSL_CERT").map(PathBuf::from);
    let client_key = env.get("POSTGRES_SSL_KEY").map(PathBuf::from);
    let tls = if ca_cert.is_some() || client_cert.is_some() || client_key.is_some() {
        let reject_unauthorized = match env.get("POSTGRES_SSL_REJECT_UNAUTHORIZED") {
            Some(value) => parse_bool("POSTGRES_SSL_REJECT_UNAUTHORIZED", &value)?,
            None => defaults::POSTGRES_SSL_REJECT_UNAUTHORIZED,
        };
        Some(DatabaseTls {
            ca_cert,
            client_cert,
            client_key,
            reject_unauthorized,
        })
    } else {
        None
    };

    Ok(DatabaseConfig {
        url,
        max_connections,
        acquire_timeout: Duration::from_secs(acquire_timeout),
        tls,
    })
}

fn load_secrets<F>(env: &Env<F>) -> ConfigResult<SecretsConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(address) = env.get("VAULT_ADDRESS") else {
        return Ok(SecretsConfig::Disabled);
    };
    let address = parse_base_url("VAULT_ADDRESS", &address)?;
    let token = env.require("VAULT_TOKEN")?;
    let secrets_path = normalize_secrets_path(
        &env.get("SECRETS_PATH")
            .unwrap_or_else(|| defaults::SECRETS_PATH.to_string()),
    );
    Ok(SecretsConfig::Vault(VaultConfig {
        address,
        token,
        secrets_path,
    }))
}
