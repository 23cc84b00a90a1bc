//! The lookup contract shared by every secret backend.

use std::sync::Arc;

use async_trait::async_trait;
use rps_config::SecretsConfig;
use serde_json::{Map, Value};

use crate::error::SecretResult;
use crate::memory::NullResolver;
use crate::vault::VaultResolver;

/// Key/value record stored at one secret path.
pub type SecretRecord = Map<String, Value>;

/// Source of password and certificate material keyed by logical path.
#[async_trait]
pub trait SecretResolver: Send + Sync {
    /// Fetch the whole record stored at `path`; `None` when nothing is stored.
    async fn get_secret_at_path(&self, path: &str) -> SecretResult<Option<SecretRecord>>;

    /// Fetch one key of the record at `path` as a string.
    ///
    /// Non-string values are rendered as JSON; `null` counts as absent.
    async fn get_secret_from_key(&self, path: &str, key: &str) -> SecretResult<Option<String>> {
        let record = self.get_secret_at_path(path).await?;
        Ok(record.and_then(|mut record| match record.remove(key) {
            Some(Value::String(value)) => Some(value),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        }))
    }
}

/// Pick the resolver matching the service configuration.
///
/// # Errors
///
/// Returns an error when the Vault HTTP client cannot be constructed.
pub fn resolver_for(config: &SecretsConfig) -> SecretResult<Arc<dyn SecretResolver>> {
    Ok(match config {
        SecretsConfig::Disabled => Arc::new(NullResolver),
        SecretsConfig::Vault(vault) => Arc::new(VaultResolver::new(vault)?),
    })
}
