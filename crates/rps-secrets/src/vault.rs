//! HashiCorp Vault KV-v2 over HTTP.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use rps_config::VaultConfig;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{SecretError, SecretResult};
use crate::resolver::{SecretRecord, SecretResolver};

const TOKEN_HEADER: &str = "X-Vault-Token";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct KvEnvelope {
    data: KvData,
}

#[derive(Debug, Deserialize)]
struct KvData {
    #[serde(default)]
    data: Option<SecretRecord>,
}

/// Reads secrets from `{address}/v1/{secrets_path}{path}`.
///
/// Each `/`-separated segment of the logical path is percent-encoded on its
/// own; empty, `.` and `..` segments are refused.
#[derive(Clone)]
pub struct VaultResolver {
    client: reqwest::Client,
    address: Url,
    token: String,
    secrets_path: String,
}

impl VaultResolver {
    /// Build a resolver with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::Client`] if the TLS backend cannot initialise.
    pub fn new(config: &VaultConfig) -> SecretResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| SecretError::Client { source })?;
        Ok(Self::with_client(config, client))
    }

    /// Build a resolver around an existing client.
    #[must_use]
    pub fn with_client(config: &VaultConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            address: config.address.clone(),
            token: config.token.clone(),
            secrets_path: config.secrets_path.clone(),
        }
    }

    fn secret_url(&self, path: &str) -> SecretResult<Url> {
        let invalid = |reason| SecretError::InvalidPath {
            path: path.to_string(),
            reason,
        };
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        if segments.iter().any(|segment| matches!(*segment, "" | "." | "..")) {
            return Err(invalid("empty or relative segment"));
        }
        let mut url = self.address.clone();
        url.path_segments_mut()
            .map_err(|()| invalid("address cannot carry a path"))?
            .pop_if_empty()
            .push("v1")
            .extend(self.secrets_path.split('/').filter(|segment| !segment.is_empty()))
            .extend(segments);
        Ok(url)
    }
}

impl fmt::Debug for VaultResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultResolver")
            .field("address", &self.address.as_str())
            .field("secrets_path", &self.secrets_path)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SecretResolver for VaultResolver {
    #[instrument(skip(self))]
    async fn get_secret_at_path(&self, path: &str) -> SecretResult<Option<SecretRecord>> {
        let url = self.secret_url(path)?;
        let response = self
            .client
            .get(url)
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await
            .map_err(|source| SecretError::Transport { source })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!("secret path absent");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(SecretError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }
        let envelope: KvEnvelope =
            response
                .json()
                .await
                .map_err(|source| SecretError::Decode {
                    path: path.to_string(),
                    source,
                })?;
        Ok(envelope.data.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(address: &str, secrets_path: &str) -> VaultConfig {
        VaultConfig {
            address: Url::parse(address).expect("address"),
            token: "root".into(),
            secrets_path: secrets_path.into(),
        }
    }

    #[test]
    fn secret_url_joins_mount_and_path() {
        let resolver = VaultResolver::new(&config("http://vault:8200", "secret/data/"))
            .expect("resolver");
        assert_eq!(
            resolver.secret_url("/profiles/office").expect("url").as_str(),
            "http://vault:8200/v1/secret/data/profiles/office"
        );
    }

    #[test]
    fn address_base_path_is_kept() {
        let resolver = VaultResolver::new(&config("https://host/vault-proxy", "secret/data/"))
            .expect("resolver");
        assert_eq!(
            resolver.secret_url("certs/acme/corp").expect("url").as_str(),
            "https://host/vault-proxy/v1/secret/data/certs/acme/corp"
        );
    }

    #[test]
    fn segments_cannot_leave_the_mount() {
        let resolver = VaultResolver::new(&config("http://vault:8200", "secret/data/"))
            .expect("resolver");
        for path in ["profiles/../../sys/seal", "profiles/./office", "profiles//office", ""] {
            assert!(
                matches!(
                    resolver.secret_url(path),
                    Err(SecretError::InvalidPath { .. })
                ),
                "{path} accepted"
            );
        }
        assert_eq!(
            resolver
                .secret_url("profiles/acme/a%2Fb?x#y")
                .expect("url")
                .as_str(),
            "http://vault:8200/v1/secret/data/profiles/acme/a%252Fb%3Fx%23y"
        );
    }

    #[test]
    fn debug_hides_token() {
        let resolver = VaultResolver::new(&config("http://vault:8200", "kv/data/"))
            .expect("resolver");
        assert!(!format!("{resolver:?}").contains("root"));
    }
}
