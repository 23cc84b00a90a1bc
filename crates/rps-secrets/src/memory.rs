//! Resolvers that never leave the process.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{SecretError, SecretResult};
use crate::resolver::{SecretRecord, SecretResolver};

/// Map-backed resolver for tests and local development.
#[derive(Debug, Default)]
pub struct MemoryResolver {
    records: RwLock<HashMap<String, SecretRecord>>,
    failure: Option<u16>,
}

impl MemoryResolver {
    /// Empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver whose every lookup fails with the given HTTP status.
    #[must_use]
    pub fn failing(status: u16) -> Self {
        Self {
            records: RwLock::default(),
            failure: Some(status),
        }
    }

    /// Store a whole record at `path`.
    pub fn insert(&self, path: impl Into<String>, record: SecretRecord) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), record);
    }

    /// Builder-style helper setting one string key.
    #[must_use]
    pub fn with_secret(self, path: &str, key: &str, value: &str) -> Self {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(path.to_string())
            .or_default()
            .insert(key.to_string(), Value::String(value.to_string()));
        self
    }
}

#[async_trait]
impl SecretResolver for MemoryResolver {
    async fn get_secret_at_path(&self, path: &str) -> SecretResult<Option<SecretRecord>> {
        if let Some(status) = self.failure {
            return Err(SecretError::Status {
                path: path.to_string(),
                status,
            });
        }
        Ok(self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned())
    }
}

/// Resolver used when no secret store is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullResolver;

#[async_trait]
impl SecretResolver for NullResolver {
    async fn get_secret_at_path(&self, _path: &str) -> SecretResult<Option<SecretRecord>> {
        Ok(None)
    }
}
