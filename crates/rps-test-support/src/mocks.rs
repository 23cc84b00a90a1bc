//! In-memory repositories honouring the same contract as the Postgres ones.
//!
//! Useful for exercising callers (the export assembler, mostly) without a
//! database. Failures can be injected per operation.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rps_data::{
    AssociationEntry, AssociationRepository, DataError, DataResult, Entity, EntityRepository,
};

type Key = (String, String);

/// Map-backed [`EntityRepository`].
#[derive(Debug)]
pub struct MemoryRepository<E> {
    rows: Mutex<BTreeMap<Key, E>>,
    fail_reads: Mutex<bool>,
}

impl<E: Entity> MemoryRepository<E> {
    /// Empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(BTreeMap::new()),
            fail_reads: Mutex::new(false),
        }
    }

    /// Repository pre-populated with `rows`.
    #[must_use]
    pub fn with_rows(rows: impl IntoIterator<Item = E>) -> Self {
        let repo = Self::new();
        {
            let mut stored = repo.lock_rows();
            for row in rows {
                stored.insert(key(row.name(), row.tenant_id()), row);
            }
        }
        repo
    }

    /// Make every subsequent read fail with an unexpected persistence error.
    pub fn fail_reads(&self) {
        *self
            .fail_reads
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = true;
    }

    fn check_reads(&self, operation: &'static str) -> DataResult<()> {
        let failing = *self
            .fail_reads
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if failing {
            return Err(DataError::UnexpectedPersistence {
                operation,
                kind: E::KIND,
                source: sqlx::Error::PoolTimedOut,
            });
        }
        Ok(())
    }

    fn lock_rows(&self) -> MutexGuard<'_, BTreeMap<Key, E>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E: Entity> Default for MemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: Entity> EntityRepository<E> for MemoryRepository<E> {
    async fn count(&self, tenant_id: &str) -> DataResult<u64> {
        self.check_reads("count")?;
        let rows = self.lock_rows();
        Ok(rows.keys().filter(|(_, tenant)| tenant == tenant_id).count() as u64)
    }

    async fn list(&self, top: u32, skip: u32, tenant_id: &str) -> DataResult<Vec<E>> {
        self.check_reads("list")?;
        let rows = self.lock_rows();
        let mut matching: Vec<&E> = rows
            .values()
            .filter(|row| row.tenant_id() == tenant_id)
            .collect();
        matching.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(matching
            .into_iter()
            .skip(skip as usize)
            .take(top as usize)
            .cloned()
            .collect())
    }

    async fn get_by_name(&self, name: &str, tenant_id: &str) -> DataResult<Option<E>> {
        self.check_reads("get_by_name")?;
        Ok(self.lock_rows().get(&key(name, tenant_id)).cloned())
    }

    async fn exists(&self, name: &str, tenant_id: &str) -> DataResult<bool> {
        self.check_reads("exists")?;
        Ok(self.lock_rows().contains_key(&key(name, tenant_id)))
    }

    async fn insert(&self, entity: &E) -> DataResult<E> {
        let mut rows = self.lock_rows();
        let slot = key(entity.name(), entity.tenant_id());
        if rows.contains_key(&slot) {
            return Err(DataError::DuplicateKey {
                kind: E::KIND,
                name: entity.name().to_string(),
            });
        }
        rows.insert(slot, entity.clone());
        Ok(entity.clone())
    }

    async fn update(&self, entity: &E) -> DataResult<E> {
        let mut rows = self.lock_rows();
        match rows.get_mut(&key(entity.name(), entity.tenant_id())) {
            Some(row) => {
                *row = entity.clone();
                Ok(entity.clone())
            }
            None => Err(DataError::ConcurrencyConflict {
                kind: E::KIND,
                name: entity.name().to_string(),
                latest: None,
            }),
        }
    }

    async fn delete(&self, name: &str, tenant_id: &str) -> DataResult<bool> {
        Ok(self.lock_rows().remove(&key(name, tenant_id)).is_some())
    }
}

/// Map-backed [`AssociationRepository`].
#[derive(Debug)]
pub struct MemoryAssociations {
    kind: &'static str,
    edges: Mutex<BTreeMap<Key, Vec<AssociationEntry>>>,
}

impl MemoryAssociations {
    /// Empty association table for `kind`.
    #[must_use]
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            edges: Mutex::new(BTreeMap::new()),
        }
    }

    /// Seed the edges of one profile.
    #[must_use]
    pub fn with_profile(
        self,
        profile_name: &str,
        tenant_id: &str,
        entries: Vec<AssociationEntry>,
    ) -> Self {
        self.lock_edges().insert(key(profile_name, tenant_id), entries);
        self
    }

    fn lock_edges(&self) -> MutexGuard<'_, BTreeMap<Key, Vec<AssociationEntry>>> {
        self.edges.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl AssociationRepository for MemoryAssociations {
    fn kind(&self) -> &'static str {
        self.kind
    }

    async fn list_for_profile(
        &self,
        profile_name: &str,
        tenant_id: &str,
    ) -> DataResult<Vec<AssociationEntry>> {
        let mut entries = self
            .lock_edges()
            .get(&key(profile_name, tenant_id))
            .cloned()
            .unwrap_or_default();
        entries.sort_by_key(|entry| entry.priority);
        Ok(entries)
    }

    async fn replace_all(
        &self,
        entries: &[AssociationEntry],
        profile_name: &str,
        tenant_id: &str,
    ) -> DataResult<bool> {
        if entries.is_empty() {
            return Err(DataError::EmptyBatch { kind: self.kind });
        }
        self.lock_edges()
            .insert(key(profile_name, tenant_id), entries.to_vec());
        Ok(true)
    }

    async fn delete_for_profile(&self, profile_name: &str, tenant_id: &str) -> DataResult<bool> {
        Ok(self
            .lock_edges()
            .remove(&key(profile_name, tenant_id))
            .is_some_and(|entries| !entries.is_empty()))
    }
}

fn key(name: &str, tenant_id: &str) -> Key {
    (name.to_string(), tenant_id.to_string())
}
