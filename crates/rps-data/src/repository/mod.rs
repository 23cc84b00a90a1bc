//! Repository contracts and their Postgres implementations.
//!
//! Each entity table gets one [`PgRepository`] instance sharing the CRUD
//! algorithm; the two profile association tables get a
//! [`PgAssociationRepository`] each.

mod association;
mod entities;
mod pg;

use async_trait::async_trait;
use rps_events::{Event, EventBus};
use serde::Serialize;
use sqlx::FromRow;
use sqlx::postgres::PgRow;
use tracing::debug;

use crate::error::Result;
use crate::gateway::PgQuery;
use crate::model::AssociationEntry;

pub use association::{
    AssociationTable, PROXY_ASSOCIATIONS, PgAssociationRepository, WIRELESS_ASSOCIATIONS,
};
pub use pg::PgRepository;

/// Default page size for [`EntityRepository::list`].
pub const DEFAULT_TOP: u32 = 25;
/// Default offset for [`EntityRepository::list`].
pub const DEFAULT_SKIP: u32 = 0;

/// A row in another table that points at an entity by name.
///
/// Deletes are refused while any such row exists for the same tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    /// Referencing table.
    pub table: &'static str,
    /// Column holding the referenced name.
    pub column: &'static str,
}

/// Shape of a named, tenant-scoped row.
///
/// Every entity table has `name`, `tenant_id`, and `creation_date` columns;
/// [`Entity::COLUMNS`] lists the remaining mutable columns in the order
/// [`Entity::bind_columns`] binds them.
pub trait Entity:
    for<'r> FromRow<'r, PgRow> + Serialize + Clone + Send + Sync + Unpin + 'static
{
    /// Label used in errors and events.
    const KIND: &'static str;
    /// Backing table.
    const TABLE: &'static str;
    /// Mutable columns, excluding `name`, `tenant_id`, and `creation_date`.
    const COLUMNS: &'static [&'static str];
    /// Rows elsewhere that must not be orphaned by a delete.
    const REFERENCES: &'static [Reference];

    /// Name half of the key.
    fn name(&self) -> &str;

    /// Tenant half of the key.
    fn tenant_id(&self) -> &str;

    /// Bind [`Entity::COLUMNS`] in order.
    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q>;
}

/// CRUD over one entity kind, addressed by `(name, tenant_id)`.
#[async_trait]
pub trait EntityRepository<E>: Send + Sync {
    /// Number of rows owned by the tenant; `0` when there are none.
    async fn count(&self, tenant_id: &str) -> Result<u64>;

    /// One page of rows ordered by name.
    async fn list(&self, top: u32, skip: u32, tenant_id: &str) -> Result<Vec<E>>;

    /// Fetch a row; absence is not an error.
    async fn get_by_name(&self, name: &str, tenant_id: &str) -> Result<Option<E>>;

    /// Presence check without fetching the row.
    async fn exists(&self, name: &str, tenant_id: &str) -> Result<bool>;

    /// Insert and return the stored row, including its creation timestamp.
    async fn insert(&self, entity: &E) -> Result<E>;

    /// Replace the mutable columns and return the stored row.
    ///
    /// Callers check existence first: a write that matches nothing is
    /// reported as a concurrency conflict.
    async fn update(&self, entity: &E) -> Result<E>;

    /// Delete unless referenced; `false` when the row did not exist.
    async fn delete(&self, name: &str, tenant_id: &str) -> Result<bool>;
}

/// Ordered profile edges to wireless or proxy configurations.
#[async_trait]
pub trait AssociationRepository: Send + Sync {
    /// Label of the referenced kind (`Wireless`, `Proxy`).
    fn kind(&self) -> &'static str;

    /// Edges for a profile ordered by ascending priority.
    async fn list_for_profile(
        &self,
        profile_name: &str,
        tenant_id: &str,
    ) -> Result<Vec<AssociationEntry>>;

    /// Replace every edge for a profile with `entries`.
    ///
    /// An empty slice is rejected so a caller cannot clear a profile by
    /// accident; use [`AssociationRepository::delete_for_profile`] instead.
    async fn replace_all(
        &self,
        entries: &[AssociationEntry],
        profile_name: &str,
        tenant_id: &str,
    ) -> Result<bool>;

    /// Remove every edge for a profile; `true` when any row was removed.
    async fn delete_for_profile(&self, profile_name: &str, tenant_id: &str) -> Result<bool>;
}

pub(crate) fn announce(events: &EventBus, event: Event) {
    if let Err(err) = events.try_publish(event) {
        debug!(
            event_id = err.event_id(),
            event_kind = err.event_kind(),
            "event published without subscribers"
        );
    }
}
