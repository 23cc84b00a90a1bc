use async_trait::async_trait;
use rps_events::{Event, EventBus};
use sqlx::{Postgres, QueryBuilder};
use tracing::{info, instrument};

use crate::classify::{REPLACE_VIOLATIONS, Subject, classify};
use crate::error::{DataError, Result};
use crate::gateway::Gateway;
use crate::model::AssociationEntry;

use super::{AssociationRepository, announce};

/// Layout of a profile association table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssociationTable {
    /// Label of the referenced kind.
    pub kind: &'static str,
    /// Backing table.
    pub table: &'static str,
    /// Column holding the referenced configuration name.
    pub target_column: &'static str,
}

/// Profile to wireless configuration edges.
pub const WIRELESS_ASSOCIATIONS: AssociationTable = AssociationTable {
    kind: "Wireless",
    table: "profiles_wirelessconfigs",
    target_column: "wireless_profile_name",
};

/// Profile to proxy configuration edges.
pub const PROXY_ASSOCIATIONS: AssociationTable = AssociationTable {
    kind: "Proxy",
    table: "profiles_proxyconfigs",
    target_column: "proxy_config_name",
};

/// Postgres-backed [`AssociationRepository`].
#[derive(Debug)]
pub struct PgAssociationRepository {
    gateway: Gateway,
    events: EventBus,
    layout: AssociationTable,
    list_sql: String,
    delete_sql: String,
    insert_prefix: String,
}

impl PgAssociationRepository {
    /// Build a repository for one association table.
    #[must_use]
    pub fn new(gateway: Gateway, events: EventBus, layout: AssociationTable) -> Self {
        let AssociationTable {
            table,
            target_column,
            ..
        } = layout;
        Self {
            gateway,
            events,
            layout,
            list_sql: format!(
                "SELECT {target_column} AS name, priority FROM {table} \
                 WHERE profile_name = $1 AND tenant_id = $2 ORDER BY priority"
            ),
            delete_sql: format!("DELETE FROM {table} WHERE profile_name = $1 AND tenant_id = $2"),
            insert_prefix: format!(
                "INSERT INTO {table} ({target_column}, profile_name, priority, tenant_id) "
            ),
        }
    }

    /// Table layout this repository writes to.
    #[must_use]
    pub const fn layout(&self) -> AssociationTable {
        self.layout
    }
}

#[async_trait]
impl AssociationRepository for PgAssociationRepository {
    fn kind(&self) -> &'static str {
        self.layout.kind
    }

    async fn list_for_profile(
        &self,
        profile_name: &str,
        tenant_id: &str,
    ) -> Result<Vec<AssociationEntry>> {
        self.gateway
            .fetch_all(
                self.layout.table,
                "list_for_profile",
                sqlx::query_as::<_, AssociationEntry>(&self.list_sql)
                    .bind(profile_name)
                    .bind(tenant_id),
            )
            .await
            .map_err(|source| DataError::unexpected("list_for_profile", self.layout.kind, source))
    }

    #[instrument(skip(self, entries), fields(kind = self.layout.kind, entries = entries.len()))]
    async fn replace_all(
        &self,
        entries: &[AssociationEntry],
        profile_name: &str,
        tenant_id: &str,
    ) -> Result<bool> {
        let kind = self.layout.kind;
        if entries.is_empty() {
            return Err(DataError::EmptyBatch { kind });
        }
        let subject = Subject {
            operation: "replace_all",
            kind,
            name: profile_name,
            surfaces: REPLACE_VIOLATIONS,
        };

        let mut tx = self
            .gateway
            .begin()
            .await
            .map_err(|source| DataError::unexpected("replace_all", kind, source))?;
        self.gateway
            .execute_on(
                &mut *tx,
                self.layout.table,
                "replace_all.clear",
                sqlx::query(&self.delete_sql)
                    .bind(profile_name)
                    .bind(tenant_id),
            )
            .await
            .map_err(|source| classify(subject, source))?;

        let mut builder = QueryBuilder::<Postgres>::new(self.insert_prefix.as_str());
        builder.push_values(entries, |mut row, entry| {
            row.push_bind(&entry.name)
                .push_bind(profile_name)
                .push_bind(entry.priority)
                .push_bind(tenant_id);
        });
        let inserted = self
            .gateway
            .execute_on(
                &mut *tx,
                self.layout.table,
                "replace_all.insert",
                builder.build(),
            )
            .await
            .map_err(|source| classify(subject, source))?;
        tx.commit()
            .await
            .map_err(|source| DataError::unexpected("replace_all", kind, source))?;

        info!("associations replaced");
        announce(
            &self.events,
            Event::AssociationsReplaced {
                kind: kind.to_string(),
                profile_name: profile_name.to_string(),
                count: entries.len(),
                tenant_id: tenant_id.to_string(),
            },
        );
        Ok(inserted > 0)
    }

    #[instrument(skip(self), fields(kind = self.layout.kind))]
    async fn delete_for_profile(&self, profile_name: &str, tenant_id: &str) -> Result<bool> {
        let rows = self
            .gateway
            .execute(
                self.layout.table,
                "delete_for_profile",
                sqlx::query(&self.delete_sql)
                    .bind(profile_name)
                    .bind(tenant_id),
            )
            .await
            .map_err(|source| {
                DataError::unexpected("delete_for_profile", self.layout.kind, source)
            })?;
        if rows == 0 {
            return Ok(false);
        }
        announce(
            &self.events,
            Event::AssociationsDeleted {
                kind: self.layout.kind.to_string(),
                profile_name: profile_name.to_string(),
                tenant_id: tenant_id.to_string(),
            },
        );
        Ok(true)
    }
}
