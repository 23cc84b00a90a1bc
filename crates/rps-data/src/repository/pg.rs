use std::fmt;
use std::marker::PhantomData;

use async_trait::async_trait;
use rps_events::{Event, EventBus};
use tracing::{info, instrument};

use crate::classify::{
    DELETE_VIOLATIONS, INSERT_VIOLATIONS, Subject, UPDATE_VIOLATIONS, classify,
};
use crate::error::{DataError, Result};
use crate::gateway::Gateway;

use super::{Entity, EntityRepository, announce};

/// Statements generated once per entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Statements {
    count: String,
    list: String,
    get: String,
    exists: String,
    insert: String,
    update: String,
    delete: String,
    referenced: Option<String>,
}

impl Statements {
    fn for_entity<E: Entity>() -> Self {
        let table = E::TABLE;
        let columns = E::COLUMNS;
        let select = format!(
            "SELECT name, {}, tenant_id, creation_date FROM {table}",
            columns.join(", ")
        );
        let tenant_slot = columns.len() + 2;
        let values = (2..=columns.len() + 1)
            .map(|slot| format!("${slot}"))
            .collect::<Vec<_>>()
            .join(", ");
        let assignments = columns
            .iter()
            .enumerate()
            .map(|(index, column)| format!("{column} = ${}", index + 2))
            .collect::<Vec<_>>()
            .join(", ");
        let referenced = (!E::REFERENCES.is_empty()).then(|| {
            let checks = E::REFERENCES
                .iter()
                .map(|reference| {
                    format!(
                        "EXISTS (SELECT 1 FROM {} WHERE {} = $1 AND tenant_id = $2)",
                        reference.table, reference.column
                    )
                })
                .collect::<Vec<_>>()
                .join(" OR ");
            format!("SELECT {checks}")
        });

        Self {
            count: format!("SELECT count(*) FROM {table} WHERE tenant_id = $1"),
            list: format!("{select} WHERE tenant_id = $1 ORDER BY name LIMIT $2 OFFSET $3"),
            get: format!("{select} WHERE name = $1 AND tenant_id = $2"),
            exists: format!(
                "SELECT EXISTS (SELECT 1 FROM {table} WHERE name = $1 AND tenant_id = $2)"
            ),
            insert: format!(
                "INSERT INTO {table} (name, {}, tenant_id) VALUES ($1, {values}, ${tenant_slot})",
                columns.join(", ")
            ),
            update: format!(
                "UPDATE {table} SET {assignments} WHERE name = $1 AND tenant_id = ${tenant_slot}"
            ),
            delete: format!("DELETE FROM {table} WHERE name = $1 AND tenant_id = $2"),
            referenced,
        }
    }
}

/// Postgres-backed [`EntityRepository`] shared by every entity table.
pub struct PgRepository<E> {
    gateway: Gateway,
    events: EventBus,
    statements: Statements,
    entity: PhantomData<fn() -> E>,
}

impl<E: Entity> PgRepository<E> {
    /// Build a repository over the shared gateway and event bus.
    #[must_use]
    pub fn new(gateway: Gateway, events: EventBus) -> Self {
        Self {
            gateway,
            events,
            statements: Statements::for_entity::<E>(),
            entity: PhantomData,
        }
    }

    fn latest_snapshot(latest: Option<&E>) -> Option<serde_json::Value> {
        latest.and_then(|row| serde_json::to_value(row).ok())
    }
}

impl<E> fmt::Debug for PgRepository<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgRepository")
            .field("statements", &self.statements)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<E: Entity> EntityRepository<E> for PgRepository<E> {
    async fn count(&self, tenant_id: &str) -> Result<u64> {
        let total = self
            .gateway
            .fetch_scalar::<i64>(
                E::TABLE,
                "count",
                sqlx::query_scalar(&self.statements.count).bind(tenant_id),
            )
            .await
            .map_err(|source| DataError::unexpected("count", E::KIND, source))?;
        Ok(total.map_or(0, |total| u64::try_from(total).unwrap_or(0)))
    }

    async fn list(&self, top: u32, skip: u32, tenant_id: &str) -> Result<Vec<E>> {
        self.gateway
            .fetch_all(
                E::TABLE,
                "list",
                sqlx::query_as::<_, E>(&self.statements.list)
                    .bind(tenant_id)
                    .bind(i64::from(top))
                    .bind(i64::from(skip)),
            )
            .await
            .map_err(|source| DataError::unexpected("list", E::KIND, source))
    }

    async fn get_by_name(&self, name: &str, tenant_id: &str) -> Result<Option<E>> {
        self.gateway
            .fetch_optional(
                E::TABLE,
                "get_by_name",
                sqlx::query_as::<_, E>(&self.statements.get)
                    .bind(name)
                    .bind(tenant_id),
            )
            .await
            .map_err(|source| DataError::unexpected("get_by_name", E::KIND, source))
    }

    async fn exists(&self, name: &str, tenant_id: &str) -> Result<bool> {
        let found = self
            .gateway
            .fetch_scalar::<bool>(
                E::TABLE,
                "exists",
                sqlx::query_scalar(&self.statements.exists)
                    .bind(name)
                    .bind(tenant_id),
            )
            .await
            .map_err(|source| DataError::unexpected("exists", E::KIND, source))?;
        Ok(found.unwrap_or(false))
    }

    #[instrument(
        skip(self, entity),
        fields(kind = E::KIND, name = entity.name(), tenant = entity.tenant_id())
    )]
    async fn insert(&self, entity: &E) -> Result<E> {
        let subject = Subject {
            operation: "insert",
            kind: E::KIND,
            name: entity.name(),
            surfaces: INSERT_VIOLATIONS,
        };
        let query = entity
            .bind_columns(sqlx::query(&self.statements.insert).bind(entity.name()))
            .bind(entity.tenant_id());
        self.gateway
            .execute(E::TABLE, "insert", query)
            .await
            .map_err(|source| classify(subject, source))?;

        let Some(stored) = self.get_by_name(entity.name(), entity.tenant_id()).await? else {
            return Err(DataError::ConcurrencyConflict {
                kind: E::KIND,
                name: entity.name().to_string(),
                latest: None,
            });
        };
        info!("created");
        announce(
            &self.events,
            Event::Created {
                kind: E::KIND.to_string(),
                name: entity.name().to_string(),
                tenant_id: entity.tenant_id().to_string(),
            },
        );
        Ok(stored)
    }

    #[instrument(
        skip(self, entity),
        fields(kind = E::KIND, name = entity.name(), tenant = entity.tenant_id())
    )]
    async fn update(&self, entity: &E) -> Result<E> {
        let subject = Subject {
            operation: "update",
            kind: E::KIND,
            name: entity.name(),
            surfaces: UPDATE_VIOLATIONS,
        };
        let query = entity
            .bind_columns(sqlx::query(&self.statements.update).bind(entity.name()))
            .bind(entity.tenant_id());
        let rows = self
            .gateway
            .execute(E::TABLE, "update", query)
            .await
            .map_err(|source| classify(subject, source))?;

        let latest = self.get_by_name(entity.name(), entity.tenant_id()).await?;
        match latest {
            Some(stored) if rows > 0 => {
                info!("updated");
                announce(
                    &self.events,
                    Event::Updated {
                        kind: E::KIND.to_string(),
                        name: entity.name().to_string(),
                        tenant_id: entity.tenant_id().to_string(),
                    },
                );
                Ok(stored)
            }
            latest => Err(DataError::ConcurrencyConflict {
                kind: E::KIND,
                name: entity.name().to_string(),
                latest: Self::latest_snapshot(latest.as_ref()),
            }),
        }
    }

    #[instrument(skip(self), fields(kind = E::KIND))]
    async fn delete(&self, name: &str, tenant_id: &str) -> Result<bool> {
        if let Some(statement) = &self.statements.referenced {
            let referenced = self
                .gateway
                .fetch_scalar::<bool>(
                    E::TABLE,
                    "delete_guard",
                    sqlx::query_scalar(statement).bind(name).bind(tenant_id),
                )
                .await
                .map_err(|source| DataError::unexpected("delete", E::KIND, source))?;
            if referenced.unwrap_or(false) {
                return Err(DataError::ReferentialConstraint {
                    kind: E::KIND,
                    name: name.to_string(),
                    detail: None,
                });
            }
        }

        let subject = Subject {
            operation: "delete",
            kind: E::KIND,
            name,
            surfaces: DELETE_VIOLATIONS,
        };
        let rows = self
            .gateway
            .execute(
                E::TABLE,
                "delete",
                sqlx::query(&self.statements.delete)
                    .bind(name)
                    .bind(tenant_id),
            )
            .await
            .map_err(|source| classify(subject, source))?;
        if rows == 0 {
            return Ok(false);
        }
        info!("deleted");
        announce(
            &self.events,
            Event::Deleted {
                kind: E::KIND.to_string(),
                name: name.to_string(),
                tenant_id: tenant_id.to_string(),
            },
        );
        Ok(true)
    }
}
