//! Facade owning one repository per table over a shared gateway.

use std::sync::Arc;

use rps_config::DatabaseConfig;
use rps_events::EventBus;
use tracing::{info, instrument};

use crate::error::{DataError, Result};
use crate::gateway::Gateway;
use crate::model::{
    AmtProfile, AssociationEntry, CiraConfig, Domain, Ieee8021xProfile, ProxyConfig,
    WirelessProfile,
};
use crate::repository::{
    AssociationRepository, EntityRepository, PROXY_ASSOCIATIONS, PgAssociationRepository,
    PgRepository, WIRELESS_ASSOCIATIONS,
};

/// Every repository the service needs, sharing one pool and one event bus.
///
/// Multi-step profile helpers issue independent statements; a concurrent
/// writer may interleave between them.
#[derive(Clone, Debug)]
pub struct Store {
    gateway: Gateway,
    events: EventBus,
    proxy_configs: Arc<PgRepository<ProxyConfig>>,
    cira_configs: Arc<PgRepository<CiraConfig>>,
    domains: Arc<PgRepository<Domain>>,
    wireless_profiles: Arc<PgRepository<WirelessProfile>>,
    ieee8021x_profiles: Arc<PgRepository<Ieee8021xProfile>>,
    profiles: Arc<PgRepository<AmtProfile>>,
    profile_wireless: Arc<PgAssociationRepository>,
    profile_proxies: Arc<PgAssociationRepository>,
}

impl Store {
    /// Wire repositories over an existing gateway.
    #[must_use]
    pub fn new(gateway: Gateway, events: EventBus) -> Self {
        Self {
            proxy_configs: Arc::new(PgRepository::new(gateway.clone(), events.clone())),
            cira_configs: Arc::new(PgRepository::new(gateway.clone(), events.clone())),
            domains: Arc::new(PgRepository::new(gateway.clone(), events.clone())),
            wireless_profiles: Arc::new(PgRepository::new(gateway.clone(), events.clone())),
            ieee8021x_profiles: Arc::new(PgRepository::new(gateway.clone(), events.clone())),
            profiles: Arc::new(PgRepository::new(gateway.clone(), events.clone())),
            profile_wireless: Arc::new(PgAssociationRepository::new(
                gateway.clone(),
                events.clone(),
                WIRELESS_ASSOCIATIONS,
            )),
            profile_proxies: Arc::new(PgAssociationRepository::new(
                gateway.clone(),
                events.clone(),
                PROXY_ASSOCIATIONS,
            )),
            gateway,
            events,
        }
    }

    /// Connect to the configured database and apply migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be opened or migrations fail.
    pub async fn connect(config: &DatabaseConfig, events: EventBus) -> Result<Self> {
        let store = Self::new(Gateway::connect(config).await?, events);
        store.migrate().await?;
        Ok(store)
    }

    /// Apply the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MigrationFailed`] when a migration cannot be applied.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(self.gateway.pool())
            .await
            .map_err(|source| DataError::MigrationFailed { source })?;
        info!("schema migrations applied");
        Ok(())
    }

    /// Shared connection gateway.
    #[must_use]
    pub const fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Event bus repositories publish to.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// Proxy configurations.
    #[must_use]
    pub const fn proxy_configs(&self) -> &Arc<PgRepository<ProxyConfig>> {
        &self.proxy_configs
    }

    /// CIRA configurations.
    #[must_use]
    pub const fn cira_configs(&self) -> &Arc<PgRepository<CiraConfig>> {
        &self.cira_configs
    }

    /// Provisioning domains.
    #[must_use]
    pub const fn domains(&self) -> &Arc<PgRepository<Domain>> {
        &self.domains
    }

    /// Wireless profiles.
    #[must_use]
    pub const fn wireless_profiles(&self) -> &Arc<PgRepository<WirelessProfile>> {
        &self.wireless_profiles
    }

    /// 802.1x profiles.
    #[must_use]
    pub const fn ieee8021x_profiles(&self) -> &Arc<PgRepository<Ieee8021xProfile>> {
        &self.ieee8021x_profiles
    }

    /// AMT profiles.
    #[must_use]
    pub const fn profiles(&self) -> &Arc<PgRepository<AmtProfile>> {
        &self.profiles
    }

    /// Profile to wireless edges.
    #[must_use]
    pub const fn profile_wireless(&self) -> &Arc<PgAssociationRepository> {
        &self.profile_wireless
    }

    /// Profile to proxy edges.
    #[must_use]
    pub const fn profile_proxies(&self) -> &Arc<PgAssociationRepository> {
        &self.profile_proxies
    }

    /// Insert a profile and its non-empty association lists.
    ///
    /// # Errors
    ///
    /// Propagates the first repository failure. Rows written before the
    /// failure are kept.
    #[instrument(skip_all, fields(profile = %profile.name))]
    pub async fn create_profile(
        &self,
        profile: &AmtProfile,
        wireless: &[AssociationEntry],
        proxies: &[AssociationEntry],
    ) -> Result<AmtProfile> {
        let stored = self.profiles.insert(profile).await?;
        if !wireless.is_empty() {
            self.profile_wireless
                .replace_all(wireless, &profile.name, &profile.tenant_id)
                .await?;
        }
        if !proxies.is_empty() {
            self.profile_proxies
                .replace_all(proxies, &profile.name, &profile.tenant_id)
                .await?;
        }
        Ok(stored)
    }

    /// Update a profile and reconcile its association lists.
    ///
    /// An empty list clears that association table for the profile.
    ///
    /// # Errors
    ///
    /// Propagates the first repository failure.
    #[instrument(skip_all, fields(profile = %profile.name))]
    pub async fn update_profile(
        &self,
        profile: &AmtProfile,
        wireless: &[AssociationEntry],
        proxies: &[AssociationEntry],
    ) -> Result<AmtProfile> {
        let stored = self.profiles.update(profile).await?;
        sync_associations(
            self.profile_wireless.as_ref(),
            wireless,
            &profile.name,
            &profile.tenant_id,
        )
        .await?;
        sync_associations(
            self.profile_proxies.as_ref(),
            proxies,
            &profile.name,
            &profile.tenant_id,
        )
        .await?;
        Ok(stored)
    }

    /// Remove a profile together with its association rows.
    ///
    /// # Errors
    ///
    /// Propagates the first repository failure.
    #[instrument(skip(self))]
    pub async fn delete_profile(&self, name: &str, tenant_id: &str) -> Result<bool> {
        self.profile_wireless
            .delete_for_profile(name, tenant_id)
            .await?;
        self.profile_proxies
            .delete_for_profile(name, tenant_id)
            .await?;
        self.profiles.delete(name, tenant_id).await
    }
}

async fn sync_associations(
    repository: &dyn AssociationRepository,
    entries: &[AssociationEntry],
    profile_name: &str,
    tenant_id: &str,
) -> Result<()> {
    if entries.is_empty() {
        repository.delete_for_profile(profile_name, tenant_id).await?;
    } else {
        repository
            .replace_all(entries, profile_name, tenant_id)
            .await?;
    }
    Ok(())
}
