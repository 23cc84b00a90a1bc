use std::sync::Arc;

use rps_config::ServiceConfig;
use rps_data::Store;
use rps_events::EventBus;
use rps_export::{ExportAssembler, ExportSources};
use rps_secrets::{SecretResolver, resolver_for};
use rps_telemetry::{GlobalContextGuard, LogFormat, LoggingConfig};
use tracing::info;

use crate::error::{AppError, AppResult};

/// Everything a front end needs to serve provisioning requests.
#[derive(Clone)]
pub struct Services {
    store: Store,
    secrets: Arc<dyn SecretResolver>,
    exporter: Arc<ExportAssembler>,
    events: EventBus,
}

impl Services {
    /// Connect the pool, apply migrations, and wire the secret resolver and
    /// export assembler. Installs nothing global.
    ///
    /// # Errors
    ///
    /// Returns an error when the database is unreachable, a migration fails,
    /// or the secret store client cannot be built.
    pub async fn from_config(config: &ServiceConfig) -> AppResult<Self> {
        let secrets =
            resolver_for(&config.secrets).map_err(|err| AppError::secrets("secrets.resolver", err))?;
        let events = EventBus::new();
        let store = Store::connect(&config.database, events.clone())
            .await
            .map_err(|err| AppError::data("store.connect", err))?;
        info!(url = %config.database.redacted_url(), "provisioning store ready");
        Ok(Self::from_parts(store, secrets))
    }

    /// Wire services over an already connected store.
    #[must_use]
    pub fn from_parts(store: Store, secrets: Arc<dyn SecretResolver>) -> Self {
        let events = store.events().clone();
        let exporter = Arc::new(ExportAssembler::new(
            ExportSources::from_store(&store),
            Arc::clone(&secrets),
            events.clone(),
        ));
        Self {
            store,
            secrets,
            exporter,
            events,
        }
    }

    /// Repositories over the shared pool.
    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    /// Secret resolver selected by configuration.
    #[must_use]
    pub fn secrets(&self) -> &dyn SecretResolver {
        self.secrets.as_ref()
    }

    /// Profile export pipeline.
    #[must_use]
    pub const fn exporter(&self) -> &Arc<ExportAssembler> {
        &self.exporter
    }

    /// Bus every component publishes to.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// Close the pool, waiting for checked-out connections.
    pub async fn shutdown(&self) {
        self.store.gateway().close().await;
        info!("provisioning store closed");
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("store", &self.store)
            .field("exporter", &self.exporter)
            .finish_non_exhaustive()
    }
}

/// Load configuration from the environment, install logging, and build the
/// services.
///
/// The returned guard keeps the application span entered; hold it for the
/// life of the process.
///
/// # Errors
///
/// Returns an error if configuration is invalid, a subscriber is already
/// installed, or service construction fails.
pub async fn bootstrap() -> AppResult<(Services, GlobalContextGuard)> {
    let config =
        ServiceConfig::from_env().map_err(|err| AppError::config("config.from_env", err))?;
    rps_telemetry::init_logging(&LoggingConfig {
        level: &config.logging.level,
        format: LogFormat::from_name(config.logging.format.as_deref()),
        build_sha: option_env!("RPS_BUILD_SHA").unwrap_or("dev"),
    })
    .map_err(|err| AppError::telemetry("telemetry.init", err))?;
    let context = GlobalContextGuard::new("bootstrap");

    info!("provisioning service bootstrap starting");
    let services = Services::from_config(&config).await?;
    rps_telemetry::record_app_mode("ready");
    Ok((services, context))
}
