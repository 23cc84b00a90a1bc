//! Resolves a stored profile and everything it references into one
//! self-contained, encrypted document.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::try_join_all;
use rps_data::{
    Activation, AmtProfile, AssociationEntry, AssociationRepository, CiraConfig, DataError,
    Domain, EntityRepository, Ieee8021xProfile, ProxyConfig, Store, WirelessProfile,
};
use rps_events::{Event, EventBus};
use rps_secrets::SecretResolver;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::cipher::DocumentCipher;
use crate::document::{
    AmtSpecific, Cira, Configuration, ExportDocument, General, Ieee8021xEntry, Network,
    ProvisioningCert, ProxyEntry, Redirection, Tls, WifiEntry, Wired, Wireless,
};
use crate::error::{ExportError, ExportResult};

/// Secret store layout used during export.
pub mod secret_paths {
    /// Admin password key under [`profile_path`].
    pub const AMT_PASSWORD: &str = "AMT_PASSWORD";
    /// MEBX password key under [`profile_path`].
    pub const MEBX_PASSWORD: &str = "MEBX_PASSWORD";
    /// MPS password key under [`profile_path`].
    pub const MPS_PASSWORD: &str = "MPS_PASSWORD";
    /// Certificate blob key under [`cert_path`].
    pub const CERT: &str = "CERT";
    /// Certificate password key under [`cert_path`].
    pub const CERT_PASSWORD: &str = "CERT_PASSWORD";

    /// Segment standing for the default (empty) tenant.
    pub const DEFAULT_TENANT: &str = "~";

    /// Record holding a profile's passwords, scoped to its tenant.
    #[must_use]
    pub fn profile_path(tenant_id: &str, profile_name: &str) -> String {
        format!("profiles/{}/{}", segment(tenant_id), segment(profile_name))
    }

    /// Record holding a domain's provisioning certificate, scoped to its tenant.
    #[must_use]
    pub fn cert_path(tenant_id: &str, domain_name: &str) -> String {
        format!("certs/{}/{}", segment(tenant_id), segment(domain_name))
    }

    /// Escape a name into exactly one path segment. Distinct names always
    /// map to distinct segments.
    fn segment(name: &str) -> String {
        if name.is_empty() {
            return DEFAULT_TENANT.to_string();
        }
        let mut escaped = String::with_capacity(name.len());
        for ch in name.chars() {
            match ch {
                '%' => escaped.push_str("%25"),
                '/' => escaped.push_str("%2F"),
                '~' => escaped.push_str("%7E"),
                _ => escaped.push(ch),
            }
        }
        if escaped == "." || escaped == ".." {
            escaped = escaped.replace('.', "%2E");
        }
        escaped
    }
}

/// Repositories the assembler reads from.
#[derive(Clone)]
pub struct ExportSources {
    /// AMT profiles.
    pub profiles: Arc<dyn EntityRepository<AmtProfile>>,
    /// CIRA configurations.
    pub cira_configs: Arc<dyn EntityRepository<CiraConfig>>,
    /// Provisioning domains.
    pub domains: Arc<dyn EntityRepository<Domain>>,
    /// Wireless profiles.
    pub wireless_profiles: Arc<dyn EntityRepository<WirelessProfile>>,
    /// 802.1x profiles.
    pub ieee8021x_profiles: Arc<dyn EntityRepository<Ieee8021xProfile>>,
    /// Proxy configurations.
    pub proxy_configs: Arc<dyn EntityRepository<ProxyConfig>>,
    /// Profile to wireless edges.
    pub profile_wireless: Arc<dyn AssociationRepository>,
    /// Profile to proxy edges.
    pub profile_proxies: Arc<dyn AssociationRepository>,
}

impl ExportSources {
    /// Borrow the Postgres repositories owned by `store`.
    #[must_use]
    pub fn from_store(store: &Store) -> Self {
        Self {
            profiles: store.profiles().clone(),
            cira_configs: store.cira_configs().clone(),
            domains: store.domains().clone(),
            wireless_profiles: store.wireless_profiles().clone(),
            ieee8021x_profiles: store.ieee8021x_profiles().clone(),
            proxy_configs: store.proxy_configs().clone(),
            profile_wireless: store.profile_wireless().clone(),
            profile_proxies: store.profile_proxies().clone(),
        }
    }
}

impl std::fmt::Debug for ExportSources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportSources")
            .field("wireless_associations", &self.profile_wireless.kind())
            .field("proxy_associations", &self.profile_proxies.kind())
            .finish_non_exhaustive()
    }
}

/// Encrypted export handed back to the caller.
///
/// The plaintext document never leaves the assembler.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    /// `<profile>.yaml`.
    pub filename: String,
    /// Base64 `nonce || tag || ciphertext`.
    pub content: String,
    /// Base64 one-time key.
    pub key: String,
}

impl std::fmt::Debug for ExportBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportBundle")
            .field("filename", &self.filename)
            .field("content_len", &self.content.len())
            .field("key", &"***")
            .finish()
    }
}

/// Builds export documents from the configuration store.
pub struct ExportAssembler {
    sources: ExportSources,
    secrets: Arc<dyn SecretResolver>,
    cipher: DocumentCipher,
    events: EventBus,
}

impl std::fmt::Debug for ExportAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportAssembler")
            .field("sources", &self.sources)
            .field("cipher", &self.cipher)
            .finish_non_exhaustive()
    }
}

impl ExportAssembler {
    /// Assembler reading from `sources` and substituting secrets from
    /// `secrets`.
    #[must_use]
    pub fn new(sources: ExportSources, secrets: Arc<dyn SecretResolver>, events: EventBus) -> Self {
        Self {
            sources,
            secrets,
            cipher: DocumentCipher::new(),
            events,
        }
    }

    /// Resolve, serialize, and encrypt a profile.
    ///
    /// `domain_name` is consulted only for admin control mode.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::NotFound`] (wrapped) for the first missing
    /// reference, any store failure, or an encoding/encryption failure.
    /// Secret lookups never fail the export.
    #[instrument(name = "export.profile", skip(self))]
    pub async fn export(
        &self,
        profile_name: &str,
        tenant_id: &str,
        domain_name: Option<&str>,
    ) -> ExportResult<ExportBundle> {
        let document = self.assemble(profile_name, tenant_id, domain_name).await?;
        let yaml =
            serde_yaml::to_string(&document).map_err(|source| ExportError::Encode { source })?;
        let sealed = self.cipher.encrypt(yaml.as_bytes())?;

        if let Err(err) = self.events.try_publish(Event::ProfileExported {
            profile_name: profile_name.to_string(),
            tenant_id: tenant_id.to_string(),
        }) {
            debug!(event_id = err.event_id(), "export event published without subscribers");
        }
        info!("profile exported");

        Ok(ExportBundle {
            filename: format!("{profile_name}.yaml"),
            content: sealed.content,
            key: sealed.key,
        })
    }

    /// Resolve a profile into its plaintext document.
    ///
    /// # Errors
    ///
    /// Same as [`ExportAssembler::export`], minus the encoding failures.
    pub async fn assemble(
        &self,
        profile_name: &str,
        tenant_id: &str,
        domain_name: Option<&str>,
    ) -> ExportResult<ExportDocument> {
        let profile = self
            .sources
            .profiles
            .get_by_name(profile_name, tenant_id)
            .await?
            .ok_or_else(|| not_found("AMT", profile_name))?;

        let cira = match profile.cira_config_name.as_deref() {
            Some(name) => Some(
                self.sources
                    .cira_configs
                    .get_by_name(name, tenant_id)
                    .await?
                    .ok_or_else(|| not_found("CIRA", name))?,
            ),
            None => None,
        };

        let provisioning = match (profile.activation, domain_name) {
            (Activation::Acm, Some(domain)) => self.provisioning_cert(domain, tenant_id).await?,
            _ => ProvisioningCert::default(),
        };

        let wifi = self.resolve_wifi(&profile.name, tenant_id).await?;
        let proxies = self.resolve_proxies(&profile.name, tenant_id).await?;
        let ieee8021x = self.resolve_ieee8021x(&profile, &wifi, tenant_id).await?;

        let path = secret_paths::profile_path(tenant_id, &profile.name);
        let (admin_password, mebx_password, mps_password) = futures::join!(
            self.secret_or_stored(
                &path,
                secret_paths::AMT_PASSWORD,
                profile.amt_password.as_deref()
            ),
            self.secret_or_stored(
                &path,
                secret_paths::MEBX_PASSWORD,
                profile.mebx_password.as_deref()
            ),
            async {
                match &cira {
                    Some(cira) => {
                        self.secret_or_stored(
                            &path,
                            secret_paths::MPS_PASSWORD,
                            cira.password.as_deref(),
                        )
                        .await
                    }
                    None => String::new(),
                }
            },
        );

        let configuration = Configuration {
            general: General {
                tags: profile.tags.clone(),
            },
            network: Network {
                wired: Wired {
                    dhcp_enabled: profile.dhcp_enabled,
                    static_enabled: !profile.dhcp_enabled,
                    ip_sync_enabled: profile.ip_sync_enabled,
                    ieee8021x_profile_name: profile
                        .ieee8021x_profile_name
                        .clone()
                        .unwrap_or_default(),
                },
                wireless: Wireless {
                    wifi_sync_enabled: profile.local_wifi_sync_enabled,
                    profiles: wifi,
                },
                proxies,
            },
            ieee8021x_profiles: ieee8021x,
            tls: Tls::for_profile(&profile),
            redirection: Redirection::for_profile(&profile),
            cira: cira.map(|config| Cira::resolved(config, mps_password)),
            amt_specific: AmtSpecific {
                control_mode: profile.activation.as_str().to_string(),
                admin_password,
                generate_random_password: profile.generate_random_password,
                mebx_password,
                generate_random_mebx_password: profile.generate_random_mebx_password,
                provisioning_cert: provisioning.cert,
                provisioning_cert_pwd: provisioning.password,
                domain_suffix: provisioning.domain_suffix,
            },
        };

        Ok(ExportDocument {
            name: profile.name,
            configuration,
        })
    }

    async fn provisioning_cert(
        &self,
        domain_name: &str,
        tenant_id: &str,
    ) -> ExportResult<ProvisioningCert> {
        let Some(domain) = self.sources.domains.get_by_name(domain_name, tenant_id).await? else {
            warn!(domain = domain_name, "domain not found; exporting without certificate");
            return Ok(ProvisioningCert::default());
        };
        let path = secret_paths::cert_path(tenant_id, &domain.name);
        let (cert, password) = futures::join!(
            self.secret_or_stored(
                &path,
                secret_paths::CERT,
                domain.provisioning_cert.as_deref()
            ),
            self.secret_or_stored(
                &path,
                secret_paths::CERT_PASSWORD,
                domain.provisioning_cert_key.as_deref()
            ),
        );
        Ok(ProvisioningCert {
            cert,
            password,
            domain_suffix: domain.domain_suffix,
        })
    }

    async fn resolve_wifi(&self, profile_name: &str, tenant_id: &str) -> ExportResult<Vec<WifiEntry>> {
        let edges = self
            .sources
            .profile_wireless
            .list_for_profile(profile_name, tenant_id)
            .await?;
        let repo = &self.sources.wireless_profiles;
        let resolved = try_join_all(by_priority(edges).into_iter().map(|edge| async move {
            let profile = repo
                .get_by_name(&edge.name, tenant_id)
                .await?
                .ok_or_else(|| not_found("Wireless", &edge.name))?;
            Ok::<_, DataError>(WifiEntry::resolved(profile, edge.priority))
        }))
        .await?;
        Ok(resolved)
    }

    async fn resolve_proxies(
        &self,
        profile_name: &str,
        tenant_id: &str,
    ) -> ExportResult<Vec<ProxyEntry>> {
        let edges = self
            .sources
            .profile_proxies
            .list_for_profile(profile_name, tenant_id)
            .await?;
        let repo = &self.sources.proxy_configs;
        let resolved = try_join_all(by_priority(edges).into_iter().map(|edge| async move {
            let proxy = repo
                .get_by_name(&edge.name, tenant_id)
                .await?
                .ok_or_else(|| not_found("Proxy", &edge.name))?;
            Ok::<_, DataError>(ProxyEntry::resolved(proxy, edge.priority))
        }))
        .await?;
        Ok(resolved)
    }

    /// Wired profile first, then wifi-linked ones in priority order, each
    /// once.
    async fn resolve_ieee8021x(
        &self,
        profile: &AmtProfile,
        wifi: &[WifiEntry],
        tenant_id: &str,
    ) -> ExportResult<Vec<Ieee8021xEntry>> {
        let mut seen = HashSet::new();
        let names: Vec<&str> = profile
            .ieee8021x_profile_name
            .as_deref()
            .into_iter()
            .chain(
                wifi.iter()
                    .map(|entry| entry.ieee8021x_profile_name.as_str())
                    .filter(|name| !name.is_empty()),
            )
            .filter(|name| seen.insert(*name))
            .collect();

        let mut resolved = Vec::with_capacity(names.len());
        for name in names {
            let entry = self
                .sources
                .ieee8021x_profiles
                .get_by_name(name, tenant_id)
                .await?
                .ok_or_else(|| not_found("802.1x", name))?;
            resolved.push(Ieee8021xEntry::from(entry));
        }
        Ok(resolved)
    }

    async fn secret_or_stored(&self, path: &str, key: &str, stored: Option<&str>) -> String {
        match self.secrets.get_secret_from_key(path, key).await {
            Ok(Some(value)) => value,
            Ok(None) => stored.unwrap_or_default().to_string(),
            Err(err) => {
                warn!(path, key, error = %err, "secret lookup failed; using stored value");
                stored.unwrap_or_default().to_string()
            }
        }
    }
}

fn by_priority(mut edges: Vec<AssociationEntry>) -> Vec<AssociationEntry> {
    edges.sort_by_key(|edge| edge.priority);
    edges
}

fn not_found(kind: &'static str, name: &str) -> DataError {
    DataError::NotFound {
        kind,
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_paths_are_namespaced_by_tenant() {
        assert_eq!(secret_paths::profile_path("acme", "office"), "profiles/acme/office");
        assert_eq!(secret_paths::cert_path("acme", "corp"), "certs/acme/corp");
        assert_eq!(secret_paths::profile_path("", "office"), "profiles/~/office");
        assert_ne!(
            secret_paths::profile_path("other", "office"),
            secret_paths::profile_path("acme", "office")
        );
    }

    #[test]
    fn secret_path_names_stay_in_one_segment() {
        assert_eq!(
            secret_paths::profile_path("acme", "../other/office"),
            "profiles/acme/..%2Fother%2Foffice"
        );
        assert_eq!(secret_paths::cert_path("..", "."), "certs/%2E%2E/%2E");
        assert_eq!(secret_paths::profile_path("~", "50%"), "profiles/%7E/50%25");
        assert_ne!(
            secret_paths::profile_path("a/b", "c"),
            secret_paths::profile_path("a", "b/c")
        );
    }

    #[test]
    fn edges_sort_by_priority() {
        let sorted = by_priority(vec![
            AssociationEntry::new("b", 2),
            AssociationEntry::new("a", 1),
            AssociationEntry::new("c", 3),
        ]);
        let names: Vec<_> = sorted.iter().map(|edge| edge.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn bundle_debug_hides_key() {
        let bundle = ExportBundle {
            filename: "office.yaml".into(),
            content: "AAAA".into(),
            key: "c2VjcmV0".into(),
        };
        let rendered = format!("{bundle:?}");
        assert!(rendered.contains("office.yaml"));
        assert!(!rendered.contains("c2VjcmV0"));
    }
}
