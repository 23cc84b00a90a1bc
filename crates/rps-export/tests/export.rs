use std::sync::Arc;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, Nonce, UnboundKey};
use rps_data::{
    Activation, AmtProfile, AssociationEntry, CiraConfig, DataError, Domain, Ieee8021xProfile,
    InfoFormat, ProxyConfig, WirelessProfile,
};
use rps_events::{Event, EventBus};
use rps_export::{
    ExportAssembler, ExportBundle, ExportError, ExportSources, NONCE_LEN, TAG_LEN, secret_paths,
};
use rps_secrets::{MemoryResolver, SecretResolver};
use rps_test_support::mocks::{MemoryAssociations, MemoryRepository};
use serde_yaml::Value;

const TENANT: &str = "acme";

fn profile(name: &str, activation: Activation) -> AmtProfile {
    AmtProfile {
        name: name.into(),
        activation,
        amt_password: Some("stored-amt".into()),
        generate_random_password: false,
        mebx_password: None,
        generate_random_mebx_password: true,
        cira_config_name: Some("mps".into()),
        ieee8021x_profile_name: Some("wired-eap".into()),
        tags: vec!["lab".into()],
        dhcp_enabled: true,
        ip_sync_enabled: true,
        local_wifi_sync_enabled: false,
        tls_mode: None,
        tls_signing_authority: None,
        user_consent: None,
        ider_enabled: false,
        kvm_enabled: true,
        sol_enabled: false,
        tenant_id: TENANT.into(),
        creation_date: None,
    }
}

fn cira() -> CiraConfig {
    CiraConfig {
        name: "mps".into(),
        mps_server_address: "mps.example.com".into(),
        mps_port: 4433,
        user_name: "admin".into(),
        password: Some("stored-mps".into()),
        common_name: "mps.example.com".into(),
        server_address_format: 201,
        auth_method: 2,
        mps_root_certificate: "ROOT".into(),
        proxy_details: String::new(),
        tenant_id: TENANT.into(),
        creation_date: None,
    }
}

fn wireless(name: &str, ieee8021x: Option<&str>) -> WirelessProfile {
    WirelessProfile {
        name: name.into(),
        authentication_method: if ieee8021x.is_some() { 7 } else { 6 },
        encryption_method: 4,
        ssid: format!("{name}-ssid"),
        psk_passphrase: ieee8021x.is_none().then(|| "passphrase".to_string()),
        link_policy: vec![14, 16],
        ieee8021x_profile_name: ieee8021x.map(str::to_string),
        tenant_id: TENANT.into(),
        creation_date: None,
    }
}

fn ieee8021x(name: &str, wired: bool) -> Ieee8021xProfile {
    Ieee8021xProfile {
        name: name.into(),
        auth_protocol: 0,
        server_name: None,
        domain: None,
        username: Some("device".into()),
        password: None,
        roaming_identity: None,
        active_in_s0: true,
        pxe_timeout: Some(120),
        wired_interface: wired,
        tenant_id: TENANT.into(),
        creation_date: None,
    }
}

fn proxy(name: &str) -> ProxyConfig {
    ProxyConfig {
        name: name.into(),
        access_info: "proxy.example.com".into(),
        info_format: InfoFormat::Fqdn,
        port: 8080,
        network_dns_suffix: "example.com".into(),
        tenant_id: TENANT.into(),
        creation_date: None,
    }
}

fn domain() -> Domain {
    Domain {
        name: "corp".into(),
        domain_suffix: "corp.example.com".into(),
        provisioning_cert: Some("stored-cert".into()),
        provisioning_cert_storage_format: "string".into(),
        provisioning_cert_key: Some("stored-cert-pwd".into()),
        expiration_date: None,
        tenant_id: TENANT.into(),
        creation_date: None,
    }
}

struct Fixture {
    profiles: Vec<AmtProfile>,
    wireless: Vec<WirelessProfile>,
    wifi_edges: Vec<AssociationEntry>,
    proxy_edges: Vec<AssociationEntry>,
    wireless_repo: Option<Arc<MemoryRepository<WirelessProfile>>>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            profiles: vec![profile("office", Activation::Ccm)],
            wireless: vec![wireless("guest", None), wireless("corp-wifi", Some("wifi-eap"))],
            wifi_edges: vec![
                AssociationEntry::new("corp-wifi", 2),
                AssociationEntry::new("guest", 1),
            ],
            proxy_edges: vec![AssociationEntry::new("edge-proxy", 1)],
            wireless_repo: None,
        }
    }

    fn sources(&mut self) -> ExportSources {
        let wireless_repo = Arc::new(MemoryRepository::with_rows(self.wireless.clone()));
        self.wireless_repo = Some(wireless_repo.clone());
        ExportSources {
            profiles: Arc::new(MemoryRepository::with_rows(self.profiles.clone())),
            cira_configs: Arc::new(MemoryRepository::with_rows([cira()])),
            domains: Arc::new(MemoryRepository::with_rows([domain()])),
            wireless_profiles: wireless_repo,
            ieee8021x_profiles: Arc::new(MemoryRepository::with_rows([
                ieee8021x("wired-eap", true),
                ieee8021x("wifi-eap", false),
            ])),
            proxy_configs: Arc::new(MemoryRepository::with_rows([proxy("edge-proxy")])),
            profile_wireless: Arc::new(MemoryAssociations::new("Wireless").with_profile(
                "office",
                TENANT,
                self.wifi_edges.clone(),
            )),
            profile_proxies: Arc::new(MemoryAssociations::new("Proxy").with_profile(
                "office",
                TENANT,
                self.proxy_edges.clone(),
            )),
        }
    }

    fn assembler(&mut self, secrets: Arc<dyn SecretResolver>, events: EventBus) -> ExportAssembler {
        ExportAssembler::new(self.sources(), secrets, events)
    }
}

fn decrypt(bundle: &ExportBundle) -> Result<Value> {
    let blob = STANDARD.decode(&bundle.content)?;
    let key = STANDARD.decode(&bundle.key)?;
    anyhow::ensure!(blob.len() > NONCE_LEN + TAG_LEN, "blob too short");
    let (nonce, rest) = blob.split_at(NONCE_LEN);
    let (tag, ciphertext) = rest.split_at(TAG_LEN);
    let mut in_out = ciphertext.to_vec();
    in_out.extend_from_slice(tag);
    let key = LessSafeKey::new(
        UnboundKey::new(&AES_256_GCM, &key).map_err(|_| anyhow::anyhow!("bad key"))?,
    );
    let nonce = Nonce::try_assume_unique_for_key(nonce).map_err(|_| anyhow::anyhow!("bad nonce"))?;
    let plain = key
        .open_in_place(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| anyhow::anyhow!("integrity check failed"))?;
    Ok(serde_yaml::from_slice(plain)?)
}

fn field<'a>(value: &'a Value, path: &[&str]) -> Result<&'a Value> {
    path.iter().try_fold(value, |current, key| {
        current
            .get(*key)
            .with_context(|| format!("missing field {key}"))
    })
}

fn not_found(err: ExportError) -> Option<(&'static str, String)> {
    match err {
        ExportError::Data(DataError::NotFound { kind, name }) => Some((kind, name)),
        _ => None,
    }
}

#[tokio::test]
async fn export_produces_decryptable_document_with_secrets() -> Result<()> {
    let path = secret_paths::profile_path(TENANT, "office");
    let secrets = MemoryResolver::new()
        .with_secret(&path, secret_paths::AMT_PASSWORD, "vault-amt")
        .with_secret(&path, secret_paths::MPS_PASSWORD, "vault-mps");
    let events = EventBus::new();
    let assembler = Fixture::new().assembler(Arc::new(secrets), events.clone());

    let bundle = assembler.export("office", TENANT, None).await?;
    assert_eq!(bundle.filename, "office.yaml");

    let document = decrypt(&bundle)?;
    assert_eq!(field(&document, &["name"])?.as_str(), Some("office"));
    let amt = field(&document, &["configuration", "amtSpecific"])?;
    assert_eq!(field(amt, &["controlMode"])?.as_str(), Some("ccmactivate"));
    assert_eq!(field(amt, &["adminPassword"])?.as_str(), Some("vault-amt"));
    assert_eq!(field(amt, &["mebxPassword"])?.as_str(), Some(""));
    assert_eq!(field(amt, &["provisioningCert"])?.as_str(), Some(""));
    assert_eq!(
        field(&document, &["configuration", "cira", "password"])?.as_str(),
        Some("vault-mps")
    );
    assert_eq!(
        field(&document, &["configuration", "tls", "delay"])?.as_u64(),
        Some(3)
    );
    assert_eq!(
        field(&document, &["configuration", "redirection", "userConsent"])?.as_str(),
        Some("kvm")
    );

    let backlog = events.backlog_since(0);
    assert_eq!(backlog.len(), 1);
    assert_eq!(
        backlog[0].event,
        Event::ProfileExported {
            profile_name: "office".into(),
            tenant_id: TENANT.into(),
        }
    );
    Ok(())
}

#[tokio::test]
async fn secrets_do_not_cross_tenants() -> Result<()> {
    let mut other = profile("office", Activation::Ccm);
    other.tenant_id = "other".into();
    other.amt_password = Some("other-stored".into());
    other.cira_config_name = None;
    other.ieee8021x_profile_name = None;
    let mut fixture = Fixture::new();
    fixture.profiles.push(other);
    let secrets = MemoryResolver::new().with_secret(
        &secret_paths::profile_path(TENANT, "office"),
        secret_paths::AMT_PASSWORD,
        "acme-vault-secret",
    );
    let assembler = fixture.assembler(Arc::new(secrets), EventBus::new());

    let foreign = assembler.assemble("office", "other", None).await?;
    assert_eq!(foreign.configuration.amt_specific.admin_password, "other-stored");

    let own = assembler.assemble("office", TENANT, None).await?;
    assert_eq!(own.configuration.amt_specific.admin_password, "acme-vault-secret");
    Ok(())
}

#[tokio::test]
async fn wifi_and_proxies_follow_priority_order() -> Result<()> {
    let assembler = Fixture::new().assembler(Arc::new(MemoryResolver::new()), EventBus::new());
    let document = assembler.assemble("office", TENANT, None).await?;

    let wifi = &document.configuration.network.wireless.profiles;
    let names: Vec<_> = wifi.iter().map(|entry| entry.profile_name.as_str()).collect();
    assert_eq!(names, ["guest", "corp-wifi"]);
    assert_eq!(wifi[0].priority, 1);
    assert_eq!(wifi[0].psk_passphrase, "passphrase");
    assert_eq!(wifi[1].ieee8021x_profile_name, "wifi-eap");

    let proxies = &document.configuration.network.proxies;
    assert_eq!(proxies.len(), 1);
    assert_eq!(proxies[0].address, "proxy.example.com");
    assert_eq!(proxies[0].info_format, 201);

    let eap: Vec<_> = document
        .configuration
        .ieee8021x_profiles
        .iter()
        .map(|entry| entry.profile_name.as_str())
        .collect();
    assert_eq!(eap, ["wired-eap", "wifi-eap"]);
    Ok(())
}

#[tokio::test]
async fn admin_mode_merges_certificate_from_secret_store() -> Result<()> {
    let mut fixture = Fixture::new();
    fixture.profiles = vec![profile("office", Activation::Acm)];
    let secrets = MemoryResolver::new().with_secret(
        &secret_paths::cert_path(TENANT, "corp"),
        secret_paths::CERT,
        "vault-cert",
    );
    let assembler = fixture.assembler(Arc::new(secrets), EventBus::new());

    let document = assembler.assemble("office", TENANT, Some("corp")).await?;
    let amt = &document.configuration.amt_specific;
    assert_eq!(amt.control_mode, "acmactivate");
    assert_eq!(amt.provisioning_cert, "vault-cert");
    assert_eq!(amt.provisioning_cert_pwd, "stored-cert-pwd");
    assert_eq!(amt.domain_suffix, "corp.example.com");
    Ok(())
}

#[tokio::test]
async fn admin_mode_with_unknown_domain_exports_without_certificate() -> Result<()> {
    let mut fixture = Fixture::new();
    fixture.profiles = vec![profile("office", Activation::Acm)];
    let assembler = fixture.assembler(Arc::new(MemoryResolver::new()), EventBus::new());

    let document = assembler.assemble("office", TENANT, Some("missing")).await?;
    assert!(document.configuration.amt_specific.provisioning_cert.is_empty());
    assert!(document.configuration.amt_specific.domain_suffix.is_empty());
    Ok(())
}

#[tokio::test]
async fn failing_secret_store_falls_back_to_stored_values() -> Result<()> {
    let mut fixture = Fixture::new();
    fixture.profiles = vec![profile("office", Activation::Acm)];
    let assembler = fixture.assembler(Arc::new(MemoryResolver::failing(503)), EventBus::new());

    let document = assembler.assemble("office", TENANT, Some("corp")).await?;
    let amt = &document.configuration.amt_specific;
    assert_eq!(amt.admin_password, "stored-amt");
    assert_eq!(amt.mebx_password, "");
    assert_eq!(amt.provisioning_cert, "stored-cert");
    assert_eq!(
        document.configuration.cira.as_ref().map(|cira| cira.password.as_str()),
        Some("stored-mps")
    );
    Ok(())
}

#[tokio::test]
async fn missing_references_name_the_first_unresolved_kind() -> Result<()> {
    let assembler = Fixture::new().assembler(Arc::new(MemoryResolver::new()), EventBus::new());
    let err = assembler
        .export("absent", TENANT, None)
        .await
        .err()
        .context("missing profile must fail")?;
    assert_eq!(not_found(err), Some(("AMT", "absent".to_string())));

    let other_tenant = assembler
        .assemble("office", "globex", None)
        .await
        .err()
        .context("tenant scoping")?;
    assert_eq!(not_found(other_tenant), Some(("AMT", "office".to_string())));

    let mut fixture = Fixture::new();
    let mut orphan = profile("office", Activation::Ccm);
    orphan.cira_config_name = Some("gone".into());
    fixture.profiles = vec![orphan];
    let err = fixture
        .assembler(Arc::new(MemoryResolver::new()), EventBus::new())
        .assemble("office", TENANT, None)
        .await
        .err()
        .context("missing cira")?;
    assert_eq!(not_found(err), Some(("CIRA", "gone".to_string())));

    let mut fixture = Fixture::new();
    fixture.wifi_edges.push(AssociationEntry::new("ghost", 3));
    let err = fixture
        .assembler(Arc::new(MemoryResolver::new()), EventBus::new())
        .assemble("office", TENANT, None)
        .await
        .err()
        .context("missing wireless")?;
    assert_eq!(not_found(err), Some(("Wireless", "ghost".to_string())));

    let mut fixture = Fixture::new();
    fixture.proxy_edges = vec![AssociationEntry::new("nowhere", 1)];
    let err = fixture
        .assembler(Arc::new(MemoryResolver::new()), EventBus::new())
        .assemble("office", TENANT, None)
        .await
        .err()
        .context("missing proxy")?;
    assert_eq!(not_found(err), Some(("Proxy", "nowhere".to_string())));

    let mut fixture = Fixture::new();
    fixture.wireless = vec![wireless("guest", None), wireless("corp-wifi", Some("lost-eap"))];
    let err = fixture
        .assembler(Arc::new(MemoryResolver::new()), EventBus::new())
        .assemble("office", TENANT, None)
        .await
        .err()
        .context("missing 802.1x")?;
    assert_eq!(not_found(err), Some(("802.1x", "lost-eap".to_string())));
    Ok(())
}

#[tokio::test]
async fn store_failures_abort_without_publishing() -> Result<()> {
    let mut fixture = Fixture::new();
    let events = EventBus::new();
    let assembler = fixture.assembler(Arc::new(MemoryResolver::new()), events.clone());
    fixture
        .wireless_repo
        .as_ref()
        .context("wireless repo captured")?
        .fail_reads();

    let err = assembler
        .export("office", TENANT, None)
        .await
        .err()
        .context("read failure must surface")?;
    assert!(matches!(
        err,
        ExportError::Data(DataError::UnexpectedPersistence { .. })
    ));
    assert!(events.backlog_since(0).is_empty());
    Ok(())
}
