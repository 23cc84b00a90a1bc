//! Shape of the exported profile document.
//!
//! Field order is the serialization order, so the YAML output is stable for
//! identical inputs.

use rps_data::{AmtProfile, CiraConfig, Ieee8021xProfile, ProxyConfig, WirelessProfile};
use serde::Serialize;

/// Seconds the device waits before switching to TLS.
pub const TLS_DELAY_SECS: u32 = 3;

/// Fully resolved profile, ready for serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    /// Profile name.
    pub name: String,
    /// Resolved configuration sections.
    pub configuration: Configuration,
}

/// Top-level configuration sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    /// Profile-wide settings.
    pub general: General,
    /// Wired, wireless, and proxy settings.
    pub network: Network,
    /// 802.1x credentials referenced anywhere in the profile.
    pub ieee8021x_profiles: Vec<Ieee8021xEntry>,
    /// Transport security.
    pub tls: Tls,
    /// Redirection services and consent.
    pub redirection: Redirection,
    /// Remote access endpoint, when the profile uses CIRA.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cira: Option<Cira>,
    /// Activation credentials.
    pub amt_specific: AmtSpecific,
}

/// Profile-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct General {
    /// Free-form tags.
    pub tags: Vec<String>,
}

/// Network section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    /// Wired interface settings.
    pub wired: Wired,
    /// Wireless interface settings.
    pub wireless: Wireless,
    /// Proxies in apply order.
    pub proxies: Vec<ProxyEntry>,
}

/// Wired interface settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Wired {
    /// DHCP addressing.
    pub dhcp_enabled: bool,
    /// Static addressing; the inverse of `dhcp_enabled`.
    pub static_enabled: bool,
    /// Keep the AMT address in sync with the host.
    pub ip_sync_enabled: bool,
    /// Linked 802.1x profile, empty when none.
    pub ieee8021x_profile_name: String,
}

/// Wireless interface settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Wireless {
    /// Sync wireless profiles from the host OS.
    pub wifi_sync_enabled: bool,
    /// Profiles in priority order.
    pub profiles: Vec<WifiEntry>,
}

/// One resolved wireless profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WifiEntry {
    /// Wireless profile name.
    pub profile_name: String,
    /// Network SSID.
    pub ssid: String,
    /// Priority from the association row.
    pub priority: i32,
    /// Authentication method code.
    pub authentication_method: i32,
    /// Encryption method code.
    pub encryption_method: i32,
    /// Pre-shared key, empty for enterprise methods.
    pub psk_passphrase: String,
    /// Linked 802.1x profile, empty when none.
    pub ieee8021x_profile_name: String,
}

impl WifiEntry {
    pub(crate) fn resolved(profile: WirelessProfile, priority: i32) -> Self {
        Self {
            profile_name: profile.name,
            ssid: profile.ssid,
            priority,
            authentication_method: profile.authentication_method,
            encryption_method: profile.encryption_method,
            psk_passphrase: profile.psk_passphrase.unwrap_or_default(),
            ieee8021x_profile_name: profile.ieee8021x_profile_name.unwrap_or_default(),
        }
    }
}

/// One resolved proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyEntry {
    /// Proxy configuration name.
    pub name: String,
    /// Proxy address.
    pub address: String,
    /// Address format code.
    pub info_format: i32,
    /// TCP port.
    pub port: u16,
    /// DNS suffix of the served network.
    pub network_dns_suffix: String,
    /// Priority from the association row.
    pub priority: i32,
}

impl ProxyEntry {
    pub(crate) fn resolved(proxy: ProxyConfig, priority: i32) -> Self {
        Self {
            name: proxy.name,
            address: proxy.access_info,
            info_format: proxy.info_format.code(),
            port: proxy.port,
            network_dns_suffix: proxy.network_dns_suffix,
            priority,
        }
    }
}

/// Resolved 802.1x credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ieee8021xEntry {
    /// 802.1x profile name.
    pub profile_name: String,
    /// EAP method code.
    pub authentication_protocol: i32,
    /// Identity.
    pub username: String,
    /// Password, empty for certificate methods.
    pub password: String,
    /// Expected RADIUS server name.
    pub server_name: String,
    /// Authentication domain.
    pub domain: String,
    /// Outer identity.
    pub roaming_identity: String,
    /// Active while the host is in S0.
    pub active_in_s0: bool,
    /// PXE timeout in seconds.
    pub pxe_timeout: i32,
    /// Applies to the wired interface.
    pub wired_interface: bool,
}

impl From<Ieee8021xProfile> for Ieee8021xEntry {
    fn from(profile: Ieee8021xProfile) -> Self {
        Self {
            profile_name: profile.name,
            authentication_protocol: profile.auth_protocol,
            username: profile.username.unwrap_or_default(),
            password: profile.password.unwrap_or_default(),
            server_name: profile.server_name.unwrap_or_default(),
            domain: profile.domain.unwrap_or_default(),
            roaming_identity: profile.roaming_identity.unwrap_or_default(),
            active_in_s0: profile.active_in_s0,
            pxe_timeout: profile.pxe_timeout.unwrap_or_default(),
            wired_interface: profile.wired_interface,
        }
    }
}

/// Transport security settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tls {
    /// TLS mode code; `0` when TLS is not used.
    pub mode: i32,
    /// Certificate signer, empty when unset.
    pub signing_authority: String,
    /// Seconds to wait before switching to TLS.
    pub delay: u32,
}

impl Tls {
    pub(crate) fn for_profile(profile: &AmtProfile) -> Self {
        Self {
            mode: profile.tls_mode.unwrap_or_default(),
            signing_authority: profile.tls_signing_authority.clone().unwrap_or_default(),
            delay: TLS_DELAY_SECS,
        }
    }
}

/// Redirection services and consent policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Redirection {
    /// Any service enabled.
    pub enabled: bool,
    /// Per-service switches.
    pub services: RedirectionServices,
    /// Consent policy, `kvm` unless the profile overrides it.
    pub user_consent: String,
}

/// Per-service redirection switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectionServices {
    /// Keyboard, video, mouse.
    pub kvm: bool,
    /// Serial over LAN.
    pub sol: bool,
    /// IDE redirection.
    pub ider: bool,
}

impl Redirection {
    pub(crate) fn for_profile(profile: &AmtProfile) -> Self {
        let services = RedirectionServices {
            kvm: profile.kvm_enabled,
            sol: profile.sol_enabled,
            ider: profile.ider_enabled,
        };
        Self {
            enabled: services.kvm || services.sol || services.ider,
            services,
            user_consent: profile
                .user_consent
                .clone()
                .unwrap_or_else(|| "kvm".to_string()),
        }
    }
}

/// Remote access endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cira {
    /// CIRA configuration name.
    pub config_name: String,
    /// MPS address.
    pub mps_address: String,
    /// MPS port.
    pub mps_port: u16,
    /// MPS user name.
    pub username: String,
    /// MPS password, resolved from the secret store when possible.
    pub password: String,
    /// Common name on the MPS certificate.
    pub common_name: String,
    /// Address format code.
    pub server_address_format: i32,
    /// Authentication method code.
    pub auth_method: i32,
    /// MPS root certificate.
    pub mps_root_certificate: String,
    /// Proxy details passed to the device.
    pub proxy_details: String,
}

impl Cira {
    pub(crate) fn resolved(config: CiraConfig, password: String) -> Self {
        Self {
            config_name: config.name,
            mps_address: config.mps_server_address,
            mps_port: config.mps_port,
            username: config.user_name,
            password,
            common_name: config.common_name,
            server_address_format: config.server_address_format,
            auth_method: config.auth_method,
            mps_root_certificate: config.mps_root_certificate,
            proxy_details: config.proxy_details,
        }
    }
}

/// Activation credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmtSpecific {
    /// `acmactivate` or `ccmactivate`.
    pub control_mode: String,
    /// Admin password.
    pub admin_password: String,
    /// Let the device pick a random admin password.
    pub generate_random_password: bool,
    /// MEBX password.
    pub mebx_password: String,
    /// Let the device pick a random MEBX password.
    pub generate_random_mebx_password: bool,
    /// Provisioning certificate (ACM only).
    pub provisioning_cert: String,
    /// Provisioning certificate password (ACM only).
    pub provisioning_cert_pwd: String,
    /// DNS suffix matching the provisioning certificate (ACM only).
    pub domain_suffix: String,
}

/// Certificate material merged in for admin control mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisioningCert {
    /// Certificate blob.
    pub cert: String,
    /// Certificate password.
    pub password: String,
    /// DNS suffix of the domain.
    pub domain_suffix: String,
}
