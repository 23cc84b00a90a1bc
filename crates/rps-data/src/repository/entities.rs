//! Table bindings for each entity kind.

use crate::gateway::PgQuery;
use crate::model::{
    AmtProfile, CiraConfig, Domain, Ieee8021xProfile, ProxyConfig, WirelessProfile,
};

use super::{Entity, Reference};

impl Entity for ProxyConfig {
    const KIND: &'static str = "Proxy";
    const TABLE: &'static str = "proxyconfigs";
    const COLUMNS: &'static [&'static str] =
        &["access_info", "info_format", "port", "network_dns_suffix"];
    const REFERENCES: &'static [Reference] = &[Reference {
        table: "profiles_proxyconfigs",
        column: "proxy_config_name",
    }];

    fn name(&self) -> &str {
        &self.name
    }

    fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(&self.access_info)
            .bind(self.info_format.code())
            .bind(i32::from(self.port))
            .bind(&self.network_dns_suffix)
    }
}

impl Entity for CiraConfig {
    const KIND: &'static str = "CIRA";
    const TABLE: &'static str = "ciraconfigs";
    const COLUMNS: &'static [&'static str] = &[
        "mps_server_address",
        "mps_port",
        "user_name",
        "password",
        "common_name",
        "server_address_format",
        "auth_method",
        "mps_root_certificate",
        "proxy_details",
    ];
    const REFERENCES: &'static [Reference] = &[Reference {
        table: "profiles",
        column: "cira_config_name",
    }];

    fn name(&self) -> &str {
        &self.name
    }

    fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(&self.mps_server_address)
            .bind(i32::from(self.mps_port))
            .bind(&self.user_name)
            .bind(self.password.as_deref())
            .bind(&self.common_name)
            .bind(self.server_address_format)
            .bind(self.auth_method)
            .bind(&self.mps_root_certificate)
            .bind(&self.proxy_details)
    }
}

impl Entity for Domain {
    const KIND: &'static str = "Domain";
    const TABLE: &'static str = "domains";
    const COLUMNS: &'static [&'static str] = &[
        "domain_suffix",
        "provisioning_cert",
        "provisioning_cert_storage_format",
        "provisioning_cert_key",
        "expiration_date",
    ];
    const REFERENCES: &'static [Reference] = &[];

    fn name(&self) -> &str {
        &self.name
    }

    fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(&self.domain_suffix)
            .bind(self.provisioning_cert.as_deref())
            .bind(&self.provisioning_cert_storage_format)
            .bind(self.provisioning_cert_key.as_deref())
            .bind(self.expiration_date)
    }
}

impl Entity for WirelessProfile {
    const KIND: &'static str = "Wireless";
    const TABLE: &'static str = "wirelessconfigs";
    const COLUMNS: &'static [&'static str] = &[
        "authentication_method",
        "encryption_method",
        "ssid",
        "psk_passphrase",
        "link_policy",
        "ieee8021x_profile_name",
    ];
    const REFERENCES: &'static [Reference] = &[Reference {
        table: "profiles_wirelessconfigs",
        column: "wireless_profile_name",
    }];

    fn name(&self) -> &str {
        &self.name
    }

    fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.authentication_method)
            .bind(self.encryption_method)
            .bind(&self.ssid)
            .bind(self.psk_passphrase.as_deref())
            .bind(&self.link_policy)
            .bind(self.ieee8021x_profile_name.as_deref())
    }
}

impl Entity for Ieee8021xProfile {
    const KIND: &'static str = "802.1x";
    const TABLE: &'static str = "ieee8021xconfigs";
    const COLUMNS: &'static [&'static str] = &[
        "auth_protocol",
        "server_name",
        "domain",
        "username",
        "password",
        "roaming_identity",
        "active_in_s0",
        "pxe_timeout",
        "wired_interface",
    ];
    const REFERENCES: &'static [Reference] = &[
        Reference {
            table: "profiles",
            column: "ieee8021x_profile_name",
        },
        Reference {
            table: "wirelessconfigs",
            column: "ieee8021x_profile_name",
        },
    ];

    fn name(&self) -> &str {
        &self.name
    }

    fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.auth_protocol)
            .bind(self.server_name.as_deref())
            .bind(self.domain.as_deref())
            .bind(self.username.as_deref())
            .bind(self.password.as_deref())
            .bind(self.roaming_identity.as_deref())
            .bind(self.active_in_s0)
            .bind(self.pxe_timeout)
            .bind(self.wired_interface)
    }
}

impl Entity for AmtProfile {
    const KIND: &'static str = "AMT";
    const TABLE: &'static str = "profiles";
    const COLUMNS: &'static [&'static str] = &[
        "activation",
        "amt_password",
        "generate_random_password",
        "mebx_password",
        "generate_random_mebx_password",
        "cira_config_name",
        "ieee8021x_profile_name",
        "tags",
        "dhcp_enabled",
        "ip_sync_enabled",
        "local_wifi_sync_enabled",
        "tls_mode",
        "tls_signing_authority",
        "user_consent",
        "ider_enabled",
        "kvm_enabled",
        "sol_enabled",
    ];
    const REFERENCES: &'static [Reference] = &[
        Reference {
            table: "profiles_wirelessconfigs",
            column: "profile_name",
        },
        Reference {
            table: "profiles_proxyconfigs",
            column: "profile_name",
        },
    ];

    fn name(&self) -> &str {
        &self.name
    }

    fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    fn bind_columns<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.activation.as_str())
            .bind(self.amt_password.as_deref())
            .bind(self.generate_random_password)
            .bind(self.mebx_password.as_deref())
            .bind(self.generate_random_mebx_password)
            .bind(self.cira_config_name.as_deref())
            .bind(self.ieee8021x_profile_name.as_deref())
            .bind(&self.tags)
            .bind(self.dhcp_enabled)
            .bind(self.ip_sync_enabled)
            .bind(self.local_wifi_sync_enabled)
            .bind(self.tls_mode)
            .bind(self.tls_signing_authority.as_deref())
            .bind(self.user_consent.as_deref())
            .bind(self.ider_enabled)
            .bind(self.kvm_enabled)
            .bind(self.sol_enabled)
    }
}
