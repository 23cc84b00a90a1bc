use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Control mode the device is activated into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    /// Admin control mode; needs a provisioning domain.
    #[serde(rename = "acmactivate")]
    Acm,
    /// Client control mode.
    #[serde(rename = "ccmactivate")]
    Ccm,
}

impl Activation {
    /// Value stored in the `activation` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Acm => "acmactivate",
            Self::Ccm => "ccmactivate",
        }
    }
}

impl Display for Activation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Activation {
    type Error = UnknownActivation;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "acmactivate" => Ok(Self::Acm),
            "ccmactivate" => Ok(Self::Ccm),
            _ => Err(UnknownActivation(value)),
        }
    }
}

/// Raised when a stored activation mode is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownActivation(pub String);

impl Display for UnknownActivation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "unknown activation mode {}", self.0)
    }
}

impl std::error::Error for UnknownActivation {}

/// AMT profile: the aggregate an export is built from.
///
/// Ordered wireless and proxy lists live in their association tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AmtProfile {
    /// Unique name within the tenant.
    pub name: String,
    /// Activation mode.
    #[sqlx(try_from = "String")]
    pub activation: Activation,
    /// AMT admin password when not held in the secret store.
    #[serde(default, skip_serializing)]
    pub amt_password: Option<String>,
    /// Ask the device to generate its own admin password.
    #[serde(default)]
    pub generate_random_password: bool,
    /// MEBX password when not held in the secret store.
    #[serde(default, skip_serializing)]
    pub mebx_password: Option<String>,
    /// Ask the device to generate its own MEBX password.
    #[serde(default)]
    pub generate_random_mebx_password: bool,
    /// Referenced CIRA configuration.
    #[serde(default)]
    pub cira_config_name: Option<String>,
    /// Referenced 802.1x profile for the wired interface.
    #[serde(default)]
    pub ieee8021x_profile_name: Option<String>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// DHCP on the wired interface.
    pub dhcp_enabled: bool,
    /// Keep the AMT IP in sync with the host OS.
    #[serde(default)]
    pub ip_sync_enabled: bool,
    /// Sync wireless profiles from the host OS.
    #[serde(default)]
    pub local_wifi_sync_enabled: bool,
    /// TLS mode code, when TLS is used instead of CIRA.
    #[serde(default)]
    pub tls_mode: Option<i32>,
    /// Who signs the TLS certificate.
    #[serde(default)]
    pub tls_signing_authority: Option<String>,
    /// User consent policy (`kvm`, `all`, `none`).
    #[serde(default)]
    pub user_consent: Option<String>,
    /// IDE redirection.
    #[serde(default)]
    pub ider_enabled: bool,
    /// Keyboard, video, mouse redirection.
    #[serde(default)]
    pub kvm_enabled: bool,
    /// Serial over LAN.
    #[serde(default)]
    pub sol_enabled: bool,
    /// Owning tenant.
    pub tenant_id: String,
    /// Assigned by the store on insert.
    #[serde(default)]
    pub creation_date: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_parses_stored_values() {
        assert_eq!(
            Activation::try_from("acmactivate".to_string()),
            Ok(Activation::Acm)
        );
        assert_eq!(
            Activation::try_from("ccmactivate".to_string()),
            Ok(Activation::Ccm)
        );
        assert!(Activation::try_from("activate".to_string()).is_err());
        assert_eq!(Activation::Acm.to_string(), "acmactivate");
    }

    #[test]
    fn secrets_are_not_serialized() {
        let profile: AmtProfile = serde_json::from_value(serde_json::json!({
            "name": "office",
            "activation": "ccmactivate",
            "amtPassword": "P@ssw0rd",
            "mebxPassword": "M3bx!pass",
            "dhcpEnabled": true,
            "tenantId": ""
        }))
        .expect("deserialize");
        assert_eq!(profile.amt_password.as_deref(), Some("P@ssw0rd"));
        let json = serde_json::to_string(&profile).expect("serialize");
        assert!(!json.contains("P@ssw0rd"));
        assert!(!json.contains("M3bx"));
        assert!(json.contains("\"activation\":\"ccmactivate\""));
    }
}
