use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 802.1x credentials for wired or wireless authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Ieee8021xProfile {
    /// Unique name within the tenant.
    pub name: String,
    /// EAP method code.
    pub auth_protocol: i32,
    /// Expected RADIUS server name.
    #[serde(default)]
    pub server_name: Option<String>,
    /// Authentication domain.
    #[serde(default)]
    pub domain: Option<String>,
    /// Identity presented to the authenticator.
    #[serde(default)]
    pub username: Option<String>,
    /// Password for password-based methods.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    /// Outer identity.
    #[serde(default)]
    pub roaming_identity: Option<String>,
    /// Whether the profile applies while the host is in S0.
    pub active_in_s0: bool,
    /// PXE timeout in seconds, wired profiles only.
    #[serde(default)]
    pub pxe_timeout: Option<i32>,
    /// `true` for the wired interface, `false` for wireless.
    pub wired_interface: bool,
    /// Owning tenant.
    pub tenant_id: String,
    /// Assigned by the store on insert.
    #[serde(default)]
    pub creation_date: Option<DateTime<Utc>>,
}
