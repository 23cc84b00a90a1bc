use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Wireless network the device may join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WirelessProfile {
    /// Unique name within the tenant.
    pub name: String,
    /// Authentication method code (WPA-PSK, WPA2-IEEE8021x, ...).
    pub authentication_method: i32,
    /// Encryption method code (TKIP, CCMP).
    pub encryption_method: i32,
    /// Network SSID.
    pub ssid: String,
    /// Pre-shared key for PSK methods.
    #[serde(default, skip_serializing)]
    pub psk_passphrase: Option<String>,
    /// Link policy codes.
    #[serde(default)]
    pub link_policy: Vec<i32>,
    /// Linked 802.1x profile for enterprise methods.
    #[serde(default)]
    pub ieee8021x_profile_name: Option<String>,
    /// Owning tenant.
    pub tenant_id: String,
    /// Assigned by the store on insert.
    #[serde(default)]
    pub creation_date: Option<DateTime<Utc>>,
}
