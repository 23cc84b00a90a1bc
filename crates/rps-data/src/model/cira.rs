use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Client-initiated remote access settings: where the device dials home.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CiraConfig {
    /// Unique name within the tenant.
    pub name: String,
    /// MPS host the device connects to.
    pub mps_server_address: String,
    /// MPS port.
    #[sqlx(try_from = "i32")]
    pub mps_port: u16,
    /// MPS user name.
    pub user_name: String,
    /// MPS password when not held in the secret store.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    /// Common name on the MPS certificate.
    #[serde(default)]
    pub common_name: String,
    /// Address format code (3 IPv4, 201 FQDN).
    pub server_address_format: i32,
    /// Authentication method code.
    pub auth_method: i32,
    /// PEM body of the MPS root certificate.
    #[serde(default)]
    pub mps_root_certificate: String,
    /// Free-form proxy details passed to the device.
    #[serde(default)]
    pub proxy_details: String,
    /// Owning tenant.
    pub tenant_id: String,
    /// Assigned by the store on insert.
    #[serde(default)]
    pub creation_date: Option<DateTime<Utc>>,
}
