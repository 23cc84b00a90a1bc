use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Provisioning domain used for admin control mode activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    /// Unique name within the tenant.
    pub name: String,
    /// DNS suffix the device must see to trust the certificate.
    pub domain_suffix: String,
    /// Certificate blob when stored inline rather than in the secret store.
    #[serde(default, skip_serializing)]
    pub provisioning_cert: Option<String>,
    /// Encoding of the certificate blob (`string`, `raw`).
    pub provisioning_cert_storage_format: String,
    /// Certificate password when stored inline.
    #[serde(default, skip_serializing)]
    pub provisioning_cert_key: Option<String>,
    /// Certificate expiry.
    #[serde(default)]
    pub expiration_date: Option<DateTime<Utc>>,
    /// Owning tenant.
    pub tenant_id: String,
    /// Assigned by the store on insert.
    #[serde(default)]
    pub creation_date: Option<DateTime<Utc>>,
}
