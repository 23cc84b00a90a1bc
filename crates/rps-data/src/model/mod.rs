//! Row types for every provisioning configuration table.

mod cira;
mod domain;
mod ieee8021x;
mod profile;
mod proxy;
mod wireless;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub use cira::CiraConfig;
pub use domain::Domain;
pub use ieee8021x::Ieee8021xProfile;
pub use profile::{Activation, AmtProfile};
pub use proxy::{InfoFormat, ProxyConfig, ValidationError};
pub use wireless::WirelessProfile;

/// One ordered edge from a profile to a referenced configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AssociationEntry {
    /// Name of the referenced wireless or proxy configuration.
    pub name: String,
    /// Apply order; lower values first.
    pub priority: i32,
}

impl AssociationEntry {
    /// Convenience constructor.
    #[must_use]
    pub fn new(name: impl Into<String>, priority: i32) -> Self {
        Self {
            name: name.into(),
            priority,
        }
    }
}
