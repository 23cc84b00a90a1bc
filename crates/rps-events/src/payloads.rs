//! Event payload types carried across the provisioning service.

use chrono::{DateTime, Utc};

/// Identifier assigned to each event emitted by the service.
pub type EventId = u64;

/// Default buffer size for the in-memory replay ring.
pub const DEFAULT_REPLAY_CAPACITY: usize = 1_024;

/// Typed notifications describing configuration changes.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A configuration row was inserted.
    Created {
        /// Entity kind label (`Proxy`, `CIRA`, `Wireless`, ...).
        kind: String,
        /// Name of the created row.
        name: String,
        /// Tenant owning the row.
        tenant_id: String,
    },
    /// A configuration row had its mutable columns replaced.
    Updated {
        /// Entity kind label.
        kind: String,
        /// Name of the updated row.
        name: String,
        /// Tenant owning the row.
        tenant_id: String,
    },
    /// A configuration row was removed.
    Deleted {
        /// Entity kind label.
        kind: String,
        /// Name of the removed row.
        name: String,
        /// Tenant owning the row.
        tenant_id: String,
    },
    /// The association rows of a profile were replaced in bulk.
    AssociationsReplaced {
        /// Association kind label (`Proxy` or `Wireless`).
        kind: String,
        /// Owning profile name.
        profile_name: String,
        /// Number of rows written.
        count: usize,
        /// Tenant owning the rows.
        tenant_id: String,
    },
    /// The association rows of a profile were removed.
    AssociationsDeleted {
        /// Association kind label.
        kind: String,
        /// Owning profile name.
        profile_name: String,
        /// Tenant owning the rows.
        tenant_id: String,
    },
    /// An encrypted export bundle was produced for a profile.
    ProfileExported {
        /// Exported profile name.
        profile_name: String,
        /// Tenant owning the profile.
        tenant_id: String,
    },
}

impl Event {
    /// Machine-friendly discriminator for downstream relays.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::Updated { .. } => "updated",
            Self::Deleted { .. } => "deleted",
            Self::AssociationsReplaced { .. } => "associations_replaced",
            Self::AssociationsDeleted { .. } => "associations_deleted",
            Self::ProfileExported { .. } => "profile_exported",
        }
    }

    /// Human-readable summary, mirroring the operation and affected entity.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Created { kind, name, .. } => format!("Created {kind} configuration: {name}"),
            Self::Updated { kind, name, .. } => format!("Updated {kind} configuration: {name}"),
            Self::Deleted { kind, name, .. } => format!("Deleted {kind} configuration: {name}"),
            Self::AssociationsReplaced {
                kind,
                profile_name,
                count,
                ..
            } => format!("Replaced {count} {kind} associations for profile: {profile_name}"),
            Self::AssociationsDeleted {
                kind, profile_name, ..
            } => format!("Deleted {kind} associations for profile: {profile_name}"),
            Self::ProfileExported { profile_name, .. } => {
                format!("Exported profile: {profile_name}")
            }
        }
    }
}

/// Metadata wrapper around events. Each envelope tracks the event id and
/// emission timestamp.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct EventEnvelope {
    /// Monotonic identifier assigned by the bus.
    pub id: EventId,
    /// Emission timestamp.
    pub timestamp: DateTime<Utc>,
    /// Event payload.
    pub event: Event,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = Event::Deleted {
            kind: "Proxy".into(),
            name: "p1".into(),
            tenant_id: String::new(),
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], "deleted");
        assert_eq!(json["name"], "p1");
    }

    #[test]
    fn messages_name_operation_and_entity() {
        let event = Event::AssociationsReplaced {
            kind: "Wireless".into(),
            profile_name: "office".into(),
            count: 2,
            tenant_id: "t1".into(),
        };
        assert_eq!(
            event.message(),
            "Replaced 2 Wireless associations for profile: office"
        );
        assert_eq!(event.kind(), "associations_replaced");
    }
}
