//! Error taxonomy surfaced by repositories and the store.
//!
//! Every failure maps to exactly one variant. Messages are constant per
//! variant and never carry driver text or SQL; the driver error stays
//! reachable through [`std::error::Error::source`] for logs only.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Result alias for data layer operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Coarse grouping used by outer layers to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The caller asked for something absent or supplied an unusable request.
    CallerInput,
    /// The request conflicts with the current stored state.
    StateConflict,
    /// The store failed in a way the caller cannot act on.
    Internal,
}

/// Errors raised by the data access layer.
#[derive(Debug)]
pub enum DataError {
    /// A named entity does not exist for the tenant.
    NotFound {
        /// Entity kind label (for example `Proxy`).
        kind: &'static str,
        /// Requested name.
        name: String,
    },
    /// A row with the same `(name, tenant)` key already exists.
    DuplicateKey {
        /// Entity kind label.
        kind: &'static str,
        /// Conflicting name.
        name: String,
    },
    /// The operation would break a reference between rows.
    ReferentialConstraint {
        /// Entity kind label.
        kind: &'static str,
        /// Name of the referenced or referencing row.
        name: String,
        /// Constraint detail reported by the store, when available.
        detail: Option<String>,
    },
    /// A write matched no rows although the caller expected one.
    ConcurrencyConflict {
        /// Entity kind label.
        kind: &'static str,
        /// Name of the row being written.
        name: String,
        /// Latest stored state, serialized for client-side reconciliation.
        latest: Option<serde_json::Value>,
    },
    /// A bulk association write was called with nothing to write.
    EmptyBatch {
        /// Association kind label.
        kind: &'static str,
    },
    /// Any other store failure.
    UnexpectedPersistence {
        /// Operation label.
        operation: &'static str,
        /// Entity kind label.
        kind: &'static str,
        /// Underlying driver error.
        source: sqlx::Error,
    },
    /// Schema migrations could not be applied.
    MigrationFailed {
        /// Underlying migration error.
        source: sqlx::migrate::MigrateError,
    },
}

impl DataError {
    /// Classification used to choose an outward status.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::NotFound { .. } | Self::EmptyBatch { .. } => ErrorClass::CallerInput,
            Self::DuplicateKey { .. }
            | Self::ReferentialConstraint { .. }
            | Self::ConcurrencyConflict { .. } => ErrorClass::StateConflict,
            Self::UnexpectedPersistence { .. } | Self::MigrationFailed { .. } => {
                ErrorClass::Internal
            }
        }
    }

    pub(crate) fn unexpected(
        operation: &'static str,
        kind: &'static str,
        source: sqlx::Error,
    ) -> Self {
        Self::UnexpectedPersistence {
            operation,
            kind,
            source,
        }
    }
}

impl Display for DataError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { kind, name } => write!(formatter, "{kind} {name} not found"),
            Self::DuplicateKey { kind, name } => {
                write!(formatter, "{kind} {name} already exists")
            }
            Self::ReferentialConstraint { kind, name, .. } => {
                write!(
                    formatter,
                    "{kind} {name} is involved in a reference that cannot be satisfied"
                )
            }
            Self::ConcurrencyConflict { kind, name, .. } => write!(
                formatter,
                "{kind} {name} was changed by another request; reload and retry"
            ),
            Self::EmptyBatch { kind } => write!(formatter, "no {kind} associations supplied"),
            Self::UnexpectedPersistence {
                operation, kind, ..
            } => write!(formatter, "unexpected failure during {operation} of {kind}"),
            Self::MigrationFailed { .. } => formatter.write_str("migration failed"),
        }
    }
}

impl Error for DataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UnexpectedPersistence { source, .. } => Some(source),
            Self::MigrationFailed { source } => Some(source),
            Self::NotFound { .. }
            | Self::DuplicateKey { .. }
            | Self::ReferentialConstraint { .. }
            | Self::ConcurrencyConflict { .. }
            | Self::EmptyBatch { .. } => None,
        }
    }
}
