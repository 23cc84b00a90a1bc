//! Export failures.

use rps_data::{DataError, ErrorClass};
use thiserror::Error;

/// Result alias for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Errors surfaced by [`crate::ExportAssembler`].
///
/// Secret lookup failures never appear here; they degrade to stored or
/// empty values.
#[derive(Debug, Error)]
pub enum ExportError {
    /// A referenced row is missing or the store failed.
    #[error(transparent)]
    Data(#[from] DataError),
    /// The resolved document could not be serialized.
    #[error("export document could not be encoded")]
    Encode {
        /// YAML serializer error.
        #[source]
        source: serde_yaml::Error,
    },
    /// Randomness or sealing failed.
    #[error("export document could not be encrypted")]
    Encrypt {
        /// Step that failed.
        stage: &'static str,
        /// Opaque crypto error.
        #[source]
        source: ring::error::Unspecified,
    },
}

impl ExportError {
    /// Classification used to choose an outward status.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Data(err) => err.class(),
            Self::Encode { .. } | Self::Encrypt { .. } => ErrorClass::Internal,
        }
    }
}
