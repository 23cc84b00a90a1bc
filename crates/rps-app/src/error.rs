//! Failures raised while wiring the service together.
//!
//! Messages stay constant; the failing step is carried in `operation`.

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: rps_config::ConfigError,
    },
    /// Logging could not be installed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: rps_telemetry::TelemetryError,
    },
    /// The database could not be reached or migrated.
    #[error("data store operation failed")]
    Data {
        /// Operation identifier.
        operation: &'static str,
        /// Source data error.
        source: rps_data::DataError,
    },
    /// The secret store client could not be built.
    #[error("secret store operation failed")]
    Secrets {
        /// Operation identifier.
        operation: &'static str,
        /// Source secret error.
        source: rps_secrets::SecretError,
    },
}

impl AppError {
    pub(crate) const fn config(operation: &'static str, source: rps_config::ConfigError) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: rps_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn data(operation: &'static str, source: rps_data::DataError) -> Self {
        Self::Data { operation, source }
    }

    pub(crate) const fn secrets(operation: &'static str, source: rps_secrets::SecretError) -> Self {
        Self::Secrets { operation, source }
    }

    /// Step that failed.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Config { operation, .. }
            | Self::Telemetry { operation, .. }
            | Self::Data { operation, .. }
            | Self::Secrets { operation, .. } => operation,
        }
    }
}
