//! Error types for configuration loading.

use thiserror::Error;

/// Primary error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable was not set or was blank.
    #[error("missing environment configuration")]
    MissingEnv {
        /// Name of the missing variable.
        name: &'static str,
    },
    /// An environment variable held a value that could not be parsed.
    #[error("invalid configuration value")]
    InvalidValue {
        /// Name of the offending variable.
        name: &'static str,
        /// Offending value.
        value: String,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_messages_are_constant() {
        let missing = ConfigError::MissingEnv {
            name: "DATABASE_URL",
        };
        assert_eq!(missing.to_string(), "missing environment configuration");

        let invalid = ConfigError::InvalidValue {
            name: "DATABASE_MAX_CONNECTIONS",
            value: "lots".into(),
            reason: "expected unsigned integer",
        };
        assert_eq!(invalid.to_string(), "invalid configuration value");
    }
}
