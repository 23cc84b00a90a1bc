//! Error types for secret resolution.

use thiserror::Error;

/// Result alias for secret lookups.
pub type SecretResult<T> = Result<T, SecretError>;

/// Failures while talking to a secret store.
#[derive(Debug, Error)]
pub enum SecretError {
    /// The HTTP client could not be constructed.
    #[error("secret store client could not be built")]
    Client {
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
    /// The secret path does not form a valid URL.
    #[error("secret path {path} is not addressable: {reason}")]
    InvalidPath {
        /// Logical secret path.
        path: String,
        /// Why the path was refused.
        reason: &'static str,
    },
    /// The request never produced a response.
    #[error("secret store unreachable")]
    Transport {
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },
    /// The store answered with an unexpected status.
    #[error("secret store returned status {status} for {path}")]
    Status {
        /// Logical secret path.
        path: String,
        /// HTTP status code.
        status: u16,
    },
    /// The response body was not a KV-v2 envelope.
    #[error("secret store response for {path} could not be decoded")]
    Decode {
        /// Logical secret path.
        path: String,
        /// Body decode failure.
        #[source]
        source: reqwest::Error,
    },
}
