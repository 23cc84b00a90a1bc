//! Fallback values applied when an environment variable is unset.

/// Maximum number of pooled Postgres connections.
pub const DATABASE_MAX_CONNECTIONS: u32 = 8;
/// Seconds to wait for a pooled connection before failing.
pub const DATABASE_ACQUIRE_TIMEOUT_SECS: u64 = 10;
/// Whether TLS peers must present a verifiable certificate.
pub const POSTGRES_SSL_REJECT_UNAUTHORIZED: bool = true;
/// Vault KV-v2 mount prefix prepended to every secret path.
pub const SECRETS_PATH: &str = "secret/data/";
/// Default log level.
pub const LOG_LEVEL: &str = "info";
