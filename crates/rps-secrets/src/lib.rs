#![forbid(unsafe_code)]
#![warn(
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Secret lookup used to enrich exports with passwords and certificates.
//!
//! Callers treat every failure as degradable: a missing or unreachable
//! secret never aborts the operation that asked for it.

pub mod error;
pub mod memory;
pub mod resolver;
pub mod vault;

pub use error::{SecretError, SecretResult};
pub use memory::{MemoryResolver, NullResolver};
pub use resolver::{SecretRecord, SecretResolver, resolver_for};
pub use vault::VaultResolver;
