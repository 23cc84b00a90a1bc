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

//! Provisioning service wiring.
//!
//! Layout: `bootstrap.rs` (environment to running services), `error.rs`.

/// Service construction from configuration.
pub mod bootstrap;
/// Application-level errors.
pub mod error;

pub use bootstrap::{Services, bootstrap};
pub use error::{AppError, AppResult};
