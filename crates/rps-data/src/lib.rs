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

//! Relational storage for tenant-scoped provisioning configuration.
//!
//! Layout: `gateway.rs` (pooled connection + statement timing), `classify.rs`
//! (constraint code mapping), `error.rs` (caller-facing taxonomy), `model/`
//! (row types), `repository/` (generic entity and association repositories),
//! `store.rs` (facade wiring one repository per table).

pub mod classify;
pub mod error;
pub mod gateway;
pub mod model;
pub mod repository;
pub mod store;

pub use error::{DataError, ErrorClass, Result as DataResult};
pub use gateway::Gateway;
pub use model::{
    Activation, AmtProfile, AssociationEntry, CiraConfig, Domain, Ieee8021xProfile, InfoFormat,
    ProxyConfig, ValidationError, WirelessProfile,
};
pub use repository::{
    AssociationRepository, Entity, EntityRepository, PgAssociationRepository, PgRepository,
    Reference,
};
pub use store::Store;
