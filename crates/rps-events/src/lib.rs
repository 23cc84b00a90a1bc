#![forbid(unsafe_code)]
#![warn(
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

//! Notification bus for provisioning configuration changes.
//!
//! Repositories publish an event after every successful mutation and the
//! export pipeline publishes one per bundle produced. Delivery is
//! fire-and-forget: a bus without subscribers never fails the publisher.
//! Layout: `payloads.rs` (event types), `routing.rs` (bus + replay),
//! `error.rs` (delivery errors).

pub mod error;
pub mod payloads;
pub mod routing;

pub use error::{EventBusError, EventBusResult};
pub use payloads::{DEFAULT_REPLAY_CAPACITY, Event, EventEnvelope, EventId};
pub use routing::{EventBus, EventStream};
