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

//! Profile export: reference resolution, secret substitution, and
//! authenticated encryption of the resulting YAML document.
//!
//! Layout: `assembler.rs` (resolution pipeline), `document.rs` (exported
//! shape), `cipher.rs` (AES-256-GCM sealing), `error.rs`.

pub mod assembler;
pub mod cipher;
pub mod document;
pub mod error;

pub use assembler::{ExportAssembler, ExportBundle, ExportSources, secret_paths};
pub use cipher::{DocumentCipher, EncryptedDocument, KEY_LEN, NONCE_LEN, TAG_LEN};
pub use document::ExportDocument;
pub use error::{ExportError, ExportResult};
