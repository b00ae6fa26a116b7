//! Content integrity and title key decryption for downloaded console titles.
//!
//! [`key`] unwraps the per-title content key; [`verify`] checks a content file
//! chunk by chunk against its four-level SHA-1 hash tree. [`batch`] runs many
//! verifications of one title with bounded parallelism.

pub mod config;
pub mod logging;

pub mod batch;
pub mod content;
pub mod error;
pub mod key;
pub mod layout;
pub mod manifest;
pub mod report;
pub mod tree;
pub mod verify;

pub use content::{ContentDescriptor, ContentPaths};
pub use error::{FileKind, IntegrityError, KeyDerivationError};
pub use key::{derive_key, derive_key_with, ContentKey, EncryptedKeyMaterial, TitleId};
pub use layout::HashLevel;
pub use report::IntegrityReport;
pub use verify::{verify, verify_with_progress, ChunkProgress};
