//! CLI command handlers, one file per command.

mod derive_key;
mod verify;
mod verify_content;

pub use derive_key::run_derive_key;
pub use verify::run_verify;
pub use verify_content::{run_verify_content, ContentArgs};

pub(crate) use derive_key::parse_key_material;
#[cfg(test)]
pub(crate) use verify::content_dir;
