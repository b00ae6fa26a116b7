//! Content descriptors and the on-disk naming convention for content files.

use std::path::{Path, PathBuf};

use crate::layout::{self, CHUNK_SIZE};

/// Extension of the encrypted content file.
pub const CONTENT_EXTENSION: &str = "app";
/// Extension of the companion tree file holding the L3 digests.
pub const TREE_EXTENSION: &str = "h3";

/// One content of a title, as described by title metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDescriptor {
    /// Opaque identifier; also the stem of the on-disk file names.
    pub id: String,
    /// Length of the full content in bytes.
    pub size: u64,
    /// Reference digest of the tree file. Only the first 8 bytes are compared.
    pub root_digest: Vec<u8>,
}

impl ContentDescriptor {
    pub fn new(id: impl Into<String>, size: u64, root_digest: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            size,
            root_digest: root_digest.into(),
        }
    }

    /// Number of whole chunks that are verified.
    pub fn chunk_count(&self) -> u64 {
        layout::chunk_count(self.size)
    }

    /// Bytes past the last whole chunk. These are never read or verified.
    pub fn trailing_bytes(&self) -> u64 {
        self.size % CHUNK_SIZE
    }
}

/// Location of the two files that make up one downloaded content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPaths {
    pub content: PathBuf,
    pub tree: PathBuf,
}

impl ContentPaths {
    /// `<dir>/<id>.app` and `<dir>/<id>.h3`.
    pub fn in_dir(dir: &Path, id: &str) -> Self {
        Self {
            content: dir.join(format!("{id}.{CONTENT_EXTENSION}")),
            tree: dir.join(format!("{id}.{TREE_EXTENSION}")),
        }
    }
}
