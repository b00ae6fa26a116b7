//! Tree file (`.h3`): the L3 digest array of one content.

use std::fs;
use std::path::Path;

use sha1::{Digest, Sha1};

use crate::error::IntegrityError;
use crate::layout::{self, DIGEST_SIZE};

/// Number of leading bytes of the tree file digest compared against the
/// content's root digest.
pub const ROOT_PREFIX_LEN: usize = 8;

/// In-memory copy of a tree file.
#[derive(Debug, Clone)]
pub struct TreeFile {
    data: Vec<u8>,
}

impl TreeFile {
    /// Reads the whole tree file.
    pub fn read(path: &Path) -> Result<Self, IntegrityError> {
        let data = fs::read(path).map_err(IntegrityError::tree)?;
        Ok(Self { data })
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// SHA-1 of the raw tree file.
    pub fn digest(&self) -> [u8; DIGEST_SIZE] {
        Sha1::digest(&self.data).into()
    }

    /// Checks the tree file against the first 8 bytes of `root_digest`.
    pub fn check_root(&self, root_digest: &[u8]) -> Result<(), IntegrityError> {
        let digest = self.digest();
        let mut actual = [0u8; ROOT_PREFIX_LEN];
        actual.copy_from_slice(&digest[..ROOT_PREFIX_LEN]);

        match root_digest.get(..ROOT_PREFIX_LEN) {
            Some(expected) if expected == actual => Ok(()),
            _ => Err(IntegrityError::RootDigestMismatch {
                expected: root_digest.iter().take(ROOT_PREFIX_LEN).copied().collect(),
                actual,
            }),
        }
    }

    /// Number of complete digests in the file.
    pub fn len(&self) -> usize {
        self.data.len() / DIGEST_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// L3 digest `index`.
    pub fn entry(&self, index: usize) -> Option<&[u8]> {
        layout::digest_at(&self.data, index)
    }
}
