//! Error types for key derivation and content verification.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::layout::HashLevel;

/// Which of the two per-content files an I/O failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// The `.h3` tree file.
    Tree,
    /// The `.app` encrypted content file.
    Content,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Tree => write!(f, "tree file"),
            FileKind::Content => write!(f, "content file"),
        }
    }
}

/// Failure to recover a content key from encrypted key material.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyDerivationError {
    #[error("encrypted title key must be 16 bytes, got {0}")]
    InvalidKeyLength(usize),
    #[error("cannot initialise AES-128-CBC: common key must be 16 bytes, got {0}")]
    CipherInit(usize),
}

/// Verdict of a failed content verification.
#[derive(Debug, Error)]
pub enum IntegrityError {
    /// Missing, unreadable or truncated file.
    #[error("cannot read {which}: {source}")]
    FileAccess {
        which: FileKind,
        #[source]
        source: io::Error,
    },
    /// The tree file does not belong to the declared content.
    #[error(
        "tree file digest {} does not match root digest {}",
        hex::encode(.actual),
        hex::encode(.expected)
    )]
    RootDigestMismatch { expected: Vec<u8>, actual: [u8; 8] },
    /// A digest set did not hash to its parent entry.
    #[error("{level} digests of chunk {chunk} do not match parent entry {index}")]
    HashChainMismatch {
        level: HashLevel,
        index: usize,
        chunk: u64,
    },
    /// The tree file has no L3 entry for a chunk of the content.
    #[error("tree file holds {available} digests but {needed} are required")]
    TreeFileTooShort { needed: usize, available: usize },
    #[error(transparent)]
    KeyDerivation(#[from] KeyDerivationError),
}

impl IntegrityError {
    pub(crate) fn tree(source: io::Error) -> Self {
        IntegrityError::FileAccess {
            which: FileKind::Tree,
            source,
        }
    }

    pub(crate) fn content(source: io::Error) -> Self {
        IntegrityError::FileAccess {
            which: FileKind::Content,
            source,
        }
    }

    /// True when the files were readable but their bytes are not genuine.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            IntegrityError::RootDigestMismatch { .. }
                | IntegrityError::HashChainMismatch { .. }
                | IntegrityError::TreeFileTooShort { .. }
        )
    }
}
