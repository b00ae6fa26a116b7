//! Chunk hash-tree verification of one content file.
//!
//! The tree file is checked against the content's root digest first, then the
//! content file is walked one chunk at a time: only the 1 KiB header of each
//! chunk is read and decrypted, and its L0/L1/L2 digest sets are chained up to
//! the L3 entry from the tree file. The first mismatch ends the walk.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecryptMut, KeyIvInit};
use sha1::{Digest, Sha1};

use crate::content::ContentDescriptor;
use crate::error::IntegrityError;
use crate::key::{ContentKey, KEY_SIZE};
use crate::layout::{
    ChunkPosition, HashLevel, CHUNKS_PER_TREE_PAGE, DIGEST_SIZE, HEADER_SIZE, PAYLOAD_SIZE,
};
use crate::tree::TreeFile;

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// Chunk headers are decrypted with a zero IV that restarts at every chunk.
const HEADER_IV: [u8; KEY_SIZE] = [0u8; KEY_SIZE];

/// Snapshot handed to the progress callback after each accepted chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkProgress {
    /// Chunks verified so far.
    pub chunks_done: u64,
    /// Chunks that will be verified in total.
    pub chunk_count: u64,
}

impl ChunkProgress {
    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.chunk_count == 0 {
            return 1.0;
        }
        (self.chunks_done as f64 / self.chunk_count as f64).min(1.0)
    }
}

/// Verifies `content_path` against `tree_path` and the descriptor's root digest.
pub fn verify(
    content_path: &Path,
    tree_path: &Path,
    content: &ContentDescriptor,
    key: &ContentKey,
) -> Result<(), IntegrityError> {
    verify_with_progress(content_path, tree_path, content, key, |_| {}).map(|_| ())
}

/// Same as [`verify`], calling `on_chunk` after every chunk that passes.
/// Returns the number of chunks verified.
pub fn verify_with_progress<F>(
    content_path: &Path,
    tree_path: &Path,
    content: &ContentDescriptor,
    key: &ContentKey,
    mut on_chunk: F,
) -> Result<u64, IntegrityError>
where
    F: FnMut(&ChunkProgress),
{
    let tree = TreeFile::read(tree_path)?;
    tree.check_root(&content.root_digest)?;

    let chunk_count = content.chunk_count();
    let trailing = content.trailing_bytes();
    if trailing != 0 {
        tracing::warn!(
            "content {}: size {} is not chunk aligned; last {} bytes are not verified",
            content.id,
            content.size,
            trailing
        );
    }
    tracing::debug!(
        "content {}: verifying {} chunks against {} tree entries",
        content.id,
        chunk_count,
        tree.len()
    );
    if chunk_count > CHUNKS_PER_TREE_PAGE {
        tracing::debug!(
            "content {}: {} chunks span {} tree pages",
            content.id,
            chunk_count,
            chunk_count.div_ceil(CHUNKS_PER_TREE_PAGE)
        );
    }

    let mut file = File::open(content_path).map_err(IntegrityError::content)?;
    let mut header = [0u8; HEADER_SIZE];

    for chunk in 0..chunk_count {
        let pos = ChunkPosition::of(chunk);

        file.read_exact(&mut header).map_err(IntegrityError::content)?;
        decrypt_header(key, &mut header);
        check_chunk(&header, &tree, pos)?;
        file.seek(SeekFrom::Current(PAYLOAD_SIZE as i64))
            .map_err(IntegrityError::content)?;

        tracing::trace!("content {}: chunk {} ok", content.id, chunk);
        on_chunk(&ChunkProgress {
            chunks_done: chunk + 1,
            chunk_count,
        });
    }

    Ok(chunk_count)
}

/// AES-128-CBC decrypts a chunk header in place.
fn decrypt_header(key: &ContentKey, header: &mut [u8; HEADER_SIZE]) {
    let mut cipher = Aes128CbcDec::new(key.as_bytes().into(), &HEADER_IV.into());
    for block in header.chunks_exact_mut(KEY_SIZE) {
        cipher.decrypt_block_mut(GenericArray::from_mut_slice(block));
    }
}

/// Chains the header's L0, L1 and L2 sets up to the L3 entry for `pos`.
fn check_chunk(
    header: &[u8; HEADER_SIZE],
    tree: &TreeFile,
    pos: ChunkPosition,
) -> Result<(), IntegrityError> {
    for level in HashLevel::ALL {
        let (index, parent) = match level {
            HashLevel::L0 => (pos.l1, header_entry(header, HashLevel::L1, pos.l1)),
            HashLevel::L1 => (pos.l2, header_entry(header, HashLevel::L2, pos.l2)),
            HashLevel::L2 => {
                let parent = tree.entry(pos.l3).ok_or(IntegrityError::TreeFileTooShort {
                    needed: pos.l3 + 1,
                    available: tree.len(),
                })?;
                (pos.l3, parent)
            }
        };

        let digest = Sha1::digest(&header[level.header_range()]);
        if digest.as_slice() != parent {
            return Err(IntegrityError::HashChainMismatch {
                level,
                index,
                chunk: pos.chunk,
            });
        }
    }
    Ok(())
}

/// Digest `index` (< 16) of one of the header's level sets.
fn header_entry(header: &[u8; HEADER_SIZE], level: HashLevel, index: usize) -> &[u8] {
    let start = level.header_range().start + index * DIGEST_SIZE;
    &header[start..start + DIGEST_SIZE]
}
