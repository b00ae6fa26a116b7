//! Chunk layout of an encrypted content file and hash-tree index math.
//!
//! A content file is a sequence of 64 KiB chunks. Each chunk starts with a
//! 1 KiB AES-CBC encrypted hash header followed by payload:
//!
//! ```text
//! 0x000..0x140  L0 digests (16 x SHA-1)
//! 0x140..0x280  L1 digests (16 x SHA-1)
//! 0x280..0x3C0  L2 digests (16 x SHA-1)
//! 0x3C0..0x400  padding
//! 0x400..       payload (0xFC00 bytes)
//! ```
//!
//! The L3 digests live in the companion tree file.

use std::fmt;
use std::ops::Range;

/// Size of one chunk in the content file.
pub const CHUNK_SIZE: u64 = 0x10000;
/// Size of the encrypted hash header at the start of every chunk.
pub const HEADER_SIZE: usize = 0x400;
/// Bytes between the end of one header and the start of the next.
pub const PAYLOAD_SIZE: u64 = CHUNK_SIZE - HEADER_SIZE as u64;
/// SHA-1 digest length.
pub const DIGEST_SIZE: usize = 20;
/// Digests per level set (16-ary tree).
pub const BRANCHING: usize = 16;
/// Bytes occupied by one level set inside the header.
pub const LEVEL_SIZE: usize = DIGEST_SIZE * BRANCHING;
/// Chunks addressable by one tree-file page (16^3).
pub const CHUNKS_PER_TREE_PAGE: u64 = (BRANCHING * BRANCHING * BRANCHING) as u64;

/// Level of the hash tree whose digest set is being checked against its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashLevel {
    L0,
    L1,
    L2,
}

impl HashLevel {
    /// Levels in the order they are checked for every chunk.
    pub const ALL: [HashLevel; 3] = [HashLevel::L0, HashLevel::L1, HashLevel::L2];

    /// Byte range of this level's digest set inside a decrypted header.
    pub fn header_range(self) -> Range<usize> {
        let start = self as usize * LEVEL_SIZE;
        start..start + LEVEL_SIZE
    }
}

impl fmt::Display for HashLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashLevel::L0 => write!(f, "L0"),
            HashLevel::L1 => write!(f, "L1"),
            HashLevel::L2 => write!(f, "L2"),
        }
    }
}

/// Position of a chunk in the hash tree.
///
/// `l1`, `l2` and `l3` are the entries of the L1, L2 and L3 arrays that the
/// chunk's L0, L1 and L2 sets must hash to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPosition {
    pub chunk: u64,
    pub l1: usize,
    pub l2: usize,
    pub l3: usize,
}

impl ChunkPosition {
    pub fn of(chunk: u64) -> Self {
        let fan = BRANCHING as u64;
        Self {
            chunk,
            l1: (chunk % fan) as usize,
            l2: ((chunk / fan) % fan) as usize,
            l3: (chunk / (fan * fan)) as usize,
        }
    }
}

/// Number of whole chunks in a content of `size` bytes. A trailing partial
/// chunk is not counted.
pub fn chunk_count(size: u64) -> u64 {
    size / CHUNK_SIZE
}

/// Returns digest `index` out of a concatenated digest array, if present.
pub fn digest_at(digests: &[u8], index: usize) -> Option<&[u8]> {
    let start = index.checked_mul(DIGEST_SIZE)?;
    digests.get(start..start + DIGEST_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_match_layout() {
        assert_eq!(PAYLOAD_SIZE, 0xFC00);
        assert_eq!(LEVEL_SIZE, 0x140);
        assert_eq!(HashLevel::L2.header_range(), 0x280..0x3C0);
        assert!(HashLevel::L2.header_range().end <= HEADER_SIZE);
        assert_eq!(CHUNKS_PER_TREE_PAGE, 4096);
    }

    #[test]
    fn position_first_chunks() {
        let first = ChunkPosition {
            chunk: 0,
            l1: 0,
            l2: 0,
            l3: 0,
        };
        assert_eq!(ChunkPosition::of(0), first);
        assert_eq!(ChunkPosition::of(15).l1, 15);
        assert_eq!(ChunkPosition::of(15).l2, 0);
    }

    #[test]
    fn position_carries_into_l2_and_l3() {
        let p = ChunkPosition::of(16);
        assert_eq!((p.l1, p.l2, p.l3), (0, 1, 0));
        let p = ChunkPosition::of(255);
        assert_eq!((p.l1, p.l2, p.l3), (15, 15, 0));
        let p = ChunkPosition::of(256);
        assert_eq!((p.l1, p.l2, p.l3), (0, 0, 1));
        let p = ChunkPosition::of(4095);
        assert_eq!((p.l1, p.l2, p.l3), (15, 15, 15));
        let p = ChunkPosition::of(4096 + 17);
        assert_eq!((p.l1, p.l2, p.l3), (1, 1, 16));
    }

    #[test]
    fn position_matches_odometer() {
        // Three counters advanced base-16, one step per chunk.
        let (mut l1, mut l2, mut l3) = (0usize, 0usize, 0usize);
        for chunk in 0..1000u64 {
            let p = ChunkPosition::of(chunk);
            assert_eq!((p.l1, p.l2, p.l3), (l1, l2, l3), "chunk {chunk}");
            l1 += 1;
            if l1 == 16 {
                l1 = 0;
                l2 += 1;
            }
            if l2 == 16 {
                l2 = 0;
                l3 += 1;
            }
        }
    }

    #[test]
    fn chunk_count_truncates() {
        assert_eq!(chunk_count(0), 0);
        assert_eq!(chunk_count(CHUNK_SIZE - 1), 0);
        assert_eq!(chunk_count(CHUNK_SIZE), 1);
        assert_eq!(chunk_count(3 * CHUNK_SIZE + 100), 3);
    }

    #[test]
    fn digest_at_bounds() {
        let digests = [7u8; DIGEST_SIZE * 2];
        assert_eq!(digest_at(&digests, 1).map(<[u8]>::len), Some(DIGEST_SIZE));
        assert!(digest_at(&digests, 2).is_none());
        assert!(digest_at(&digests[..DIGEST_SIZE + 5], 1).is_none());
        assert!(digest_at(&digests, usize::MAX).is_none());
    }
}
