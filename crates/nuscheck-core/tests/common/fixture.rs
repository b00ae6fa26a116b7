//! Builds encrypted content files with a valid hash tree.
//!
//! L0 sets are synthetic (payload bytes are never hashed by the verifier);
//! L1, L2 and the `.h3` array are computed from them the same way a packager
//! would. Content files are sparse: only the chunk headers are written.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use nuscheck_core::layout::{BRANCHING, CHUNK_SIZE, DIGEST_SIZE, HEADER_SIZE, LEVEL_SIZE};
use nuscheck_core::{verify, ContentDescriptor, ContentKey, ContentPaths, IntegrityError};
use sha1::{Digest, Sha1};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

pub const ZERO_IV: [u8; 16] = [0u8; 16];

pub struct BuiltContent {
    pub descriptor: ContentDescriptor,
    pub paths: ContentPaths,
}

impl BuiltContent {
    /// Verifies the files on disk against their own descriptor.
    pub fn verify(&self, key: &ContentKey) -> Result<(), IntegrityError> {
        self.verify_as(&self.descriptor, key)
    }

    /// Verifies the files on disk against another descriptor.
    pub fn verify_as(
        &self,
        descriptor: &ContentDescriptor,
        key: &ContentKey,
    ) -> Result<(), IntegrityError> {
        verify(&self.paths.content, &self.paths.tree, descriptor, key)
    }
}

pub fn sha1(data: &[u8]) -> [u8; DIGEST_SIZE] {
    Sha1::digest(data).into()
}

/// Hashes every set and lays the digests out 16 per parent set.
fn parent_sets(children: &[Vec<u8>]) -> Vec<Vec<u8>> {
    children
        .chunks(BRANCHING)
        .map(|group| {
            let mut set = vec![0u8; LEVEL_SIZE];
            for (j, child) in group.iter().enumerate() {
                set[j * DIGEST_SIZE..(j + 1) * DIGEST_SIZE].copy_from_slice(&sha1(child));
            }
            set
        })
        .collect()
}

/// Decrypted headers for `chunks` chunks and the matching L3 array.
pub fn plain_headers(chunks: u64, seed: u8) -> (Vec<[u8; HEADER_SIZE]>, Vec<u8>) {
    let l0: Vec<Vec<u8>> = (0..chunks as usize)
        .map(|c| {
            (0..LEVEL_SIZE)
                .map(|i| (c.wrapping_mul(31) ^ (c >> 8) ^ i.wrapping_mul(7)) as u8 ^ seed)
                .collect()
        })
        .collect();
    let l1 = parent_sets(&l0);
    let l2 = parent_sets(&l1);
    let l3: Vec<u8> = l2.iter().flat_map(|set| sha1(set)).collect();

    let headers = (0..chunks as usize)
        .map(|c| {
            let mut header = [0u8; HEADER_SIZE];
            header[..LEVEL_SIZE].copy_from_slice(&l0[c]);
            header[LEVEL_SIZE..2 * LEVEL_SIZE].copy_from_slice(&l1[c / BRANCHING]);
            header[2 * LEVEL_SIZE..3 * LEVEL_SIZE]
                .copy_from_slice(&l2[c / (BRANCHING * BRANCHING)]);
            header
        })
        .collect();
    (headers, l3)
}

pub fn encrypt_header(key: &ContentKey, header: &mut [u8; HEADER_SIZE]) {
    let mut cipher = Aes128CbcEnc::new(key.as_bytes().into(), &ZERO_IV.into());
    for block in header.chunks_exact_mut(16) {
        cipher.encrypt_block_mut(GenericArray::from_mut_slice(block));
    }
}

pub fn decrypt_header(key: &ContentKey, header: &mut [u8; HEADER_SIZE]) {
    let mut cipher = Aes128CbcDec::new(key.as_bytes().into(), &ZERO_IV.into());
    for block in header.chunks_exact_mut(16) {
        cipher.decrypt_block_mut(GenericArray::from_mut_slice(block));
    }
}

/// Writes `<dir>/<id>.app` (logical length `size`) and `<dir>/<id>.h3`.
pub fn build_content(dir: &Path, id: &str, key: &ContentKey, size: u64) -> BuiltContent {
    build_content_seeded(dir, id, key, size, 0)
}

pub fn build_content_seeded(
    dir: &Path,
    id: &str,
    key: &ContentKey,
    size: u64,
    seed: u8,
) -> BuiltContent {
    let paths = ContentPaths::in_dir(dir, id);
    let (headers, l3) = plain_headers(size / CHUNK_SIZE, seed);

    let mut file = File::create(&paths.content).unwrap();
    file.set_len(size).unwrap();
    for (c, mut header) in headers.into_iter().enumerate() {
        encrypt_header(key, &mut header);
        file.seek(SeekFrom::Start(c as u64 * CHUNK_SIZE)).unwrap();
        file.write_all(&header).unwrap();
    }
    file.flush().unwrap();

    fs::write(&paths.tree, &l3).unwrap();
    let descriptor = ContentDescriptor::new(id, size, sha1(&l3).to_vec());
    BuiltContent { descriptor, paths }
}

/// Flips one bit of the decrypted header of `chunk` at `offset`, re-encrypting it in place.
pub fn flip_header_byte(paths: &ContentPaths, key: &ContentKey, chunk: u64, offset: usize) {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(&paths.content)
        .unwrap();
    let mut header = [0u8; HEADER_SIZE];
    file.seek(SeekFrom::Start(chunk * CHUNK_SIZE)).unwrap();
    file.read_exact(&mut header).unwrap();
    decrypt_header(key, &mut header);
    header[offset] ^= 0x01;
    encrypt_header(key, &mut header);
    file.seek(SeekFrom::Start(chunk * CHUNK_SIZE)).unwrap();
    file.write_all(&header).unwrap();
}

/// Replaces the tree file and returns a descriptor whose root digest matches it.
pub fn rewrite_tree(built: &BuiltContent, l3: &[u8]) -> ContentDescriptor {
    fs::write(&built.paths.tree, l3).unwrap();
    ContentDescriptor::new(
        built.descriptor.id.clone(),
        built.descriptor.size,
        sha1(l3).to_vec(),
    )
}
