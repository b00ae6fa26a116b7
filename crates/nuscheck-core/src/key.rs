//! Title key derivation.
//!
//! Every title key is wrapped with the common key: AES-128-CBC, IV = title ID
//! followed by eight zero bytes, no padding. Unwrapping it yields the key that
//! encrypts the title's content files.

use std::fmt;
use std::str::FromStr;

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecryptMut, KeyIvInit};
use thiserror::Error;

use crate::error::KeyDerivationError;

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// AES block and key length.
pub const KEY_SIZE: usize = 16;

/// Shared key that wraps every title key.
pub const COMMON_KEY: [u8; KEY_SIZE] = [
    0xD7, 0xB0, 0x04, 0x02, 0x65, 0x9B, 0xA2, 0xAB, 0xD2, 0xCB, 0x0D, 0xB2, 0x7F, 0xA2, 0xB6, 0x56,
];

/// 64-bit title identifier, stored big-endian.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TitleId([u8; 8]);

impl TitleId {
    pub fn from_u64(id: u64) -> Self {
        Self(id.to_be_bytes())
    }

    pub fn as_u64(&self) -> u64 {
        u64::from_be_bytes(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl From<[u8; 8]> for TitleId {
    fn from(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for TitleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self.0))
    }
}

impl fmt::Debug for TitleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TitleId({self})")
    }
}

/// Title ID string that is not 16 hex digits.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid title ID {0:?}: expected 16 hex digits")]
pub struct TitleIdParseError(pub String);

impl FromStr for TitleId {
    type Err = TitleIdParseError;

    /// Accepts `0005000010040200`, with or without a `0x` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim();
        let digits = digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
            .unwrap_or(digits);
        let mut bytes = [0u8; 8];
        hex::decode_to_slice(digits, &mut bytes).map_err(|_| TitleIdParseError(s.to_string()))?;
        Ok(Self(bytes))
    }
}

/// Encrypted title key as carried in title metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedKeyMaterial {
    pub title_id: TitleId,
    pub encrypted_key: Vec<u8>,
}

impl EncryptedKeyMaterial {
    pub fn new(title_id: TitleId, encrypted_key: impl Into<Vec<u8>>) -> Self {
        Self {
            title_id,
            encrypted_key: encrypted_key.into(),
        }
    }
}

/// Decrypted per-title content key. Never written to disk.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ContentKey([u8; KEY_SIZE]);

impl ContentKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContentKey(..)")
    }
}

/// Unwraps the content key with the built-in [`COMMON_KEY`].
pub fn derive_key(material: &EncryptedKeyMaterial) -> Result<ContentKey, KeyDerivationError> {
    derive_key_with(&COMMON_KEY, material)
}

/// Unwraps the content key with an explicit common key.
pub fn derive_key_with(
    common_key: &[u8],
    material: &EncryptedKeyMaterial,
) -> Result<ContentKey, KeyDerivationError> {
    let len = material.encrypted_key.len();
    if len != KEY_SIZE {
        return Err(KeyDerivationError::InvalidKeyLength(len));
    }

    let mut iv = [0u8; KEY_SIZE];
    iv[..8].copy_from_slice(material.title_id.as_bytes());

    let mut cipher = Aes128CbcDec::new_from_slices(common_key, &iv)
        .map_err(|_| KeyDerivationError::CipherInit(common_key.len()))?;

    let mut block = [0u8; KEY_SIZE];
    block.copy_from_slice(&material.encrypted_key);
    cipher.decrypt_block_mut(GenericArray::from_mut_slice(&mut block));

    Ok(ContentKey(block))
}
