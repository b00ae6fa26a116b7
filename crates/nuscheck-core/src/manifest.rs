//! Title manifest: the JSON form of the metadata a title needs for verification.
//!
//! ```json
//! {
//!   "title_id": "0005000010040200",
//!   "encrypted_title_key": "00112233445566778899aabbccddeeff",
//!   "contents": [{ "id": "00000000", "size": 65536, "hash": "0123456789abcdef..." }]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::ContentDescriptor;
use crate::key::{EncryptedKeyMaterial, TitleId, TitleIdParseError};
use crate::tree::ROOT_PREFIX_LEN;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("cannot read manifest {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid manifest JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    TitleId(#[from] TitleIdParseError),
    #[error("field {field}: invalid hex: {source}")]
    Hex {
        field: String,
        #[source]
        source: hex::FromHexError,
    },
    #[error("content {id}: hash must be at least 8 bytes, got {len}")]
    ShortHash { id: String, len: usize },
}

/// One content entry of the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestContent {
    pub id: String,
    pub size: u64,
    /// Hex-encoded root digest (at least 8 bytes).
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleManifest {
    pub title_id: String,
    pub encrypted_title_key: String,
    #[serde(default)]
    pub contents: Vec<ManifestContent>,
}

impl TitleManifest {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let data = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&data)
    }

    pub fn from_json_str(data: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn title_id(&self) -> Result<TitleId, ManifestError> {
        Ok(self.title_id.parse()?)
    }

    /// Title ID and encrypted title key. The key length is checked at derivation.
    pub fn key_material(&self) -> Result<EncryptedKeyMaterial, ManifestError> {
        let encrypted_key = decode_hex("encrypted_title_key", &self.encrypted_title_key)?;
        Ok(EncryptedKeyMaterial::new(self.title_id()?, encrypted_key))
    }

    pub fn descriptors(&self) -> Result<Vec<ContentDescriptor>, ManifestError> {
        self.contents
            .iter()
            .map(|c| {
                let root_digest = decode_hex(&format!("contents[{}].hash", c.id), &c.hash)?;
                if root_digest.len() < ROOT_PREFIX_LEN {
                    return Err(ManifestError::ShortHash {
                        id: c.id.clone(),
                        len: root_digest.len(),
                    });
                }
                Ok(ContentDescriptor::new(c.id.clone(), c.size, root_digest))
            })
            .collect()
    }
}

fn decode_hex(field: &str, value: &str) -> Result<Vec<u8>, ManifestError> {
    hex::decode(value.trim()).map_err(|source| ManifestError::Hex {
        field: field.to_string(),
        source,
    })
}
