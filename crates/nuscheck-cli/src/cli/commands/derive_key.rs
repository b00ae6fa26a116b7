//! `nuscheck derive-key` – unwrap a title key with the common key.

use anyhow::{Context, Result};
use nuscheck_core::config::NuscheckConfig;
use nuscheck_core::key::{derive_key_with, EncryptedKeyMaterial, TitleId};

/// Parses a title ID and encrypted title key given as hex strings.
pub(crate) fn parse_key_material(
    title_id: &str,
    encrypted_key: &str,
) -> Result<EncryptedKeyMaterial> {
    let title_id: TitleId = title_id.parse()?;
    let encrypted_key = hex::decode(encrypted_key.trim())
        .context("encrypted key is not valid hex")?;
    Ok(EncryptedKeyMaterial::new(title_id, encrypted_key))
}

pub fn run_derive_key(cfg: &NuscheckConfig, title_id: &str, encrypted_key: &str) -> Result<()> {
    let material = parse_key_material(title_id, encrypted_key)?;
    let key = derive_key_with(&cfg.common_key_bytes()?, &material)?;
    println!("{}  {}", key.to_hex(), material.title_id);
    Ok(())
}
