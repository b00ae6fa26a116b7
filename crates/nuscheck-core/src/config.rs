use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::key::{COMMON_KEY, KEY_SIZE};

/// Global configuration loaded from `~/.config/nuscheck/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NuscheckConfig {
    /// Maximum number of contents verified at the same time.
    pub max_parallel_verifications: usize,
    /// Hex common key replacing the built-in one (None = built-in).
    #[serde(default)]
    pub common_key: Option<String>,
    /// Directory holding `<id>.app` / `<id>.h3` files when none is given on the command line.
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
}

impl Default for NuscheckConfig {
    fn default() -> Self {
        Self {
            max_parallel_verifications: 4,
            common_key: None,
            download_dir: None,
        }
    }
}

impl NuscheckConfig {
    /// Common key bytes: the configured override, or the built-in key.
    pub fn common_key_bytes(&self) -> Result<Vec<u8>> {
        let Some(hex_key) = &self.common_key else {
            return Ok(COMMON_KEY.to_vec());
        };
        let key = hex::decode(hex_key.trim()).context("config common_key is not valid hex")?;
        if key.len() != KEY_SIZE {
            anyhow::bail!(
                "config common_key must be {} bytes, got {}",
                KEY_SIZE,
                key.len()
            );
        }
        Ok(key)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("nuscheck")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<NuscheckConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = NuscheckConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: NuscheckConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
