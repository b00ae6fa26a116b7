//! CLI for nuscheck.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use nuscheck_core::config;
use std::path::Path;

use commands::{run_derive_key, run_verify, run_verify_content, ContentArgs};

/// Top-level CLI for nuscheck.
#[derive(Debug, Parser)]
#[command(name = "nuscheck")]
#[command(about = "nuscheck: verify title contents against their hash trees", long_about = None)]
pub struct Cli {
    /// Increase log detail (-v debug, -vv per-chunk trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Print the content key unwrapped from an encrypted title key.
    DeriveKey {
        /// Title ID, 16 hex digits.
        title_id: String,
        /// Encrypted title key, 32 hex digits.
        encrypted_key: String,
    },

    /// Verify every content listed in a title manifest.
    Verify {
        /// Path to the title manifest (JSON).
        manifest: String,
        /// Directory holding `<id>.app` and `<id>.h3`.
        /// Defaults to the config value, then the manifest's directory.
        #[arg(long, value_name = "DIR")]
        dir: Option<String>,
        /// Verify up to N contents concurrently (default from config).
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,
    },

    /// Verify a single content file against its tree file.
    VerifyContent {
        /// Encrypted content file (`.app`).
        app: String,
        /// Tree file (`.h3`).
        h3: String,
        /// Declared content size in bytes.
        #[arg(long)]
        size: u64,
        /// Root digest from title metadata, hex (at least 16 digits).
        #[arg(long, value_name = "HEX")]
        root_digest: String,
        /// Title ID, 16 hex digits.
        #[arg(long, value_name = "HEX")]
        title_id: String,
        /// Encrypted title key, 32 hex digits.
        #[arg(long, value_name = "HEX")]
        encrypted_key: String,
    },
}

impl Cli {
    /// Runs the parsed command. `Ok(false)` means a content failed verification.
    pub async fn run(self) -> Result<bool> {
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match self.command {
            CliCommand::DeriveKey {
                title_id,
                encrypted_key,
            } => {
                run_derive_key(&cfg, &title_id, &encrypted_key)?;
                Ok(true)
            }
            CliCommand::Verify {
                manifest,
                dir,
                jobs,
            } => {
                let dir = dir.as_deref().map(Path::new);
                run_verify(&cfg, Path::new(&manifest), dir, jobs).await
            }
            CliCommand::VerifyContent {
                app,
                h3,
                size,
                root_digest,
                title_id,
                encrypted_key,
            } => {
                let args = ContentArgs {
                    app: app.into(),
                    h3: h3.into(),
                    size,
                    root_digest,
                    title_id,
                    encrypted_key,
                };
                run_verify_content(&cfg, args).await
            }
        }
    }
}

#[cfg(test)]
mod tests;
