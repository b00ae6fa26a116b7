//! `nuscheck verify-content` – verify one `.app`/`.h3` pair.

use anyhow::{Context, Result};
use nuscheck_core::config::NuscheckConfig;
use nuscheck_core::key::derive_key_with;
use nuscheck_core::{verify_with_progress, ContentDescriptor};
use std::path::PathBuf;

use super::parse_key_material;

/// Chunks between progress log lines.
const PROGRESS_EVERY: u64 = 256;

#[derive(Debug)]
pub struct ContentArgs {
    pub app: PathBuf,
    pub h3: PathBuf,
    pub size: u64,
    pub root_digest: String,
    pub title_id: String,
    pub encrypted_key: String,
}

/// Returns `Ok(false)` when the content is corrupt; unreadable files are an error.
pub async fn run_verify_content(cfg: &NuscheckConfig, args: ContentArgs) -> Result<bool> {
    let material = parse_key_material(&args.title_id, &args.encrypted_key)?;
    let key = derive_key_with(&cfg.common_key_bytes()?, &material)?;
    let root_digest = hex::decode(args.root_digest.trim())
        .context("root digest is not valid hex")?;
    let id = args
        .app
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.app.display().to_string());
    let content = ContentDescriptor::new(id, args.size, root_digest);

    let (app, h3) = (args.app, args.h3);
    let verdict = tokio::task::spawn_blocking(move || {
        let result = verify_with_progress(&app, &h3, &content, &key, |p| {
            if p.chunks_done % PROGRESS_EVERY == 0 || p.chunks_done == p.chunk_count {
                tracing::info!(
                    "{}: {}/{} chunks ({:.0}%)",
                    content.id,
                    p.chunks_done,
                    p.chunk_count,
                    p.fraction() * 100.0
                );
            }
        });
        (content.id, result)
    })
    .await
    .context("verification task join")?;

    match verdict {
        (id, Ok(chunks)) => {
            println!("{id}: ok ({chunks} chunks)");
            Ok(true)
        }
        (id, Err(e)) if e.is_corruption() => {
            println!("{id}: FAILED: {e}");
            Ok(false)
        }
        (id, Err(e)) => Err(e).with_context(|| format!("verify content {id}")),
    }
}
