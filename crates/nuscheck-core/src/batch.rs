//! Verify every content of a title with bounded parallelism.
//!
//! Verification itself is synchronous; each content runs on the blocking pool
//! and at most `max_parallel` run at once. Every call holds its own tree buffer
//! and header buffer, so nothing is shared between tasks.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::content::ContentDescriptor;
use crate::error::IntegrityError;
use crate::key::{derive_key_with, ContentKey, EncryptedKeyMaterial};
use crate::report::IntegrityReport;

/// Verifies `contents` found in `dir`. Reports are returned in input order.
pub async fn verify_contents(
    dir: &Path,
    key: ContentKey,
    contents: Vec<ContentDescriptor>,
    max_parallel: usize,
) -> Result<Vec<IntegrityReport>> {
    let max_parallel = max_parallel.max(1);
    let total = contents.len();
    let mut reports: Vec<Option<IntegrityReport>> = (0..total).map(|_| None).collect();
    let mut queue = contents.into_iter().enumerate();
    let mut join_set = tokio::task::JoinSet::new();

    loop {
        while join_set.len() < max_parallel {
            let Some((idx, content)) = queue.next() else {
                break;
            };
            let dir: PathBuf = dir.to_path_buf();
            join_set.spawn_blocking(move || {
                (idx, IntegrityReport::for_content_in(&dir, &content, &key))
            });
        }

        let Some(res) = join_set.join_next().await else {
            break;
        };
        let (idx, report) = res.context("verification task join")?;
        reports[idx] = Some(report);
    }

    let reports: Vec<IntegrityReport> = reports.into_iter().flatten().collect();
    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    tracing::info!("verified {} contents, {} failed", total, failed);
    Ok(reports)
}

/// Derives the title key, then verifies all contents.
///
/// A key derivation failure is returned before any file is opened, as an
/// [`IntegrityError::KeyDerivation`] under a context line naming the title.
pub async fn verify_title(
    dir: &Path,
    common_key: &[u8],
    material: &EncryptedKeyMaterial,
    contents: Vec<ContentDescriptor>,
    max_parallel: usize,
) -> Result<Vec<IntegrityReport>> {
    let key = derive_key_with(common_key, material)
        .map_err(IntegrityError::from)
        .with_context(|| format!("derive content key for title {}", material.title_id))?;
    tracing::debug!(
        "title {}: derived content key, {} contents",
        material.title_id,
        contents.len()
    );
    verify_contents(dir, key, contents, max_parallel).await
}
