//! `nuscheck verify` – verify all contents of a title manifest.

use anyhow::{bail, Context, Result};
use nuscheck_core::batch;
use nuscheck_core::config::NuscheckConfig;
use nuscheck_core::manifest::TitleManifest;
use std::path::{Path, PathBuf};

/// Directory holding the content files: explicit, then config, then next to the manifest.
pub(crate) fn content_dir(cfg: &NuscheckConfig, manifest: &Path, dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = dir {
        return dir.to_path_buf();
    }
    if let Some(dir) = &cfg.download_dir {
        return dir.clone();
    }
    match manifest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Returns `Ok(false)` when at least one content is corrupt. Contents that
/// could not be read make the whole run an error once all reports are printed.
pub async fn run_verify(
    cfg: &NuscheckConfig,
    manifest_path: &Path,
    dir: Option<&Path>,
    jobs: Option<usize>,
) -> Result<bool> {
    let manifest = TitleManifest::load(manifest_path)?;
    let material = manifest
        .key_material()
        .with_context(|| format!("manifest {}", manifest_path.display()))?;
    let contents = manifest
        .descriptors()
        .with_context(|| format!("manifest {}", manifest_path.display()))?;
    let dir = content_dir(cfg, manifest_path, dir);
    let jobs = jobs.unwrap_or(cfg.max_parallel_verifications);

    tracing::info!(
        "title {}: verifying {} contents in {} ({} at a time)",
        material.title_id,
        contents.len(),
        dir.display(),
        jobs
    );

    let reports =
        batch::verify_title(&dir, &cfg.common_key_bytes()?, &material, contents, jobs).await?;

    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    let unreadable = reports
        .iter()
        .filter(|r| matches!(&r.verdict, Err(e) if !e.is_corruption()))
        .count();
    for report in &reports {
        println!("{report}");
    }
    println!(
        "{} of {} contents verified for title {}",
        reports.len() - failed,
        reports.len(),
        material.title_id
    );
    if unreadable > 0 {
        bail!(
            "{} of {} contents of title {} could not be read",
            unreadable,
            reports.len(),
            material.title_id
        );
    }
    Ok(failed == 0)
}
