//! Per-content verification verdict.

use std::fmt;
use std::path::Path;

use crate::content::{ContentDescriptor, ContentPaths};
use crate::error::IntegrityError;
use crate::key::ContentKey;
use crate::verify::verify_with_progress;

/// Outcome of verifying one content.
#[derive(Debug)]
pub struct IntegrityReport {
    pub content_id: String,
    /// Chunks that passed before the walk ended.
    pub chunks_verified: u64,
    pub verdict: Result<(), IntegrityError>,
}

impl IntegrityReport {
    pub fn is_ok(&self) -> bool {
        self.verdict.is_ok()
    }

    /// Verifies `<dir>/<id>.app` against `<dir>/<id>.h3`.
    pub fn for_content_in(dir: &Path, content: &ContentDescriptor, key: &ContentKey) -> Self {
        let paths = ContentPaths::in_dir(dir, &content.id);
        let mut chunks_verified = 0u64;
        let verdict = verify_with_progress(&paths.content, &paths.tree, content, key, |p| {
            chunks_verified = p.chunks_done;
        })
        .map(|_| ());

        match &verdict {
            Ok(()) => tracing::info!(
                "content {} verified ({} chunks)",
                content.id,
                chunks_verified
            ),
            Err(e) => tracing::warn!("content {} failed verification: {}", content.id, e),
        }

        Self {
            content_id: content.id.clone(),
            chunks_verified,
            verdict,
        }
    }
}

impl fmt::Display for IntegrityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.verdict {
            Ok(()) => write!(f, "{}: ok ({} chunks)", self.content_id, self.chunks_verified),
            Err(e) => write!(f, "{}: FAILED: {}", self.content_id, e),
        }
    }
}
