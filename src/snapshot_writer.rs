//! Snapshot persistence.
//!
//! Sole writer of task artifacts: one file per task key inside the run's
//! output directory. Engine-suggested filenames are honored but sanitized
//! and always prefixed with the task key, so artifact names stay
//! deterministic per task and cannot collide or escape the directory.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::capture::CaptureResult;
use crate::utils::safe_truncate_chars;

/// Longest filename stem accepted before truncation.
const MAX_STEM_CHARS: usize = 160;

/// Writes capture artifacts under a run's output directory.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    output_dir: PathBuf,
}

impl SnapshotWriter {
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Persist a capture result for `task_key` and return the written path.
    ///
    /// Results carrying an engine error are written like any other; an empty
    /// payload produces an empty artifact so the run's artifact set stays
    /// complete for indexing.
    pub async fn write(&self, result: &CaptureResult, task_key: &str) -> Result<PathBuf> {
        let name = artifact_filename(task_key, result.filename.as_deref());
        self.write_bytes(result.content.as_bytes(), &name).await
    }

    /// Persist a raw DOM fallback body for `task_key`.
    pub async fn write_fallback(&self, html: &str, task_key: &str) -> Result<PathBuf> {
        let name = artifact_filename(task_key, Some(&format!("{task_key}_fallback")));
        self.write_bytes(html.as_bytes(), &name).await
    }

    async fn write_bytes(&self, bytes: &[u8], name: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| {
                format!(
                    "failed to create snapshot directory {}",
                    self.output_dir.display()
                )
            })?;

        let path = self.output_dir.join(name);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("failed to write snapshot {}", path.display()))?;

        log::info!("saved snapshot {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}

/// Deterministic artifact filename for a task key and an optional
/// engine-suggested name.
fn artifact_filename(task_key: &str, suggested: Option<&str>) -> String {
    let key = sanitize_stem(task_key);
    let stem = match suggested.map(sanitize_stem) {
        Some(s) if !s.is_empty() && s != key => format!("{key}__{s}"),
        _ => key,
    };
    let stem = safe_truncate_chars(&stem, MAX_STEM_CHARS);
    format!("{stem}.html")
}

/// Strip path separators, illegal characters and an `.html`/`.htm` suffix.
fn sanitize_stem(name: &str) -> String {
    let trimmed = name.trim();
    let trimmed = trimmed
        .strip_suffix(".html")
        .or_else(|| trimmed.strip_suffix(".htm"))
        .unwrap_or(trimmed);
    sanitize_filename::sanitize(trimmed)
}
