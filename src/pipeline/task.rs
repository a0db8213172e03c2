//! Task definitions and run bookkeeping.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How a section's navigation target is obtained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SectionTarget {
    /// Navigate straight to a known URL.
    Url(String),
    /// Discover the URL from the anchors of the run's anchor page, falling
    /// back to a constructed URL when discovery comes up empty.
    Discovered {
        /// Visible-text keywords to match against anchor text.
        keywords: Vec<String>,
        /// Substring to match against anchor hrefs when no keyword hits.
        href_pattern: Option<String>,
        /// Constructed URL used when both lookups return nothing.
        fallback_url: Option<String>,
    },
}

/// One logical page/section to visit and capture.
///
/// Tasks are immutable data built before the run starts; the pipeline
/// consumes each exactly once, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionTask {
    /// Unique capture identifier, also the artifact key on disk.
    pub key: String,
    pub target: SectionTarget,
    /// Scroll rounds to grow the page before capture; 0 skips scrolling.
    pub scroll_budget: u32,
}

impl SectionTask {
    /// Task with a fixed navigation target.
    #[must_use]
    pub fn direct(key: impl Into<String>, url: impl Into<String>, scroll_budget: u32) -> Self {
        Self {
            key: key.into(),
            target: SectionTarget::Url(url.into()),
            scroll_budget,
        }
    }

    /// Task whose target is discovered from the anchor page.
    #[must_use]
    pub fn discovered(
        key: impl Into<String>,
        keywords: &[&str],
        href_pattern: Option<&str>,
        fallback_url: Option<String>,
        scroll_budget: u32,
    ) -> Self {
        Self {
            key: key.into(),
            target: SectionTarget::Discovered {
                keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
                href_pattern: href_pattern.map(str::to_string),
                fallback_url,
            },
            scroll_budget,
        }
    }
}

/// Progress of a single task through the pipeline, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPhase {
    Queued,
    Navigating,
    Stabilizing,
    Scrolling,
    CaptureSubmitted,
    Pending,
    Drained,
    Failed,
}

/// Terminal outcome of one section.
#[derive(Debug, Clone)]
pub enum SectionOutcome {
    /// Capture drained and written.
    Captured {
        path: PathBuf,
        title: Option<String>,
    },
    /// The engine answered with an error string; the payload (possibly
    /// empty) was written anyway so downstream indexing stays consistent.
    EngineError { path: PathBuf, error: String },
    /// The engine never answered within the capture timeout. A raw DOM
    /// fallback artifact was written when the page could still be read.
    TimedOut { fallback_path: Option<PathBuf> },
    /// Posting the capture request itself failed.
    SubmitFailed {
        fallback_path: Option<PathBuf>,
        error: String,
    },
    /// Navigation or target resolution failed; nothing was written.
    NavigationFailed { error: String },
    /// The result was drained but could not be persisted.
    WriteFailed { error: String },
}

impl SectionOutcome {
    /// Path of the artifact this outcome produced, if any.
    #[must_use]
    pub fn artifact_path(&self) -> Option<&Path> {
        match self {
            Self::Captured { path, .. } | Self::EngineError { path, .. } => Some(path),
            Self::TimedOut { fallback_path } | Self::SubmitFailed { fallback_path, .. } => {
                fallback_path.as_deref()
            }
            Self::NavigationFailed { .. } | Self::WriteFailed { .. } => None,
        }
    }

    /// Whether the section completed without any failure.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Captured { .. })
    }
}

/// Outcome record for one section of a run.
#[derive(Debug, Clone)]
pub struct SectionRecord {
    pub key: String,
    pub outcome: SectionOutcome,
}

/// Everything a run produced, in drain order.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub sections: Vec<SectionRecord>,
}

impl RunSummary {
    /// Paths of all artifacts written during the run.
    #[must_use]
    pub fn artifact_paths(&self) -> Vec<&Path> {
        self.sections
            .iter()
            .filter_map(|r| r.outcome.artifact_path())
            .collect()
    }

    /// Number of artifacts written.
    #[must_use]
    pub fn artifacts_written(&self) -> usize {
        self.artifact_paths().len()
    }

    /// Number of sections that never produced an artifact because they
    /// could not be reached.
    #[must_use]
    pub fn navigation_failures(&self) -> usize {
        self.sections
            .iter()
            .filter(|r| matches!(r.outcome, SectionOutcome::NavigationFailed { .. }))
            .count()
    }

    /// Record for a given task key, if the task ran.
    #[must_use]
    pub fn section(&self, key: &str) -> Option<&SectionRecord> {
        self.sections.iter().find(|r| r.key == key)
    }
}
