//! Master report assembly.
//!
//! After the drain completes, every artifact is cross-referenced from a
//! single `index.html` in the snapshot directory: one collapsible block per
//! section with a lazily loaded iframe, plus a list of the sections that
//! produced nothing.

use anyhow::{Context, Result};
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::path::{Path, PathBuf};

use crate::pipeline::{RunSummary, SectionOutcome};

const REPORT_STYLE: &str = "body{font-family:Arial,Helvetica,sans-serif;margin:18px} \
iframe{width:100%;height:720px;border:1px solid #ddd;margin-bottom:18px} \
summary{font-size:16px;padding:8px;cursor:pointer} \
.failed{color:#a33}";

/// Builds the navigable index over a run's artifacts.
#[derive(Debug)]
pub struct ReportAssembler {
    output_dir: PathBuf,
    profile_id: String,
}

impl ReportAssembler {
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>, profile_id: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            profile_id: profile_id.into(),
        }
    }

    /// Write the master index and return its path.
    pub async fn assemble(&self, summary: &RunSummary) -> Result<PathBuf> {
        let html = self.render(summary);
        let path = self.output_dir.join(crate::profile::master_index_name());

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| {
                format!("failed to create report directory {}", self.output_dir.display())
            })?;
        tokio::fs::write(&path, html)
            .await
            .with_context(|| format!("failed to write master index {}", path.display()))?;

        log::info!("master index created at {}", path.display());
        Ok(path)
    }

    fn render(&self, summary: &RunSummary) -> String {
        let title = format!("Profile export {}", self.profile_id);
        let mut html = String::with_capacity(4096);
        html.push_str("<!doctype html>\n<html>\n<head>\n<meta charset='utf-8'>\n");
        html.push_str(&format!("<title>{}</title>\n", encode_text(&title)));
        html.push_str(&format!("<style>{REPORT_STYLE}</style>\n"));
        html.push_str("</head>\n<body>\n");
        html.push_str(&format!("<h1>{}</h1>\n", encode_text(&title)));
        html.push_str(&format!(
            "<p>Generated {}</p>\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ));

        for record in &summary.sections {
            match record.outcome.artifact_path() {
                Some(path) => {
                    let file_name = display_file_name(path);
                    html.push_str("<details>\n");
                    html.push_str(&format!("<summary>{}</summary>\n", encode_text(&file_name)));
                    html.push_str(&format!(
                        "<iframe src=\"{}\" loading='lazy'></iframe>\n",
                        encode_double_quoted_attribute(&file_name)
                    ));
                    html.push_str("</details>\n");
                }
                None => {
                    let reason = failure_reason(&record.outcome);
                    html.push_str(&format!(
                        "<p class=\"failed\">{}: {}</p>\n",
                        encode_text(&record.key),
                        encode_text(reason)
                    ));
                }
            }
        }

        html.push_str("</body>\n</html>\n");
        html
    }
}

fn display_file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn failure_reason(outcome: &SectionOutcome) -> &str {
    match outcome {
        SectionOutcome::NavigationFailed { .. } => "page could not be reached",
        SectionOutcome::WriteFailed { .. } => "capture could not be persisted",
        SectionOutcome::TimedOut { .. } => "capture never completed",
        SectionOutcome::SubmitFailed { .. } => "capture could not be requested",
        SectionOutcome::Captured { .. } | SectionOutcome::EngineError { .. } => "",
    }
}
