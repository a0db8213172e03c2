//! The capture pipeline scheduler.
//!
//! Navigating a section and collecting its capture are decoupled: a task's
//! tab is handed to the pending set as soon as its capture request is
//! posted, and the driver immediately moves on to the next task's
//! navigation. Completed results are drained opportunistically during
//! scroll pauses and between tasks, and exhaustively once every task has
//! been submitted, so capture latency hides behind the navigation and
//! scroll time of later tasks while no result is ever lost or collected
//! twice.
//!
//! Everything runs on one logical driver task; "concurrency" means multiple
//! outstanding captures, not multiple threads.

pub mod chromium;
pub mod pending;
pub mod surface;
pub mod task;

pub use chromium::{ChromiumSurface, ChromiumSurfaceProvider};
pub use pending::{PendingCapture, PendingSet};
pub use surface::{SectionSurface, SurfaceError, SurfaceProvider};
pub use task::{
    RunSummary, SectionOutcome, SectionRecord, SectionTask, SectionTarget, TaskPhase,
};

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::capture::CaptureOptions;
use crate::config::SnapConfig;
use crate::scroller::IncrementalScroller;
use crate::snapshot_writer::SnapshotWriter;
use crate::stability::StabilityProbe;

/// Drives section tasks through navigation, stabilization, scrolling and
/// capture submission, and collects every capture exactly once.
pub struct CapturePipeline<P: SurfaceProvider> {
    provider: P,
    options: CaptureOptions,
    stability: StabilityProbe,
    scroller: IncrementalScroller,
    writer: SnapshotWriter,
    pending: PendingSet<P::Surface>,
    settle_delay: Duration,
    capture_timeout: Duration,
    capture_poll_interval: Duration,
    scroll_max_rounds: u32,
    /// The default tab, kept as the anchor page for link discovery.
    anchor: Option<P::Surface>,
    /// Failures recorded by the driver loop itself (the pending set records
    /// everything that made it to submission).
    records: Vec<SectionRecord>,
}

impl<P: SurfaceProvider> CapturePipeline<P> {
    #[must_use]
    pub fn new(
        provider: P,
        writer: SnapshotWriter,
        config: &SnapConfig,
        options: CaptureOptions,
    ) -> Self {
        let stability = StabilityProbe::new(
            config.stability_interval(),
            config.stability_rounds(),
            config.stability_timeout(),
        );
        let scroller = IncrementalScroller::new(
            config.scroll_pause(),
            config.scroll_tick(),
            config.scroll_no_growth_limit(),
        );
        Self {
            provider,
            options,
            stability,
            scroller,
            writer: writer.clone(),
            pending: PendingSet::new(writer),
            settle_delay: config.settle_delay(),
            capture_timeout: config.capture_timeout(),
            capture_poll_interval: config.capture_poll_interval(),
            scroll_max_rounds: config.scroll_max_rounds(),
            anchor: None,
            records: Vec::new(),
        }
    }

    /// Run every task in submission order, then drain all remaining
    /// captures. Individual task failures never abort the run.
    pub async fn run(mut self, tasks: Vec<SectionTask>) -> RunSummary {
        let total = tasks.len();
        for (index, task) in tasks.into_iter().enumerate() {
            info!("section {}/{}: '{}'", index + 1, total, task.key);
            self.run_task(task, index == 0).await;
        }

        info!(
            "all sections submitted; {} capture(s) still outstanding",
            self.pending.len()
        );
        self.pending
            .drain_all(self.capture_timeout, self.capture_poll_interval)
            .await;

        let mut sections = self.records;
        sections.extend(self.pending.take_records());
        RunSummary { sections }
    }

    /// Number of captures currently pending. Exposed for instrumentation.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    async fn run_task(&mut self, task: SectionTask, is_first: bool) {
        let acquired = self.acquire_surface(is_first).await;
        let surface = match acquired {
            Ok(s) => s,
            Err(e) => {
                warn!("no tab for section '{}': {e}", task.key);
                self.record_failure(&task.key, format!("tab unavailable: {e}"));
                return;
            }
        };

        let Some(url) = self.resolve_target(&task).await else {
            warn!("no navigation target for section '{}'; skipping", task.key);
            self.record_failure(&task.key, "no navigation target".to_string());
            release_unless_default(&surface, is_first).await;
            return;
        };

        debug!(key = %task.key, phase = ?TaskPhase::Navigating, %url);
        if let Err(e) = surface.navigate(&url).await {
            warn!("navigation to {url} failed for '{}': {e}", task.key);
            self.record_failure(&task.key, e.to_string());
            release_unless_default(&surface, is_first).await;
            return;
        }
        if is_first {
            // The profile main page doubles as the anchor for link
            // discovery of later sections.
            self.anchor = Some(surface.clone());
        }
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        debug!(key = %task.key, phase = ?TaskPhase::Stabilizing);
        if !self.stability.wait_stable(&surface).await {
            debug!("section '{}' never fully settled; capturing anyway", task.key);
        }

        if let Err(e) = surface.expand_collapsed().await {
            debug!("expander pass failed for '{}': {e}", task.key);
        }

        if task.scroll_budget > 0 {
            let budget = task.scroll_budget.min(self.scroll_max_rounds);
            debug!(key = %task.key, phase = ?TaskPhase::Scrolling, budget);
            self.scroller
                .scroll_to_grow(&surface, budget, &mut self.pending)
                .await;
        }

        debug!(key = %task.key, phase = ?TaskPhase::CaptureSubmitted);
        let submitted = surface.submit_capture(&task.key, &self.options).await;
        if let Err(e) = submitted {
            warn!("capture submission failed for '{}': {e}", task.key);
            self.record_submit_failure(&task, &surface, e).await;
            release_unless_default(&surface, is_first).await;
            return;
        }

        self.pending.register(task.key.clone(), surface, is_first);

        // Maintenance sweep before moving on to the next section.
        self.pending.drain_ready().await;
    }

    async fn acquire_surface(&self, is_first: bool) -> Result<P::Surface, SurfaceError> {
        if is_first {
            self.provider.default_surface().await
        } else {
            self.provider.new_surface().await
        }
    }

    /// Resolve a task's navigation target, consulting the anchor page for
    /// discovered targets and falling back to the constructed URL.
    async fn resolve_target(&self, task: &SectionTask) -> Option<String> {
        match &task.target {
            SectionTarget::Url(url) => Some(url.clone()),
            SectionTarget::Discovered {
                keywords,
                href_pattern,
                fallback_url,
            } => {
                if let Some(anchor) = &self.anchor {
                    if !keywords.is_empty() {
                        match anchor.find_link_by_text(keywords).await {
                            Ok(Some(href)) => return Some(href),
                            Ok(None) => {}
                            Err(e) => debug!("text link lookup failed: {e}"),
                        }
                    }
                    if let Some(pattern) = href_pattern {
                        match anchor.find_link_by_href(pattern).await {
                            Ok(Some(href)) => return Some(href),
                            Ok(None) => {}
                            Err(e) => debug!("href link lookup failed: {e}"),
                        }
                    }
                }
                fallback_url.clone()
            }
        }
    }

    fn record_failure(&mut self, key: &str, error: String) {
        self.records.push(SectionRecord {
            key: key.to_string(),
            outcome: SectionOutcome::NavigationFailed { error },
        });
    }

    /// A failed submission still yields a raw-DOM fallback artifact when the
    /// page can be read, so only unreachable sections leave a gap.
    async fn record_submit_failure(
        &mut self,
        task: &SectionTask,
        surface: &P::Surface,
        cause: SurfaceError,
    ) {
        let fallback_path = match surface.page_content().await {
            Ok(html) => self.writer.write_fallback(&html, &task.key).await.ok(),
            Err(_) => None,
        };
        self.records.push(SectionRecord {
            key: task.key.clone(),
            outcome: SectionOutcome::SubmitFailed {
                fallback_path,
                error: cause.to_string(),
            },
        });
    }
}

async fn release_unless_default<S: SectionSurface>(surface: &S, is_default: bool) {
    if is_default {
        return;
    }
    if let Err(e) = surface.close().await {
        warn!("failed to close task tab: {e}");
    }
}
