//! The pending set: submitted-but-not-yet-collected captures.
//!
//! Every submitted capture is tracked here until its result is drained
//! exactly once — opportunistically while later tasks navigate and scroll,
//! or exhaustively at the end of the run. Draining an entry writes its
//! artifact, releases its tab and records the outcome; an entry that has
//! been drained no longer exists, which is what makes repeated polls of the
//! same key harmless.
//!
//! The set is owned and mutated by the single driver task only; there is no
//! cross-thread sharing to guard.

use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::surface::{SectionSurface, SurfaceError};
use super::task::{SectionOutcome, SectionRecord};
use crate::capture::CaptureResult;
use crate::scroller::DrainSink;
use crate::snapshot_writer::SnapshotWriter;

/// One in-flight capture: a submitted task waiting for its result.
///
/// Owns the task's tab for as long as the capture is outstanding. At most
/// one entry exists per task key at any time.
#[derive(Debug)]
pub struct PendingCapture<S> {
    pub task_key: String,
    pub surface: S,
    /// The run's default tab is never closed automatically.
    pub is_default: bool,
    pub submitted_at: Instant,
}

/// Tracks pending captures and drains their results.
#[derive(Debug)]
pub struct PendingSet<S: SectionSurface> {
    entries: Vec<PendingCapture<S>>,
    writer: SnapshotWriter,
    records: Vec<SectionRecord>,
}

impl<S: SectionSurface> PendingSet<S> {
    #[must_use]
    pub fn new(writer: SnapshotWriter) -> Self {
        Self {
            entries: Vec::new(),
            writer,
            records: Vec::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, task_key: &str) -> bool {
        self.entries.iter().any(|e| e.task_key == task_key)
    }

    /// Track a freshly submitted capture.
    ///
    /// Rejects a key that is already pending — the pipeline consumes each
    /// task once, so a duplicate means a task list bug, not a retry.
    pub fn register(&mut self, task_key: String, surface: S, is_default: bool) -> bool {
        if self.contains(&task_key) {
            warn!("capture '{task_key}' is already pending; ignoring duplicate registration");
            return false;
        }
        debug!("capture '{task_key}' registered as pending");
        self.entries.push(PendingCapture {
            task_key,
            surface,
            is_default,
            submitted_at: Instant::now(),
        });
        true
    }

    /// Non-blocking sweep: poll every pending capture once and drain those
    /// whose result is available. Entries without a result stay put; this
    /// never waits.
    pub async fn drain_ready(&mut self) -> usize {
        let mut drained = 0;
        let mut index = 0;
        while index < self.entries.len() {
            let key = self.entries[index].task_key.clone();
            let polled = self.entries[index].surface.poll_capture(&key).await;
            match polled {
                Ok(Some(result)) => {
                    let entry = self.entries.remove(index);
                    self.finish(entry, result).await;
                    drained += 1;
                }
                Ok(None) => index += 1,
                Err(e) => {
                    // Transient bridge trouble; the exhaustive drain is the
                    // backstop if this never recovers.
                    debug!("poll for pending capture '{key}' failed: {e}");
                    index += 1;
                }
            }
        }
        if drained > 0 {
            debug!("opportunistic drain collected {drained} capture(s)");
        }
        drained
    }

    /// Blocking sweep: wait for every remaining capture, one at a time, each
    /// bounded by `timeout`. A capture that never resolves is abandoned with
    /// a raw-DOM fallback artifact instead of hanging the run, so this
    /// terminates after at most `len() * timeout`.
    pub async fn drain_all(&mut self, timeout: Duration, poll_interval: Duration) {
        while !self.entries.is_empty() {
            let entry = self.entries.remove(0);
            let key = entry.task_key.clone();
            let awaited = entry
                .surface
                .await_capture(&key, timeout, poll_interval)
                .await;
            match awaited {
                Ok(result) => self.finish(entry, result).await,
                Err(e) => {
                    error!("capture '{key}' did not complete: {e}");
                    self.abandon(entry, &e).await;
                }
            }
        }
    }

    /// Records accumulated by draining, in drain order.
    #[must_use]
    pub fn take_records(&mut self) -> Vec<SectionRecord> {
        std::mem::take(&mut self.records)
    }

    /// Write a drained result, release the tab, record the outcome.
    async fn finish(&mut self, entry: PendingCapture<S>, result: CaptureResult) {
        let key = entry.task_key.clone();
        let waited = entry.submitted_at.elapsed();

        let outcome = match self.writer.write(&result, &key).await {
            Ok(path) => {
                if let Some(engine_error) = &result.error {
                    warn!("capture engine reported an error for '{key}': {engine_error}");
                    SectionOutcome::EngineError {
                        path,
                        error: engine_error.clone(),
                    }
                } else {
                    info!("drained capture '{key}' after {waited:?}");
                    SectionOutcome::Captured {
                        path,
                        title: result.title.clone(),
                    }
                }
            }
            Err(e) => {
                error!("failed to persist capture '{key}': {e:#}");
                SectionOutcome::WriteFailed {
                    error: format!("{e:#}"),
                }
            }
        };

        self.records.push(SectionRecord { key, outcome });
        release_surface(&entry.surface, entry.is_default).await;
    }

    /// Give up on a capture that never resolved: write what the page itself
    /// still holds, release the tab, record the failure.
    async fn abandon(&mut self, entry: PendingCapture<S>, cause: &SurfaceError) {
        let key = entry.task_key.clone();

        let fallback_path = match entry.surface.page_content().await {
            Ok(html) => match self.writer.write_fallback(&html, &key).await {
                Ok(path) => {
                    warn!("wrote raw DOM fallback for '{key}'");
                    Some(path)
                }
                Err(e) => {
                    error!("failed to persist fallback for '{key}': {e:#}");
                    None
                }
            },
            Err(e) => {
                debug!("page content unavailable for '{key}' fallback: {e}");
                None
            }
        };

        let outcome = if cause.is_capture_timeout() {
            SectionOutcome::TimedOut { fallback_path }
        } else {
            SectionOutcome::SubmitFailed {
                fallback_path,
                error: cause.to_string(),
            }
        };
        self.records.push(SectionRecord { key, outcome });
        release_surface(&entry.surface, entry.is_default).await;
    }
}

/// Close a task's tab once its capture is settled. The default tab is only
/// ever closed explicitly by the caller that created it.
async fn release_surface<S: SectionSurface>(surface: &S, is_default: bool) {
    if is_default {
        return;
    }
    if let Err(e) = surface.close().await {
        warn!("failed to close task tab: {e}");
    }
}

/// Ticked by the scroller between pause slices: drain whatever is ready.
impl<S: SectionSurface> DrainSink for PendingSet<S> {
    async fn on_tick(&mut self) {
        let _ = self.drain_ready().await;
    }
}
