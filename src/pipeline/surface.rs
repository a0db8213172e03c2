//! The browser-tab seam the scheduler drives.
//!
//! The pipeline never talks to chromiumoxide directly; it drives one
//! [`SectionSurface`] per task and obtains them from a [`SurfaceProvider`].
//! The production implementation wraps a CDP page (see
//! [`chromium`](super::chromium)); tests script an in-memory surface to
//! exercise the scheduling protocol without a browser.

use std::time::{Duration, Instant};
use thiserror::Error;

use crate::capture::{BridgeError, CaptureOptions, CaptureResult};

/// Errors surfaced by a section surface.
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// Page navigation failed or never settled.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// In-page evaluation failed.
    #[error("page evaluation failed: {0}")]
    Evaluation(String),

    /// The capture bridge failed.
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// No tab could be produced or the tab could not be released.
    #[error("browser tab unavailable: {0}")]
    Tab(String),
}

impl SurfaceError {
    /// Whether this error is a bridge timeout (engine never answered).
    #[must_use]
    pub fn is_capture_timeout(&self) -> bool {
        matches!(self, Self::Bridge(BridgeError::CaptureTimeout { .. }))
    }
}

/// One browser tab hosting a profile section for the lifetime of a task.
///
/// Surfaces are cheap handles (`Clone` shares the same underlying tab); the
/// pipeline keeps a clone inside the pending set while a capture is in
/// flight and releases the tab with [`close`](Self::close) once the result
/// is drained.
pub trait SectionSurface: Clone {
    /// Navigate the tab and wait for the load to settle.
    fn navigate(&self, url: &str) -> impl Future<Output = Result<(), SurfaceError>>;

    /// Scalar layout metric sampled by the stability probe and the scroller.
    fn content_height(&self) -> impl Future<Output = Result<i64, SurfaceError>>;

    /// Scroll to the current end of the content.
    fn scroll_to_bottom(&self) -> impl Future<Output = Result<(), SurfaceError>>;

    /// Raw DOM serialization, used for fallback artifacts when the capture
    /// engine never answers.
    fn page_content(&self) -> impl Future<Output = Result<String, SurfaceError>>;

    /// First anchor whose visible text contains one of `keywords`, as an
    /// absolute URL.
    fn find_link_by_text(
        &self,
        keywords: &[String],
    ) -> impl Future<Output = Result<Option<String>, SurfaceError>>;

    /// First anchor whose href contains `pattern`, as an absolute URL.
    fn find_link_by_href(
        &self,
        pattern: &str,
    ) -> impl Future<Output = Result<Option<String>, SurfaceError>>;

    /// Best-effort expansion of collapsed page content before capture.
    fn expand_collapsed(&self) -> impl Future<Output = Result<(), SurfaceError>> {
        async { Ok(()) }
    }

    /// Fire-and-forget capture submission tagged with `key`.
    fn submit_capture(
        &self,
        key: &str,
        options: &CaptureOptions,
    ) -> impl Future<Output = Result<(), SurfaceError>>;

    /// Single non-blocking check for a completed capture. `Ok(None)` is the
    /// normal outcome while the engine is still working.
    fn poll_capture(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<CaptureResult>, SurfaceError>>;

    /// Block until the capture for `key` completes or `timeout` elapses.
    ///
    /// The default implementation is a poll loop over
    /// [`poll_capture`](Self::poll_capture); there is no push notification
    /// from the engine, so this is the only way to wait.
    fn await_capture(
        &self,
        key: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> impl Future<Output = Result<CaptureResult, SurfaceError>> {
        async move {
            let deadline = Instant::now() + timeout;
            loop {
                if let Some(result) = self.poll_capture(key).await? {
                    return Ok(result);
                }
                if Instant::now() >= deadline {
                    return Err(SurfaceError::Bridge(BridgeError::CaptureTimeout {
                        key: key.to_string(),
                        timeout,
                    }));
                }
                tokio::time::sleep(poll_interval).await;
            }
        }
    }

    /// Release the tab. Called exactly once per non-default surface, after
    /// its capture has been drained or abandoned.
    fn close(&self) -> impl Future<Output = Result<(), SurfaceError>>;
}

/// Factory for section surfaces.
pub trait SurfaceProvider {
    type Surface: SectionSurface;

    /// The run's pre-existing default tab. Claimed by the first task and
    /// used as the anchor page for link discovery; never closed
    /// automatically.
    fn default_surface(&self) -> impl Future<Output = Result<Self::Surface, SurfaceError>>;

    /// Open a fresh tab for one task.
    fn new_surface(&self) -> impl Future<Output = Result<Self::Surface, SurfaceError>>;
}
