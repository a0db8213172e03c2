//! Chromiumoxide-backed section surfaces.
//!
//! Thin adapter between the scheduler's [`SectionSurface`] seam and a CDP
//! page: navigation with explicit timeouts, layout measurements and link
//! discovery via in-page evaluation, and capture traffic through the
//! `postMessage` bridge.

use chromiumoxide::browser::Browser;
use chromiumoxide::page::Page;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::surface::{SectionSurface, SurfaceError, SurfaceProvider};
use crate::capture::{self, CaptureOptions, CaptureResult};
use crate::config::SnapConfig;
use crate::link_resolver;
use crate::utils::with_page_timeout;

/// Shared per-run settings for chromium surfaces.
#[derive(Debug)]
struct SurfaceSettings {
    nav_timeout_secs: u64,
    expander_patterns: Vec<String>,
    expander_max_iterations: u32,
}

/// One CDP page driven as a section surface.
///
/// Clones share the same underlying tab; the pipeline relies on that to keep
/// a handle inside the pending set while the anchor clone stays usable for
/// link discovery.
#[derive(Clone)]
pub struct ChromiumSurface {
    page: Page,
    settings: Arc<SurfaceSettings>,
}

impl ChromiumSurface {
    fn new(page: Page, settings: Arc<SurfaceSettings>) -> Self {
        Self { page, settings }
    }

    /// The underlying CDP page.
    #[must_use]
    pub fn page(&self) -> &Page {
        &self.page
    }
}

impl SectionSurface for ChromiumSurface {
    async fn navigate(&self, url: &str) -> Result<(), SurfaceError> {
        let timeout = self.settings.nav_timeout_secs;

        with_page_timeout(
            async {
                self.page
                    .goto(url)
                    .await
                    .map_err(|e| anyhow::anyhow!("{e}"))?;
                Ok(())
            },
            timeout,
            "Page navigation",
        )
        .await
        .map_err(|e| SurfaceError::Navigation(format!("{e:#}")))?;

        with_page_timeout(
            async {
                self.page
                    .wait_for_navigation()
                    .await
                    .map_err(|e| anyhow::anyhow!("{e}"))?;
                Ok(())
            },
            timeout,
            "Page load",
        )
        .await
        .map_err(|e| SurfaceError::Navigation(format!("{e:#}")))?;

        Ok(())
    }

    async fn content_height(&self) -> Result<i64, SurfaceError> {
        let evaluated = self
            .page
            .evaluate("document.body ? document.body.scrollHeight : 0")
            .await
            .map_err(|e| SurfaceError::Evaluation(e.to_string()))?;
        evaluated
            .value()
            .and_then(serde_json::Value::as_i64)
            .ok_or_else(|| SurfaceError::Evaluation("scrollHeight not numeric".to_string()))
    }

    async fn scroll_to_bottom(&self) -> Result<(), SurfaceError> {
        self.page
            .evaluate("window.scrollTo(0, document.body ? document.body.scrollHeight : 0)")
            .await
            .map_err(|e| SurfaceError::Evaluation(e.to_string()))?;
        Ok(())
    }

    async fn page_content(&self) -> Result<String, SurfaceError> {
        self.page
            .content()
            .await
            .map_err(|e| SurfaceError::Evaluation(e.to_string()))
    }

    async fn find_link_by_text(&self, keywords: &[String]) -> Result<Option<String>, SurfaceError> {
        link_resolver::find_link_by_text(&self.page, keywords)
            .await
            .map_err(|e| SurfaceError::Evaluation(format!("{e:#}")))
    }

    async fn find_link_by_href(&self, pattern: &str) -> Result<Option<String>, SurfaceError> {
        link_resolver::find_link_by_href(&self.page, pattern)
            .await
            .map_err(|e| SurfaceError::Evaluation(format!("{e:#}")))
    }

    async fn expand_collapsed(&self) -> Result<(), SurfaceError> {
        link_resolver::click_expanders(
            &self.page,
            &self.settings.expander_patterns,
            self.settings.expander_max_iterations,
        )
        .await
        .map(|_| ())
        .map_err(|e| SurfaceError::Evaluation(format!("{e:#}")))
    }

    async fn submit_capture(&self, key: &str, options: &CaptureOptions) -> Result<(), SurfaceError> {
        capture::submit(&self.page, key, options).await?;
        Ok(())
    }

    async fn poll_capture(&self, key: &str) -> Result<Option<CaptureResult>, SurfaceError> {
        Ok(capture::poll(&self.page, key).await?)
    }

    async fn await_capture(
        &self,
        key: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<CaptureResult, SurfaceError> {
        Ok(capture::await_result(&self.page, key, timeout, poll_interval).await?)
    }

    async fn close(&self) -> Result<(), SurfaceError> {
        self.page
            .clone()
            .close()
            .await
            .map_err(|e| SurfaceError::Tab(format!("close failed: {e}")))
    }
}

/// Hands out chromium surfaces: the run's pre-existing default tab once,
/// then a fresh tab per task.
pub struct ChromiumSurfaceProvider {
    browser: Arc<Browser>,
    default_page: Mutex<Option<Page>>,
    settings: Arc<SurfaceSettings>,
}

impl ChromiumSurfaceProvider {
    /// `default_page` is the tab the run already opened (cookie injection,
    /// profile-id detection); the first task reuses it instead of opening a
    /// new one.
    #[must_use]
    pub fn new(browser: Arc<Browser>, default_page: Page, config: &SnapConfig) -> Self {
        let settings = Arc::new(SurfaceSettings {
            nav_timeout_secs: config.nav_timeout_secs(),
            expander_patterns: config.expander_patterns().to_vec(),
            expander_max_iterations: config.expander_max_iterations(),
        });
        Self {
            browser,
            default_page: Mutex::new(Some(default_page)),
            settings,
        }
    }
}

impl SurfaceProvider for ChromiumSurfaceProvider {
    type Surface = ChromiumSurface;

    async fn default_surface(&self) -> Result<ChromiumSurface, SurfaceError> {
        let page = self
            .default_page
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take()
            .ok_or_else(|| SurfaceError::Tab("default tab already claimed".into()))?;
        Ok(ChromiumSurface::new(page, Arc::clone(&self.settings)))
    }

    async fn new_surface(&self) -> Result<ChromiumSurface, SurfaceError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| SurfaceError::Tab(format!("new_page failed: {e}")))?;
        Ok(ChromiumSurface::new(page, Arc::clone(&self.settings)))
    }
}
