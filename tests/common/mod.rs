//! Test utilities for the profilesnap test suite.
//!
//! The centerpiece is a scripted in-memory [`SectionSurface`] so the
//! scheduling protocol can be exercised without a browser: each task key
//! gets a capture script describing when (or whether) the engine answers,
//! and every surface interaction is recorded as an event for ordering
//! assertions.
#![allow(dead_code)]

use profilesnap::SnapConfig;
use profilesnap::capture::{CaptureOptions, CaptureResult};
use profilesnap::pipeline::{SectionSurface, SurfaceError, SurfaceProvider};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Scripted engine behavior for one task key.
#[derive(Clone)]
pub enum CaptureScript {
    /// The result becomes visible once the key has been polled more than
    /// `polls` times.
    AfterPolls(u32, CaptureResult),
    /// The engine never answers.
    Never,
}

type SubmitHook = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Default)]
pub struct MockState {
    pub scripts: HashMap<String, CaptureScript>,
    pub poll_counts: HashMap<String, u32>,
    /// Every surface interaction in order: `navigate:<id>:<url>`,
    /// `submit:<key>`, `close:<id>`, `scroll:<id>`.
    pub events: Vec<String>,
    /// URLs whose navigation fails.
    pub failing_urls: Vec<String>,
    /// Sequence of content heights; the last value repeats once exhausted.
    pub heights: Vec<i64>,
    pub height_cursor: usize,
    /// Raw DOM body served by `page_content` (fallback artifacts).
    pub page_html: String,
    /// Called (lock released) after every capture submission.
    pub on_submit: Option<SubmitHook>,
}

impl MockState {
    pub fn script(&mut self, key: &str, script: CaptureScript) {
        self.scripts.insert(key.to_string(), script);
    }

    fn next_height(&mut self) -> i64 {
        if self.heights.is_empty() {
            return 1_000;
        }
        let index = self.height_cursor.min(self.heights.len() - 1);
        self.height_cursor += 1;
        self.heights[index]
    }
}

/// Result payload helper.
pub fn capture_ok(content: &str) -> CaptureResult {
    CaptureResult {
        content: content.to_string(),
        ..CaptureResult::default()
    }
}

#[derive(Clone)]
pub struct MockSurface {
    pub id: usize,
    pub state: Arc<Mutex<MockState>>,
}

impl MockSurface {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state poisoned")
    }
}

impl SectionSurface for MockSurface {
    async fn navigate(&self, url: &str) -> Result<(), SurfaceError> {
        let mut state = self.lock();
        state.events.push(format!("navigate:{}:{url}", self.id));
        if state.failing_urls.iter().any(|u| u == url) {
            return Err(SurfaceError::Navigation(format!("cannot reach {url}")));
        }
        Ok(())
    }

    async fn content_height(&self) -> Result<i64, SurfaceError> {
        Ok(self.lock().next_height())
    }

    async fn scroll_to_bottom(&self) -> Result<(), SurfaceError> {
        self.lock().events.push(format!("scroll:{}", self.id));
        Ok(())
    }

    async fn page_content(&self) -> Result<String, SurfaceError> {
        Ok(self.lock().page_html.clone())
    }

    async fn find_link_by_text(&self, _keywords: &[String]) -> Result<Option<String>, SurfaceError> {
        Ok(None)
    }

    async fn find_link_by_href(&self, _pattern: &str) -> Result<Option<String>, SurfaceError> {
        Ok(None)
    }

    async fn submit_capture(
        &self,
        key: &str,
        _options: &CaptureOptions,
    ) -> Result<(), SurfaceError> {
        let hook = {
            let mut state = self.lock();
            state.events.push(format!("submit:{key}"));
            state.on_submit.clone()
        };
        if let Some(hook) = hook {
            hook(key);
        }
        Ok(())
    }

    async fn poll_capture(&self, key: &str) -> Result<Option<CaptureResult>, SurfaceError> {
        let mut state = self.lock();
        let count = state.poll_counts.entry(key.to_string()).or_insert(0);
        *count += 1;
        let count = *count;
        match state.scripts.get(key) {
            Some(CaptureScript::AfterPolls(polls, result)) if count > *polls => {
                Ok(Some(result.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn close(&self) -> Result<(), SurfaceError> {
        self.lock().events.push(format!("close:{}", self.id));
        Ok(())
    }
}

/// Hands out the shared default surface (id 0) and numbered fresh surfaces.
pub struct MockProvider {
    pub state: Arc<Mutex<MockState>>,
    next_id: AtomicUsize,
}

impl MockProvider {
    pub fn new(state: Arc<Mutex<MockState>>) -> Self {
        Self {
            state,
            next_id: AtomicUsize::new(1),
        }
    }
}

impl SurfaceProvider for MockProvider {
    type Surface = MockSurface;

    async fn default_surface(&self) -> Result<MockSurface, SurfaceError> {
        Ok(MockSurface {
            id: 0,
            state: Arc::clone(&self.state),
        })
    }

    async fn new_surface(&self) -> Result<MockSurface, SurfaceError> {
        Ok(MockSurface {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            state: Arc::clone(&self.state),
        })
    }
}

/// A config with millisecond-scale timings so protocol tests finish fast.
pub fn fast_config(output_dir: &Path) -> SnapConfig {
    SnapConfig::builder()
        .output_dir(output_dir)
        .profile_url("https://example.com/someone")
        .settle_delay_ms(0)
        .stability_interval_ms(1)
        .stability_rounds(1)
        .stability_timeout_ms(20)
        .scroll_pause_ms(4)
        .scroll_tick_ms(1)
        .scroll_no_growth_limit(2)
        .capture_timeout_ms(100)
        .capture_poll_interval_ms(2)
        .build()
        .expect("test config must build")
}
