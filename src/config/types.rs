//! Core configuration types for snapshot runs.
//!
//! This module contains the main `SnapConfig` struct that defines every
//! parameter of a profile snapshot run.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Expander button texts clicked before capture, in priority order.
pub(crate) fn default_expander_patterns() -> Vec<String> {
    [
        "See more",
        "See More",
        "see more",
        "See original",
        "See translation",
        "View more comments",
        "See more comments",
        "View more replies",
        "Load more comments",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// Main configuration for a profile snapshot run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapConfig {
    /// Root directory under which the run's snapshot directory is created.
    pub(crate) output_dir: PathBuf,

    /// Profile URL the run starts from.
    ///
    /// **INVARIANT:** Always carries an explicit scheme (normalized in the
    /// builder).
    pub(crate) profile_url: String,

    /// Credentials file holding the raw cookie header.
    pub(crate) credentials_file: PathBuf,

    /// Directory containing the capture engine's `lib/` assets.
    pub(crate) capture_engine_dir: PathBuf,

    /// Where the controller extension is assembled. Defaults to a
    /// process-unique temp directory.
    pub(crate) extension_dir: Option<PathBuf>,

    /// Browser profile directory. Defaults to a process-unique temp
    /// directory.
    pub(crate) user_data_dir: Option<PathBuf>,

    /// Cookie domain the parsed cookies are bound to.
    pub(crate) cookie_domain: String,
    pub(crate) cookie_path: String,

    /// Run the browser headless. Off by default: capture extensions are
    /// unreliable without a visible browser window.
    pub(crate) headless: bool,

    /// Fixed delay after navigation before the stability probe starts.
    pub(crate) settle_delay_ms: u64,

    /// Interval between stability samples.
    pub(crate) stability_interval_ms: u64,
    /// Consecutive unchanged samples required to call a page stable.
    pub(crate) stability_rounds: u32,
    /// Upper bound on the whole stability wait.
    pub(crate) stability_timeout_ms: u64,

    /// Global cap on scroll rounds per section, and the budget used for the
    /// friends section.
    pub(crate) scroll_max_rounds: u32,
    /// Scroll budget for media feed sections (photos, videos).
    pub(crate) feed_scroll_rounds: u32,
    /// Pause after each scroll round.
    pub(crate) scroll_pause_ms: u64,
    /// Slice of the scroll pause between maintenance ticks.
    pub(crate) scroll_tick_ms: u64,
    /// Consecutive no-growth rounds after which scrolling stops early.
    pub(crate) scroll_no_growth_limit: u32,

    /// Upper bound on one capture during the exhaustive drain. Captures can
    /// legitimately take minutes on media-heavy pages.
    pub(crate) capture_timeout_ms: u64,
    /// Poll cadence while blocking on a capture.
    pub(crate) capture_poll_interval_ms: u64,

    /// Timeout for individual page operations (goto, load wait).
    pub(crate) nav_timeout_secs: u64,

    /// Expander button texts clicked before capture.
    pub(crate) expander_patterns: Vec<String>,
    /// Maximum expander passes per page.
    pub(crate) expander_max_iterations: u32,

    /// Remove the generated extension and browser profile directories when
    /// the run finishes.
    pub(crate) remove_temp_artifacts: bool,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./reports"),
            profile_url: String::new(),
            credentials_file: PathBuf::from(".env"),
            capture_engine_dir: PathBuf::from("./SingleFile"),
            extension_dir: None,
            user_data_dir: None,
            cookie_domain: ".facebook.com".to_string(),
            cookie_path: "/".to_string(),
            headless: false,
            settle_delay_ms: 2_000,
            stability_interval_ms: 500,
            stability_rounds: 3,
            stability_timeout_ms: 15_000,
            scroll_max_rounds: 10,
            feed_scroll_rounds: 6,
            scroll_pause_ms: 1_000,
            scroll_tick_ms: 250,
            scroll_no_growth_limit: 3,
            capture_timeout_ms: 180_000,
            capture_poll_interval_ms: 500,
            nav_timeout_secs: 60,
            expander_patterns: default_expander_patterns(),
            expander_max_iterations: 6,
            remove_temp_artifacts: true,
        }
    }
}
