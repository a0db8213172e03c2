//! Getter methods for `SnapConfig`.
//!
//! Duration-valued settings are stored as plain integers for serde but
//! exposed as `Duration` here, so call sites never convert units themselves.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::types::SnapConfig;

impl SnapConfig {
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    #[must_use]
    pub fn profile_url(&self) -> &str {
        &self.profile_url
    }

    #[must_use]
    pub fn credentials_file(&self) -> &Path {
        &self.credentials_file
    }

    #[must_use]
    pub fn capture_engine_dir(&self) -> &Path {
        &self.capture_engine_dir
    }

    /// Extension assembly directory; a process-unique temp directory unless
    /// overridden.
    #[must_use]
    pub fn extension_dir(&self) -> PathBuf {
        self.extension_dir.clone().unwrap_or_else(|| {
            std::env::temp_dir().join(format!("profilesnap_ext_{}", std::process::id()))
        })
    }

    /// Browser profile directory; a process-unique temp directory unless
    /// overridden.
    #[must_use]
    pub fn user_data_dir(&self) -> PathBuf {
        self.user_data_dir.clone().unwrap_or_else(|| {
            std::env::temp_dir().join(format!("profilesnap_profile_{}", std::process::id()))
        })
    }

    #[must_use]
    pub fn cookie_domain(&self) -> &str {
        &self.cookie_domain
    }

    #[must_use]
    pub fn cookie_path(&self) -> &str {
        &self.cookie_path
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    #[must_use]
    pub fn stability_interval(&self) -> Duration {
        Duration::from_millis(self.stability_interval_ms)
    }

    #[must_use]
    pub fn stability_rounds(&self) -> u32 {
        self.stability_rounds
    }

    #[must_use]
    pub fn stability_timeout(&self) -> Duration {
        Duration::from_millis(self.stability_timeout_ms)
    }

    #[must_use]
    pub fn scroll_max_rounds(&self) -> u32 {
        self.scroll_max_rounds
    }

    #[must_use]
    pub fn feed_scroll_rounds(&self) -> u32 {
        self.feed_scroll_rounds
    }

    #[must_use]
    pub fn scroll_pause(&self) -> Duration {
        Duration::from_millis(self.scroll_pause_ms)
    }

    #[must_use]
    pub fn scroll_tick(&self) -> Duration {
        Duration::from_millis(self.scroll_tick_ms)
    }

    #[must_use]
    pub fn scroll_no_growth_limit(&self) -> u32 {
        self.scroll_no_growth_limit
    }

    #[must_use]
    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }

    #[must_use]
    pub fn capture_poll_interval(&self) -> Duration {
        Duration::from_millis(self.capture_poll_interval_ms)
    }

    #[must_use]
    pub fn nav_timeout_secs(&self) -> u64 {
        self.nav_timeout_secs
    }

    #[must_use]
    pub fn expander_patterns(&self) -> &[String] {
        &self.expander_patterns
    }

    #[must_use]
    pub fn expander_max_iterations(&self) -> u32 {
        self.expander_max_iterations
    }

    #[must_use]
    pub fn remove_temp_artifacts(&self) -> bool {
        self.remove_temp_artifacts
    }
}
