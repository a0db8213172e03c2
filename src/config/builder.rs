//! Type-safe builder for `SnapConfig` using the typestate pattern.
//!
//! The two required fields — output directory and profile URL — must be set
//! before `build()` exists, enforced at compile time.

use anyhow::{Result, anyhow};
use std::marker::PhantomData;
use std::path::PathBuf;
use url::Url;

use super::types::SnapConfig;

// Type states for the builder
pub struct WithOutputDir;
pub struct Complete;

pub struct SnapConfigBuilder<State = ()> {
    config: SnapConfig,
    _phantom: PhantomData<State>,
}

impl SnapConfig {
    /// Create a builder for configuring a `SnapConfig` with a fluent
    /// interface.
    #[must_use]
    pub fn builder() -> SnapConfigBuilder<()> {
        SnapConfigBuilder {
            config: SnapConfig::default(),
            _phantom: PhantomData,
        }
    }
}

impl SnapConfigBuilder<()> {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> SnapConfigBuilder<WithOutputDir> {
        self.config.output_dir = dir.into();
        SnapConfigBuilder {
            config: self.config,
            _phantom: PhantomData,
        }
    }
}

impl SnapConfigBuilder<WithOutputDir> {
    pub fn profile_url(mut self, url: impl Into<String>) -> SnapConfigBuilder<Complete> {
        let url_string = url.into();

        // Normalize URL: add https:// if no scheme is present
        let normalized =
            if url_string.starts_with("http://") || url_string.starts_with("https://") {
                url_string
            } else {
                format!("https://{url_string}")
            };

        self.config.profile_url = normalized;
        SnapConfigBuilder {
            config: self.config,
            _phantom: PhantomData,
        }
    }
}

// Optional fields are settable in any state.
impl<State> SnapConfigBuilder<State> {
    #[must_use]
    pub fn credentials_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.credentials_file = path.into();
        self
    }

    #[must_use]
    pub fn capture_engine_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.capture_engine_dir = path.into();
        self
    }

    #[must_use]
    pub fn extension_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.extension_dir = Some(path.into());
        self
    }

    #[must_use]
    pub fn user_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.user_data_dir = Some(path.into());
        self
    }

    #[must_use]
    pub fn cookie_domain(mut self, domain: impl Into<String>) -> Self {
        self.config.cookie_domain = domain.into();
        self
    }

    #[must_use]
    pub fn cookie_path(mut self, path: impl Into<String>) -> Self {
        self.config.cookie_path = path.into();
        self
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    #[must_use]
    pub fn settle_delay_ms(mut self, ms: u64) -> Self {
        self.config.settle_delay_ms = ms;
        self
    }

    #[must_use]
    pub fn stability_interval_ms(mut self, ms: u64) -> Self {
        self.config.stability_interval_ms = ms;
        self
    }

    #[must_use]
    pub fn stability_rounds(mut self, rounds: u32) -> Self {
        self.config.stability_rounds = rounds;
        self
    }

    #[must_use]
    pub fn stability_timeout_ms(mut self, ms: u64) -> Self {
        self.config.stability_timeout_ms = ms;
        self
    }

    #[must_use]
    pub fn scroll_max_rounds(mut self, rounds: u32) -> Self {
        self.config.scroll_max_rounds = rounds;
        self
    }

    #[must_use]
    pub fn feed_scroll_rounds(mut self, rounds: u32) -> Self {
        self.config.feed_scroll_rounds = rounds;
        self
    }

    #[must_use]
    pub fn scroll_pause_ms(mut self, ms: u64) -> Self {
        self.config.scroll_pause_ms = ms;
        self
    }

    #[must_use]
    pub fn scroll_tick_ms(mut self, ms: u64) -> Self {
        self.config.scroll_tick_ms = ms;
        self
    }

    #[must_use]
    pub fn scroll_no_growth_limit(mut self, rounds: u32) -> Self {
        self.config.scroll_no_growth_limit = rounds;
        self
    }

    #[must_use]
    pub fn capture_timeout_ms(mut self, ms: u64) -> Self {
        self.config.capture_timeout_ms = ms;
        self
    }

    #[must_use]
    pub fn capture_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.capture_poll_interval_ms = ms;
        self
    }

    #[must_use]
    pub fn nav_timeout_secs(mut self, secs: u64) -> Self {
        self.config.nav_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn expander_patterns(mut self, patterns: Vec<String>) -> Self {
        self.config.expander_patterns = patterns;
        self
    }

    #[must_use]
    pub fn expander_max_iterations(mut self, iterations: u32) -> Self {
        self.config.expander_max_iterations = iterations;
        self
    }

    #[must_use]
    pub fn remove_temp_artifacts(mut self, remove: bool) -> Self {
        self.config.remove_temp_artifacts = remove;
        self
    }
}

// Build method only available when all required fields are set
impl SnapConfigBuilder<Complete> {
    pub fn build(self) -> Result<SnapConfig> {
        let config = self.config;

        Url::parse(&config.profile_url)
            .map_err(|e| anyhow!("invalid profile URL '{}': {e}", config.profile_url))?;

        if config.stability_rounds == 0 {
            return Err(anyhow!("stability_rounds must be at least 1"));
        }
        if config.scroll_no_growth_limit == 0 {
            return Err(anyhow!("scroll_no_growth_limit must be at least 1"));
        }

        Ok(config)
    }
}
