//! Layout stability detection.
//!
//! Profile pages keep reflowing for a while after the load event as feeds,
//! media and lazy modules stream in. The probe samples a single scalar
//! layout metric (total content height) until it stops changing, so captures
//! run against a settled page instead of a moving one.

use std::time::{Duration, Instant};
use tracing::{debug, trace};

use crate::pipeline::SectionSurface;

/// Polls a page's content height until it holds still.
#[derive(Debug, Clone, Copy)]
pub struct StabilityProbe {
    interval: Duration,
    required_stable_rounds: u32,
    timeout: Duration,
}

impl StabilityProbe {
    #[must_use]
    pub fn new(interval: Duration, required_stable_rounds: u32, timeout: Duration) -> Self {
        Self {
            interval,
            required_stable_rounds,
            timeout,
        }
    }

    /// Wait until the content height is unchanged for
    /// `required_stable_rounds` consecutive samples.
    ///
    /// Returns `false` when the timeout elapses first. That is a soft
    /// failure: callers proceed anyway, since the goal is a best-effort
    /// settle, not a correctness guarantee. Samples that cannot be read
    /// never count toward the stable streak.
    pub async fn wait_stable<S: SectionSurface>(&self, surface: &S) -> bool {
        let deadline = Instant::now() + self.timeout;
        let mut last: Option<i64> = None;
        let mut stable_rounds = 0u32;

        loop {
            let height = surface.content_height().await.ok();
            if height.is_some() && height == last {
                stable_rounds += 1;
            } else {
                stable_rounds = 0;
            }
            last = height;
            trace!(?height, stable_rounds, "stability sample");

            if stable_rounds >= self.required_stable_rounds {
                debug!("page settled after {stable_rounds} stable samples");
                return true;
            }
            if Instant::now() >= deadline {
                debug!("stability wait timed out after {:?}", self.timeout);
                return false;
            }
            tokio::time::sleep(self.interval).await;
        }
    }
}
