//! Incremental page scrolling with maintenance ticks.
//!
//! Feeds grow as they are scrolled; each round scrolls to the current end of
//! the content and then pauses so the page can load the next chunk. The
//! pause is sliced, and an opaque [`DrainSink`] is ticked after every slice
//! so the caller can do useful work (draining pending captures) during time
//! that would otherwise be spent sleeping. The scroller itself knows nothing
//! about captures.

use std::time::Duration;
use tracing::{debug, trace};

use crate::pipeline::SectionSurface;

/// Opaque notification sink ticked between scroll pause slices.
pub trait DrainSink {
    fn on_tick(&mut self) -> impl Future<Output = ()>;
}

/// No-op sink for callers with no maintenance to interleave.
impl DrainSink for () {
    async fn on_tick(&mut self) {}
}

/// Scrolls a page in rounds to grow its content.
#[derive(Debug, Clone, Copy)]
pub struct IncrementalScroller {
    pause_per_round: Duration,
    tick_slice: Duration,
    no_growth_limit: u32,
}

impl IncrementalScroller {
    /// `no_growth_limit` is the number of consecutive rounds without content
    /// growth after which scrolling stops early, independent of the round
    /// budget. It must stay well below typical budgets or large budgets
    /// would never be cut short on fully-loaded pages.
    #[must_use]
    pub fn new(pause_per_round: Duration, tick_slice: Duration, no_growth_limit: u32) -> Self {
        Self {
            pause_per_round,
            tick_slice,
            no_growth_limit: no_growth_limit.max(1),
        }
    }

    /// Scroll up to `max_rounds` times, ticking `sink` during every pause.
    ///
    /// Returns the number of rounds actually executed. Scroll or measurement
    /// errors end the session early; the page is captured in whatever state
    /// it reached.
    pub async fn scroll_to_grow<S, D>(&self, surface: &S, max_rounds: u32, sink: &mut D) -> u32
    where
        S: SectionSurface,
        D: DrainSink,
    {
        let mut last_height = match surface.content_height().await {
            Ok(h) => h,
            Err(e) => {
                debug!("could not measure page before scrolling: {e}");
                return 0;
            }
        };

        let mut rounds_without_growth = 0u32;
        let mut rounds_run = 0u32;

        for _ in 0..max_rounds {
            if let Err(e) = surface.scroll_to_bottom().await {
                debug!("scroll failed after {rounds_run} rounds: {e}");
                break;
            }
            rounds_run += 1;

            self.pause_with_ticks(sink).await;

            let height = match surface.content_height().await {
                Ok(h) => h,
                Err(e) => {
                    debug!("could not re-measure page: {e}");
                    break;
                }
            };
            trace!(rounds_run, height, last_height, "scroll round complete");

            if height > last_height {
                rounds_without_growth = 0;
                last_height = height;
            } else {
                rounds_without_growth += 1;
                if rounds_without_growth >= self.no_growth_limit {
                    debug!("content stopped growing after {rounds_run} rounds");
                    break;
                }
            }
        }

        rounds_run
    }

    /// Sleep `pause_per_round` in slices, ticking the sink after each slice.
    async fn pause_with_ticks<D: DrainSink>(&self, sink: &mut D) {
        let slice = if self.tick_slice.is_zero() {
            self.pause_per_round
        } else {
            self.tick_slice
        };

        let mut remaining = self.pause_per_round;
        loop {
            let step = remaining.min(slice);
            if !step.is_zero() {
                tokio::time::sleep(step).await;
            }
            sink.on_tick().await;
            remaining = remaining.saturating_sub(step);
            if remaining.is_zero() {
                return;
            }
        }
    }
}
