use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use tokio_util::sync::CancellationToken;

use crate::page::{Element, Page, PageError};

#[derive(Debug, Clone)]
pub struct ScrollSettings {
    /// Wait after the page loads, before the first height reading.
    pub settle: Duration,
    /// Wait after each scroll for lazy content to arrive.
    pub pause: Duration,
    /// Upper bound on scroll iterations for pages that never stop growing.
    pub max_scrolls: usize,
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(2),
            pause: Duration::from_secs(2),
            max_scrolls: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollOutcome {
    /// Height stopped growing after `scrolls` scrolls.
    Stable { scrolls: usize },
    /// `max_scrolls` reached while the page was still growing.
    LimitReached,
    Cancelled,
}

/// Discovers candidate elements by scrolling a results page until it stops
/// growing.
#[derive(Debug, Clone, Default)]
pub struct ScrollFetcher {
    settings: ScrollSettings,
}

impl ScrollFetcher {
    pub fn new(settings: ScrollSettings) -> Self {
        Self { settings }
    }

    /// Scrolls `page` to exhaustion, then returns every element matching
    /// `selector`. A scroll failure ends scrolling but still queries the page;
    /// cancellation yields no elements.
    pub async fn discover(
        &self,
        page: &dyn Page,
        selector: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Box<dyn Element>>, PageError> {
        match self.scroll_until_stable(page, cancel).await {
            Ok(ScrollOutcome::Cancelled) => return Ok(Vec::new()),
            Ok(_) => {}
            Err(err) => engine_warn!("Scrolling stopped early: {}", err),
        }
        page.find_all(selector).await
    }

    pub async fn scroll_until_stable(
        &self,
        page: &dyn Page,
        cancel: &CancellationToken,
    ) -> Result<ScrollOutcome, PageError> {
        if !pause(self.settings.settle, cancel).await {
            return Ok(ScrollOutcome::Cancelled);
        }

        let mut last_height = page.scroll_height().await?;
        for iteration in 0..self.settings.max_scrolls {
            if cancel.is_cancelled() {
                return Ok(ScrollOutcome::Cancelled);
            }
            page.scroll_to_bottom().await?;
            if !pause(self.settings.pause, cancel).await {
                return Ok(ScrollOutcome::Cancelled);
            }
            let height = page.scroll_height().await?;
            engine_debug!(
                "Scroll {}: height {} -> {}",
                iteration + 1,
                last_height,
                height
            );
            if height <= last_height {
                return Ok(ScrollOutcome::Stable {
                    scrolls: iteration + 1,
                });
            }
            last_height = height;
        }

        engine_info!(
            "Page still growing after {} scrolls; treating as exhausted",
            self.settings.max_scrolls
        );
        Ok(ScrollOutcome::LimitReached)
    }
}

/// Sleeps for `duration` unless cancelled first. Returns `false` on cancellation.
async fn pause(duration: Duration, cancel: &CancellationToken) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    if duration.is_zero() {
        return true;
    }
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
