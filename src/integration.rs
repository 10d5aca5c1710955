//! Headless replay of a layout session.
//!
//! Drives a session the way a user who keeps scrolling to the bottom would:
//! fetch a page, load its assets on worker threads, wait for the batch to
//! settle, scroll again. Used by `waterfall --headless` and by tests that
//! want a whole feed laid out without a terminal.

use crate::pagination::PaginationState;
use crate::sequencer::LayoutEvent;
use crate::session::{LayoutSession, SessionConfig};
use crate::source::{spawn_loads, AssetLoader, DataSource};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Limits for a headless run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessOptions {
    /// Stop after this many page requests.
    pub max_pages: Option<u32>,
    /// Give up on a batch if no completion arrives for this long.
    pub completion_timeout: Duration,
}

impl Default for HeadlessOptions {
    fn default() -> Self {
        Self {
            max_pages: None,
            completion_timeout: Duration::from_secs(10),
        }
    }
}

/// Everything a headless run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessReport {
    /// Every event the session emitted, in order.
    pub events: Vec<LayoutEvent>,
    /// Final accumulated column heights.
    pub heights: Vec<f64>,
    /// Page requests issued.
    pub pages_requested: u32,
}

impl HeadlessReport {
    /// Placement log: one line per reportable event, then the heights.
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.events.iter().filter_map(format_event).collect();
        let heights: Vec<String> = self.heights.iter().map(|h| h.to_string()).collect();
        lines.push(format!("heights {}", heights.join(" ")));
        lines
    }
}

/// One log line for an event, `None` for events the log leaves out.
pub fn format_event(event: &LayoutEvent) -> Option<String> {
    match event {
        LayoutEvent::Placed { placement, .. } => Some(format!(
            "placed {} col={} top={} height={}",
            placement.sequence, placement.column, placement.top, placement.height
        )),
        LayoutEvent::Skipped {
            sequence, reason, ..
        } => Some(format!("skipped {sequence} {reason}")),
        LayoutEvent::BatchSettled { page } => Some(format!("settled page={page}")),
        LayoutEvent::FetchFailed { page, error } => {
            Some(format!("fetch-failed page={page} {error}"))
        }
        LayoutEvent::FeedExhausted { page } => Some(format!("exhausted page={page}")),
        LayoutEvent::FetchStarted { .. }
        | LayoutEvent::Relayout { .. }
        | LayoutEvent::Repositioned { .. } => None,
    }
}

/// Lay out a whole feed without a terminal.
///
/// Ends when the feed is exhausted, a page fetch fails, `max_pages` is
/// reached, or a batch stalls past `completion_timeout`.
pub fn run_headless(
    config: SessionConfig,
    source: &mut dyn DataSource,
    loader: Arc<dyn AssetLoader>,
    options: HeadlessOptions,
) -> HeadlessReport {
    let interval = config.pagination.scroll_interval;
    let mut session = LayoutSession::new(config);
    let mut events = Vec::new();
    let mut pages_requested = 0u32;
    // Synthetic clock so every scroll clears the throttle
    let mut clock = Instant::now();

    let mut request = session.prime(&mut events);
    while let Some(current) = request.take() {
        pages_requested += 1;
        let result = source.fetch_page(&current);
        let loads = session.on_page_fetched(current.page, result, &mut events);
        let workers = spawn_loads(Arc::clone(&loader), loads, session.completion_sender());

        let mut stalled = false;
        while matches!(
            session.pagination_state(),
            PaginationState::AwaitingDrain { .. }
        ) {
            if session.wait(options.completion_timeout, &mut events) == 0 {
                warn!(page = %current.page, "Batch stalled; ending replay");
                stalled = true;
                break;
            }
        }
        if !stalled {
            for worker in workers {
                if worker.join().is_err() {
                    warn!("Asset worker panicked");
                }
            }
        }

        if stalled || session.pagination_state() != PaginationState::Idle {
            break;
        }
        if matches!(events.last(), Some(LayoutEvent::FetchFailed { .. })) {
            break;
        }
        if options.max_pages.is_some_and(|max| pages_requested >= max) {
            break;
        }

        clock += interval;
        let bottom = session.columns().tallest_height();
        request = session.on_scroll(bottom, clock, &mut events);
    }

    session.teardown();
    info!(
        pages = pages_requested,
        events = events.len(),
        "Headless replay finished"
    );
    HeadlessReport {
        heights: session.columns().heights(),
        events,
        pages_requested,
    }
}
