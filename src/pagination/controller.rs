//! PaginationController - scroll-driven, single-flight page requests.
//!
//! ```text
//! Idle --(near bottom)--> Fetching --(items)--> AwaitingDrain --(settled)--> Idle
//!   ^                        |  |
//!   +------(fetch error)-----+  +--(empty page)--> Exhausted
//! ```
//!
//! Only Idle may start a fetch, so at most one page is ever in flight and a
//! fast-scrolling user cannot produce duplicate or overlapping requests.

use super::throttle::ScrollThrottle;
use crate::model::PageNumber;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Query parameter carrying the page number in a FetchRequest.
pub const PAGE_PARAM: &str = "page";

/// Pagination state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationState {
    /// No batch outstanding; a near-bottom scroll may fetch.
    Idle,
    /// Request issued, response not yet received.
    Fetching {
        /// Page in flight.
        page: PageNumber,
    },
    /// Items allocated, waiting for the sequencer to drain them.
    AwaitingDrain {
        /// Page being drained.
        page: PageNumber,
    },
    /// The source returned an empty page.
    Exhausted,
    /// Session torn down; nothing is ever requested again.
    Stopped,
}

impl PaginationState {
    /// True while a batch is in flight or still draining.
    pub fn is_outstanding(&self) -> bool {
        matches!(
            self,
            PaginationState::Fetching { .. } | PaginationState::AwaitingDrain { .. }
        )
    }
}

/// One page request for the data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Page to fetch.
    pub page: PageNumber,
    /// Static query parameters merged with the page number.
    pub params: BTreeMap<String, String>,
}

/// Tunables for pagination.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationConfig {
    /// Fetch when `tallest_column - viewport_bottom <= threshold`.
    pub threshold: f64,
    /// Minimum time between scroll evaluations.
    pub scroll_interval: Duration,
    /// Page requested first.
    pub first_page: PageNumber,
    /// Static query parameters sent with every request.
    pub params: BTreeMap<String, String>,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            scroll_interval: Duration::from_millis(100),
            first_page: PageNumber::new(1),
            params: BTreeMap::new(),
        }
    }
}

/// Decides when the next page is requested; at most one is in flight.
#[derive(Debug, Clone)]
pub struct PaginationController {
    threshold: f64,
    params: BTreeMap<String, String>,
    throttle: ScrollThrottle,
    state: PaginationState,
    next_page: PageNumber,
    paused: bool,
}

impl PaginationController {
    /// Idle controller that will request `config.first_page` first.
    pub fn new(config: PaginationConfig) -> Self {
        Self {
            threshold: config.threshold,
            params: config.params,
            throttle: ScrollThrottle::new(config.scroll_interval),
            state: PaginationState::Idle,
            next_page: config.first_page,
            paused: false,
        }
    }

    /// Current state.
    pub fn state(&self) -> PaginationState {
        self.state
    }

    /// Page the next request will ask for.
    pub fn next_page(&self) -> PageNumber {
        self.next_page
    }

    /// True between `stop` and `start`.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether a column of height `tallest` is close enough to the viewport
    /// bottom to want more items.
    pub fn near_bottom(&self, tallest: f64, viewport_bottom: f64) -> bool {
        tallest - viewport_bottom <= self.threshold
    }

    /// Scroll event. Rate-limited; extra events inside the interval are
    /// coalesced into one trailing evaluation released by `on_tick`.
    pub fn on_scroll(
        &mut self,
        tallest: f64,
        viewport_bottom: f64,
        now: Instant,
    ) -> Option<FetchRequest> {
        if !self.listening() {
            return None;
        }
        if !self.throttle.admit(now) {
            debug!("Scroll coalesced");
            return None;
        }
        self.evaluate(tallest, viewport_bottom)
    }

    /// Timer tick; runs a coalesced scroll evaluation once it is due.
    pub fn on_tick(
        &mut self,
        tallest: f64,
        viewport_bottom: f64,
        now: Instant,
    ) -> Option<FetchRequest> {
        if !self.listening() || !self.throttle.flush(now) {
            return None;
        }
        self.evaluate(tallest, viewport_bottom)
    }

    /// Requests the next page unconditionally if Idle (initial fill).
    pub fn prime(&mut self) -> Option<FetchRequest> {
        if !self.listening() || self.state != PaginationState::Idle {
            return None;
        }
        Some(self.begin_fetch())
    }

    /// Response received for `page`. An empty page exhausts the feed.
    ///
    /// Returns false (and changes nothing) if `page` is not the page being
    /// fetched.
    pub fn fetch_succeeded(&mut self, page: PageNumber, item_count: usize) -> bool {
        if self.state != (PaginationState::Fetching { page }) {
            warn!(page = %page, state = ?self.state, "Unexpected page response ignored");
            return false;
        }
        self.next_page = page.next();
        if item_count == 0 {
            info!(page = %page, "Empty page; feed exhausted");
            self.state = PaginationState::Exhausted;
        } else {
            info!(page = %page, items = item_count, "Page received");
            self.state = PaginationState::AwaitingDrain { page };
        }
        true
    }

    /// Request for `page` failed. Back to Idle; the same page is requested
    /// on the next qualifying scroll. No automatic retry.
    pub fn fetch_failed(&mut self, page: PageNumber) -> bool {
        if self.state != (PaginationState::Fetching { page }) {
            warn!(page = %page, state = ?self.state, "Unexpected fetch failure ignored");
            return false;
        }
        warn!(page = %page, "Fetch failed; pagination idle");
        self.state = PaginationState::Idle;
        true
    }

    /// Sequencer finished draining `page`.
    pub fn batch_settled(&mut self, page: PageNumber) -> bool {
        if self.state != (PaginationState::AwaitingDrain { page }) {
            debug!(page = %page, state = ?self.state, "Settlement for non-awaited page");
            return false;
        }
        self.state = PaginationState::Idle;
        true
    }

    /// Stop evaluating scroll events (in-flight work still completes).
    pub fn stop(&mut self) {
        self.paused = true;
    }

    /// Resume evaluating scroll events.
    pub fn start(&mut self) {
        self.paused = false;
    }

    /// Permanently stop. Used on session teardown.
    pub fn shutdown(&mut self) {
        self.state = PaginationState::Stopped;
    }

    fn listening(&self) -> bool {
        !self.paused && self.state != PaginationState::Stopped
    }

    fn evaluate(&mut self, tallest: f64, viewport_bottom: f64) -> Option<FetchRequest> {
        if self.state != PaginationState::Idle {
            debug!(state = ?self.state, "Scroll ignored; batch outstanding");
            return None;
        }
        if !self.near_bottom(tallest, viewport_bottom) {
            return None;
        }
        Some(self.begin_fetch())
    }

    fn begin_fetch(&mut self) -> FetchRequest {
        let page = self.next_page;
        self.state = PaginationState::Fetching { page };
        let mut params = self.params.clone();
        params.insert(PAGE_PARAM.to_string(), page.to_string());
        info!(page = %page, "Fetching page");
        FetchRequest { page, params }
    }
}
