//! LayoutSession - one waterfall instance and everything it owns.
//!
//! A session owns the ColumnSet, PendingBuffer, Sequencer and
//! PaginationController for a single container. Nothing is shared between
//! sessions. All mutation happens on the thread that owns the session;
//! asset loaders on other threads report back through a `CompletionSender`
//! and the owner applies those completions one at a time via `pump`.
//!
//! Events produced while draining are collected first and dispatched to the
//! render sink afterwards, so a sink can never observe a half-finished
//! drain.

use crate::config::{ResizePolicy, ResolvedConfig};
use crate::layout::{ColumnGeometry, ColumnSet, PlacementRule};
use crate::model::{
    AssetRef, Extent, FetchError, GeometryError, Item, ItemRecord, LoadOutcome, PageNumber,
    SequenceIndex, SessionId,
};
use crate::pagination::{FetchRequest, PaginationConfig, PaginationController, PaginationState};
use crate::sequencer::{LayoutEvent, PendingBuffer, RenderSink, Sequencer};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Everything needed to start a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Column layout at session start.
    pub geometry: ColumnGeometry,
    /// When and what to fetch.
    pub pagination: PaginationConfig,
    /// What a container resize does.
    pub resize_policy: ResizePolicy,
}

impl SessionConfig {
    /// Build from the resolved application config.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError` if the configured columns and widths cannot
    /// produce a positive column width.
    pub fn from_resolved(config: &ResolvedConfig) -> Result<Self, GeometryError> {
        let geometry = ColumnGeometry::new(
            config.columns,
            config.container_width,
            config.horizontal_gap,
            config.vertical_gap,
        )?;
        Ok(Self {
            geometry,
            pagination: PaginationConfig {
                threshold: config.scroll_threshold,
                scroll_interval: Duration::from_millis(config.scroll_interval_ms),
                first_page: PageNumber::new(config.first_page),
                params: config.params.clone(),
            },
            resize_policy: config.resize_policy,
        })
    }
}

/// One asset-load result addressed to a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Session the load was started for.
    pub session: SessionId,
    /// Slot being resolved.
    pub sequence: SequenceIndex,
    /// What the loader produced.
    pub outcome: LoadOutcome,
}

/// Handle asset loaders use to report results. Clone freely across threads.
#[derive(Debug, Clone)]
pub struct CompletionSender {
    session: SessionId,
    tx: Sender<Completion>,
}

impl CompletionSender {
    /// Session this sender reports to.
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Queue a result for the owning session.
    ///
    /// Returns false if the session has been torn down; the result is
    /// dropped.
    pub fn send(&self, sequence: SequenceIndex, outcome: LoadOutcome) -> bool {
        self.tx
            .send(Completion {
                session: self.session,
                sequence,
                outcome,
            })
            .is_ok()
    }
}

/// An asset the host must load for a freshly allocated item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// Slot waiting on the asset.
    pub sequence: SequenceIndex,
    /// Asset to load.
    pub asset: AssetRef,
}

/// One waterfall container and all of its layout state.
pub struct LayoutSession {
    id: SessionId,
    rule: PlacementRule,
    resize_policy: ResizePolicy,
    columns: ColumnSet,
    buffer: PendingBuffer,
    sequencer: Sequencer,
    pagination: PaginationController,
    /// Extents of placed items in sequence order, replayed on relayout.
    /// Only recorded under `ResizePolicy::Relayout`.
    placed: Vec<(SequenceIndex, Extent)>,
    placed_count: usize,
    tx: Sender<Completion>,
    rx: Option<Receiver<Completion>>,
}

impl LayoutSession {
    /// Create a session with empty columns and pagination idle.
    pub fn new(config: SessionConfig) -> Self {
        let id = SessionId::next();
        let (tx, rx) = mpsc::channel();
        let columns = ColumnSet::from_geometry(&config.geometry);
        info!(
            session = %id,
            columns = config.geometry.columns(),
            column_width = config.geometry.column_width(),
            "Layout session created"
        );
        Self {
            id,
            rule: PlacementRule::new(config.geometry),
            resize_policy: config.resize_policy,
            columns,
            buffer: PendingBuffer::new(),
            sequencer: Sequencer::new(),
            pagination: PaginationController::new(config.pagination),
            placed: Vec::new(),
            placed_count: 0,
            tx,
            rx: Some(rx),
        }
    }

    /// Identity stamped on this session's completions.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Sender for loader threads; clone freely.
    pub fn completion_sender(&self) -> CompletionSender {
        CompletionSender {
            session: self.id,
            tx: self.tx.clone(),
        }
    }

    /// Geometry currently in force.
    pub fn geometry(&self) -> &ColumnGeometry {
        self.rule.geometry()
    }

    /// Column heights.
    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    /// Next sequence index eligible for placement.
    pub fn cursor(&self) -> SequenceIndex {
        self.sequencer.cursor()
    }

    /// Pagination state.
    pub fn pagination_state(&self) -> PaginationState {
        self.pagination.state()
    }

    /// Items allocated whose asset has not reported back yet.
    pub fn unresolved(&self) -> usize {
        self.buffer.unresolved_count()
    }

    /// Items allocated so far.
    pub fn allocated(&self) -> usize {
        self.buffer.len()
    }

    /// True after `teardown`.
    pub fn is_torn_down(&self) -> bool {
        self.rx.is_none()
    }

    /// Request the first page without waiting for a scroll.
    pub fn prime(&mut self, sink: &mut dyn RenderSink) -> Option<FetchRequest> {
        let request = self.pagination.prime();
        Self::announce(&request, sink);
        request
    }

    /// Scroll event from the host.
    pub fn on_scroll(
        &mut self,
        viewport_bottom: f64,
        now: Instant,
        sink: &mut dyn RenderSink,
    ) -> Option<FetchRequest> {
        let tallest = self.columns.tallest_height();
        let request = self.pagination.on_scroll(tallest, viewport_bottom, now);
        Self::announce(&request, sink);
        request
    }

    /// Timer tick from the host; flushes a coalesced scroll evaluation.
    pub fn on_tick(
        &mut self,
        viewport_bottom: f64,
        now: Instant,
        sink: &mut dyn RenderSink,
    ) -> Option<FetchRequest> {
        let tallest = self.columns.tallest_height();
        let request = self.pagination.on_tick(tallest, viewport_bottom, now);
        Self::announce(&request, sink);
        request
    }

    /// Response to a page request.
    ///
    /// Allocates one slot per record, resolves asset-less records at once
    /// with their measured height, and returns the assets the host must
    /// load. Responses for a page that is not being fetched are ignored.
    pub fn on_page_fetched(
        &mut self,
        page: PageNumber,
        response: Result<Vec<ItemRecord>, FetchError>,
        sink: &mut dyn RenderSink,
    ) -> Vec<LoadRequest> {
        if self.is_torn_down() {
            debug!(session = %self.id, page = %page, "Page arrived after teardown");
            return Vec::new();
        }

        let records = match response {
            Ok(records) => records,
            Err(error) => {
                if self.pagination.fetch_failed(page) {
                    warn!(page = %page, %error, "Page fetch failed");
                    sink.handle(&LayoutEvent::FetchFailed { page, error });
                }
                return Vec::new();
            }
        };

        if !self.pagination.fetch_succeeded(page, records.len()) {
            return Vec::new();
        }
        if records.is_empty() {
            sink.handle(&LayoutEvent::FeedExhausted { page });
            return Vec::new();
        }

        let start = self.buffer.next_sequence().get();
        let mut requests = Vec::new();
        let mut measured = Vec::new();
        let items: Vec<Item> = records
            .into_iter()
            .enumerate()
            .map(|(offset, record)| {
                let sequence = SequenceIndex::new(start + offset);
                match &record.asset {
                    Some(asset) => requests.push(LoadRequest {
                        sequence,
                        asset: asset.clone(),
                    }),
                    None => measured.push((sequence, record.block_height.unwrap_or(0.0))),
                }
                Item::new(sequence, page, record.asset, record.data)
            })
            .collect();

        let range = self.buffer.allocate(items);
        info!(
            page = %page,
            start = range.start,
            end = range.end,
            loads = requests.len(),
            "Batch allocated"
        );
        self.sequencer.track_batch(page, range);

        for (sequence, height) in measured {
            if let Err(err) = self.buffer.resolve(sequence, LoadOutcome::Measured { height }) {
                warn!(%err, "Measured block could not be resolved");
            }
        }
        self.drain(sink);
        requests
    }

    /// Apply one asset-load outcome and drain.
    ///
    /// Contract violations (double resolve, unknown index) and completions
    /// after teardown are logged and ignored. Returns true if the outcome
    /// was applied.
    pub fn resolve(
        &mut self,
        sequence: SequenceIndex,
        outcome: LoadOutcome,
        sink: &mut dyn RenderSink,
    ) -> bool {
        if self.is_torn_down() {
            debug!(session = %self.id, sequence = %sequence, "Completion after teardown ignored");
            return false;
        }
        if let Err(err) = self.buffer.resolve(sequence, outcome) {
            warn!(session = %self.id, %err, "Resolve rejected");
            return false;
        }
        self.drain(sink);
        true
    }

    /// Apply every queued completion, one at a time. Returns how many were
    /// taken off the queue.
    pub fn pump(&mut self, sink: &mut dyn RenderSink) -> usize {
        let mut taken = 0;
        loop {
            let next = match &self.rx {
                Some(rx) => rx.try_recv(),
                None => return taken,
            };
            match next {
                Ok(completion) => {
                    taken += 1;
                    self.apply(completion, sink);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return taken,
            }
        }
    }

    /// Block up to `timeout` for the next completion, then pump the rest.
    pub fn wait(&mut self, timeout: Duration, sink: &mut dyn RenderSink) -> usize {
        let first = match &self.rx {
            Some(rx) => rx.recv_timeout(timeout),
            None => return 0,
        };
        match first {
            Ok(completion) => {
                self.apply(completion, sink);
                1 + self.pump(sink)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => 0,
        }
    }

    /// Container width changed.
    ///
    /// Under `Keep` the original column width stays in force. Under
    /// `Relayout` every placed item is laid out again, in sequence order,
    /// against the new width; the sink gets `Relayout` followed by one
    /// `Repositioned` per placed item.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError` if the new width leaves no room for the
    /// columns. The session is unchanged in that case.
    pub fn resize(
        &mut self,
        container_width: f64,
        sink: &mut dyn RenderSink,
    ) -> Result<(), GeometryError> {
        if self.is_torn_down() {
            debug!(session = %self.id, container_width, "Resize after teardown ignored");
            return Ok(());
        }
        let geometry = self.rule.geometry().with_container_width(container_width)?;
        match self.resize_policy {
            ResizePolicy::Keep => {
                debug!(
                    container_width,
                    column_width = self.rule.geometry().column_width(),
                    "Resize ignored; keeping column width"
                );
            }
            ResizePolicy::Relayout => {
                self.rule = PlacementRule::new(geometry);
                self.columns = ColumnSet::from_geometry(&geometry);
                info!(
                    container_width,
                    column_width = geometry.column_width(),
                    items = self.placed.len(),
                    "Relaying out placed items"
                );
                sink.handle(&LayoutEvent::Relayout {
                    column_width: geometry.column_width(),
                });
                for (sequence, extent) in &self.placed {
                    let placement = self.rule.place(&mut self.columns, *sequence, extent);
                    sink.handle(&LayoutEvent::Repositioned { placement });
                }
            }
        }
        Ok(())
    }

    /// Pause scroll-triggered pagination.
    pub fn stop(&mut self) {
        self.pagination.stop();
    }

    /// Resume scroll-triggered pagination.
    pub fn start(&mut self) {
        self.pagination.start();
    }

    /// Tear the session down. Scroll and resize handling stop for good and
    /// any completion still in flight is discarded.
    pub fn teardown(&mut self) {
        if self.rx.take().is_some() {
            self.pagination.shutdown();
            info!(
                session = %self.id,
                placed = self.placed_count,
                unresolved = self.buffer.unresolved_count(),
                "Layout session torn down"
            );
        }
    }

    fn apply(&mut self, completion: Completion, sink: &mut dyn RenderSink) {
        if completion.session != self.id {
            debug!(
                session = %self.id,
                from = %completion.session,
                "Stale completion from another session ignored"
            );
            return;
        }
        self.resolve(completion.sequence, completion.outcome, sink);
    }

    fn drain(&mut self, sink: &mut dyn RenderSink) {
        let mut events = Vec::new();
        let summary =
            self.sequencer
                .drain(&mut self.buffer, &mut self.columns, &self.rule, &mut events);
        if summary.made_progress() {
            debug!(
                placed = summary.placed,
                skipped = summary.skipped,
                settled = summary.settled,
                cursor = %self.sequencer.cursor(),
                "Drain finished"
            );
        }

        for event in &events {
            match event {
                LayoutEvent::Placed {
                    placement, extent, ..
                } => {
                    self.placed_count += 1;
                    if self.resize_policy == ResizePolicy::Relayout {
                        self.placed.push((placement.sequence, *extent));
                    }
                }
                LayoutEvent::BatchSettled { page } => {
                    self.pagination.batch_settled(*page);
                }
                _ => {}
            }
        }
        for event in &events {
            sink.handle(event);
        }
    }

    fn announce(request: &Option<FetchRequest>, sink: &mut dyn RenderSink) {
        if let Some(request) = request {
            sink.handle(&LayoutEvent::FetchStarted { page: request.page });
        }
    }
}

impl std::fmt::Debug for LayoutSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutSession")
            .field("id", &self.id)
            .field("cursor", &self.sequencer.cursor())
            .field("allocated", &self.buffer.len())
            .field("pagination", &self.pagination.state())
            .field("torn_down", &self.is_torn_down())
            .finish()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
