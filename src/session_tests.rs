//! Tests for LayoutSession.

use super::*;
use crate::model::{AssetError, ColumnIndex};
use std::collections::BTreeMap;
use std::thread;

fn config(columns: usize, container_width: f64, policy: ResizePolicy) -> SessionConfig {
    SessionConfig {
        geometry: ColumnGeometry::new(columns, container_width, 0.0, 0.0).unwrap(),
        pagination: PaginationConfig::default(),
        resize_policy: policy,
    }
}

fn session(columns: usize) -> LayoutSession {
    LayoutSession::new(config(columns, 100.0 * columns as f64, ResizePolicy::Keep))
}

fn asset(name: &str) -> AssetRef {
    AssetRef::new(name).unwrap()
}

fn records(names: &[&str]) -> Vec<ItemRecord> {
    names.iter().map(|n| ItemRecord::with_asset(asset(n))).collect()
}

fn loaded(width: f64, height: f64) -> LoadOutcome {
    LoadOutcome::Loaded { width, height }
}

fn seq(i: usize) -> SequenceIndex {
    SequenceIndex::new(i)
}

fn page(p: u32) -> PageNumber {
    PageNumber::new(p)
}

/// Placed events as (sequence, column, top).
fn placements(events: &[LayoutEvent]) -> Vec<(usize, usize, f64)> {
    events
        .iter()
        .filter_map(|e| match e {
            LayoutEvent::Placed { placement, .. } => Some((
                placement.sequence.get(),
                placement.column.get(),
                placement.top,
            )),
            _ => None,
        })
        .collect()
}

fn fetch_pages(events: &[LayoutEvent]) -> Vec<u32> {
    events
        .iter()
        .filter_map(|e| match e {
            LayoutEvent::FetchStarted { page } => Some(page.get()),
            _ => None,
        })
        .collect()
}

#[test]
fn from_resolved_copies_geometry_and_pagination() {
    let mut resolved = ResolvedConfig::default();
    resolved.columns = 4;
    resolved.container_width = 430.0;
    resolved.horizontal_gap = 10.0;
    resolved.first_page = 0;
    resolved.params = BTreeMap::from([("tag".to_string(), "dogs".to_string())]);

    let config = SessionConfig::from_resolved(&resolved).unwrap();
    assert_eq!(config.geometry.columns(), 4);
    assert_eq!(config.geometry.column_width(), 100.0);
    assert_eq!(config.pagination.first_page, page(0));
    assert_eq!(config.pagination.scroll_interval, Duration::from_millis(100));
    assert_eq!(config.pagination.params.get("tag").map(String::as_str), Some("dogs"));
}

#[test]
fn from_resolved_rejects_zero_columns() {
    let mut resolved = ResolvedConfig::default();
    resolved.columns = 0;
    assert_eq!(
        SessionConfig::from_resolved(&resolved),
        Err(GeometryError::NoColumns)
    );
}

#[test]
fn sessions_get_distinct_ids() {
    assert_ne!(session(1).id(), session(1).id());
}

#[test]
fn out_of_order_completions_place_in_sequence_order() {
    let mut s = session(3);
    let mut events = Vec::new();

    let request = s.prime(&mut events).unwrap();
    let loads = s.on_page_fetched(request.page, Ok(records(&["a", "b", "c"])), &mut events);
    assert_eq!(loads.len(), 3);
    assert_eq!(loads[1].asset, asset("b"));

    s.resolve(seq(1), loaded(100.0, 50.0), &mut events);
    s.resolve(seq(2), loaded(100.0, 300.0), &mut events);
    assert!(placements(&events).is_empty());

    s.resolve(seq(0), loaded(100.0, 200.0), &mut events);
    assert_eq!(
        placements(&events),
        vec![(0, 0, 0.0), (1, 1, 0.0), (2, 2, 0.0)]
    );
    assert_eq!(s.columns().heights(), vec![200.0, 50.0, 300.0]);
    assert_eq!(s.pagination_state(), PaginationState::Idle);
}

#[test]
fn failed_asset_is_skipped_and_next_item_takes_its_column() {
    let mut s = session(3);
    let mut events = Vec::new();

    let request = s.prime(&mut events).unwrap();
    s.on_page_fetched(request.page, Ok(records(&["a", "b", "c"])), &mut events);
    s.resolve(seq(0), loaded(100.0, 200.0), &mut events);
    s.resolve(
        seq(1),
        LoadOutcome::Failed(AssetError::LoadFailed {
            asset: asset("b"),
            reason: "404".to_string(),
        }),
        &mut events,
    );
    s.resolve(seq(2), loaded(100.0, 300.0), &mut events);

    assert_eq!(placements(&events), vec![(0, 0, 0.0), (2, 1, 0.0)]);
    assert!(events
        .iter()
        .any(|e| matches!(e, LayoutEvent::Skipped { sequence, .. } if *sequence == seq(1))));
    assert_eq!(s.columns().heights(), vec![200.0, 300.0, 0.0]);
}

#[test]
fn rapid_scrolls_during_outstanding_page_fetch_once() {
    let mut s = session(2);
    let mut events = Vec::new();
    let t0 = Instant::now();

    // Page 1 fully drained
    let first = s.prime(&mut events).unwrap();
    s.on_page_fetched(first.page, Ok(records(&["a"])), &mut events);
    s.resolve(seq(0), loaded(100.0, 100.0), &mut events);

    // Page 2 requested, then two rapid scrolls while it is outstanding
    assert!(s.on_scroll(1_000.0, t0, &mut events).is_some());
    assert!(s
        .on_scroll(1_000.0, t0 + Duration::from_millis(150), &mut events)
        .is_none());
    assert!(s
        .on_scroll(1_000.0, t0 + Duration::from_millis(300), &mut events)
        .is_none());
    s.on_page_fetched(page(2), Ok(records(&["b"])), &mut events);
    assert!(s
        .on_scroll(1_000.0, t0 + Duration::from_millis(450), &mut events)
        .is_none());

    // Settled: the next scroll asks for page 3
    s.resolve(seq(1), loaded(100.0, 100.0), &mut events);
    let next = s.on_scroll(1_000.0, t0 + Duration::from_millis(600), &mut events);
    assert_eq!(next.map(|r| r.page), Some(page(3)));
    assert_eq!(fetch_pages(&events), vec![1, 2, 3]);
}

#[test]
fn asset_less_blocks_resolve_on_allocation() {
    let mut s = LayoutSession::new(SessionConfig {
        geometry: ColumnGeometry::new(2, 200.0, 0.0, 10.0).unwrap(),
        pagination: PaginationConfig::default(),
        resize_policy: ResizePolicy::Keep,
    });
    let mut events = Vec::new();

    let request = s.prime(&mut events).unwrap();
    let loads = s.on_page_fetched(
        request.page,
        Ok(vec![ItemRecord::block(40.0), ItemRecord::block(25.0)]),
        &mut events,
    );
    assert!(loads.is_empty());
    assert_eq!(s.columns().heights(), vec![50.0, 35.0]);
    assert!(events.contains(&LayoutEvent::BatchSettled { page: page(1) }));
    assert_eq!(s.pagination_state(), PaginationState::Idle);
}

#[test]
fn block_after_unresolved_asset_waits_its_turn() {
    let mut s = session(2);
    let mut events = Vec::new();
    let request = s.prime(&mut events).unwrap();
    let mut batch = records(&["a"]);
    batch.push(ItemRecord::block(30.0));
    let loads = s.on_page_fetched(request.page, Ok(batch), &mut events);

    assert_eq!(loads.len(), 1);
    assert!(placements(&events).is_empty());
    assert_eq!(s.cursor(), seq(0));

    s.resolve(seq(0), loaded(100.0, 80.0), &mut events);
    assert_eq!(placements(&events), vec![(0, 0, 0.0), (1, 1, 0.0)]);
}

#[test]
fn fetch_failure_is_advisory_and_retries_same_page() {
    let mut s = session(1);
    let mut events = Vec::new();
    let request = s.prime(&mut events).unwrap();

    let loads = s.on_page_fetched(
        request.page,
        Err(FetchError::Unavailable("offline".to_string())),
        &mut events,
    );
    assert!(loads.is_empty());
    assert_eq!(s.allocated(), 0);
    assert_eq!(s.pagination_state(), PaginationState::Idle);
    assert!(matches!(
        events.last(),
        Some(LayoutEvent::FetchFailed { page: p, .. }) if *p == page(1)
    ));

    let retry = s.prime(&mut events).unwrap();
    assert_eq!(retry.page, page(1));
}

#[test]
fn empty_page_exhausts_feed() {
    let mut s = session(1);
    let mut events = Vec::new();
    let request = s.prime(&mut events).unwrap();
    s.on_page_fetched(request.page, Ok(Vec::new()), &mut events);

    assert_eq!(s.pagination_state(), PaginationState::Exhausted);
    assert_eq!(
        events.last(),
        Some(&LayoutEvent::FeedExhausted { page: page(1) })
    );
    assert!(s.on_scroll(0.0, Instant::now(), &mut events).is_none());
}

#[test]
fn response_for_unrequested_page_is_ignored() {
    let mut s = session(1);
    let mut events = Vec::new();
    let loads = s.on_page_fetched(page(9), Ok(records(&["x"])), &mut events);
    assert!(loads.is_empty());
    assert_eq!(s.allocated(), 0);
    assert!(events.is_empty());
}

#[test]
fn double_resolve_is_ignored() {
    let mut s = session(2);
    let mut events = Vec::new();
    let request = s.prime(&mut events).unwrap();
    s.on_page_fetched(request.page, Ok(records(&["a", "b"])), &mut events);

    assert!(s.resolve(seq(1), loaded(100.0, 10.0), &mut events));
    assert!(!s.resolve(seq(1), loaded(100.0, 999.0), &mut events));
    assert!(!s.resolve(seq(42), loaded(100.0, 10.0), &mut events));

    s.resolve(seq(0), loaded(100.0, 20.0), &mut events);
    assert_eq!(s.columns().heights(), vec![20.0, 10.0]);
}

#[test]
fn pump_applies_completions_from_loader_threads() {
    let mut s = session(3);
    let mut events = Vec::new();
    let request = s.prime(&mut events).unwrap();
    let loads = s.on_page_fetched(request.page, Ok(records(&["a", "b", "c"])), &mut events);

    let sender = s.completion_sender();
    let handles: Vec<_> = loads
        .into_iter()
        .rev()
        .map(|load| {
            let sender = sender.clone();
            thread::spawn(move || {
                let height = 100.0 * (load.sequence.get() + 1) as f64;
                sender.send(load.sequence, loaded(100.0, height))
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }

    assert_eq!(s.pump(&mut events), 3);
    assert_eq!(
        placements(&events),
        vec![(0, 0, 0.0), (1, 1, 0.0), (2, 2, 0.0)]
    );
    assert_eq!(s.pump(&mut events), 0);
}

#[test]
fn wait_returns_zero_on_timeout() {
    let mut s = session(1);
    let mut events = Vec::new();
    assert_eq!(s.wait(Duration::from_millis(5), &mut events), 0);
}

#[test]
fn completions_from_other_sessions_are_ignored() {
    let mut s = session(1);
    let other = session(1);
    let mut events = Vec::new();
    let request = s.prime(&mut events).unwrap();
    s.on_page_fetched(request.page, Ok(records(&["a"])), &mut events);

    // Forge a completion stamped with the other session's id
    let stale = CompletionSender {
        session: other.id(),
        tx: s.tx.clone(),
    };
    stale.send(seq(0), loaded(100.0, 10.0));

    assert_eq!(s.pump(&mut events), 1);
    assert_eq!(s.cursor(), seq(0));
    assert_eq!(s.unresolved(), 1);
}

#[test]
fn teardown_discards_late_completions() {
    let mut s = session(1);
    let mut events = Vec::new();
    let request = s.prime(&mut events).unwrap();
    s.on_page_fetched(request.page, Ok(records(&["a"])), &mut events);
    let sender = s.completion_sender();

    s.teardown();
    assert!(s.is_torn_down());
    assert_eq!(s.pagination_state(), PaginationState::Stopped);
    assert!(!sender.send(seq(0), loaded(100.0, 10.0)));
    assert!(!s.resolve(seq(0), loaded(100.0, 10.0), &mut events));
    assert_eq!(s.pump(&mut events), 0);
    assert!(placements(&events).is_empty());
    assert!(s.on_scroll(0.0, Instant::now(), &mut events).is_none());
}

#[test]
fn teardown_stops_relayout_on_resize() {
    let mut s = LayoutSession::new(config(2, 200.0, ResizePolicy::Relayout));
    let mut events = Vec::new();
    let request = s.prime(&mut events).unwrap();
    s.on_page_fetched(request.page, Ok(records(&["a"])), &mut events);
    s.resolve(seq(0), loaded(100.0, 100.0), &mut events);
    assert_eq!(s.columns().heights(), vec![100.0, 0.0]);

    s.teardown();
    events.clear();
    assert!(s.resize(400.0, &mut events).is_ok());
    assert!(events.is_empty());
    assert_eq!(s.geometry().container_width(), 200.0);
    assert_eq!(s.columns().heights(), vec![100.0, 0.0]);
}

/// Sink that reports another load while it is handling a placement, the
/// way a DOM bridge might when inserting a tile triggers an image load.
struct ChainingSink {
    sender: CompletionSender,
    chain: Vec<(SequenceIndex, SequenceIndex)>,
    events: Vec<LayoutEvent>,
}

impl RenderSink for ChainingSink {
    fn handle(&mut self, event: &LayoutEvent) {
        if let LayoutEvent::Placed { placement, .. } = event {
            if let Some(pos) = self.chain.iter().position(|(on, _)| *on == placement.sequence) {
                let (_, next) = self.chain.remove(pos);
                assert!(self.sender.send(next, loaded(100.0, 30.0)));
            }
        }
        self.events.push(event.clone());
    }
}

#[test]
fn completion_sent_from_sink_waits_for_next_pump() {
    let mut s = session(1);
    let mut setup: Vec<LayoutEvent> = Vec::new();
    let request = s.prime(&mut setup).unwrap();
    s.on_page_fetched(request.page, Ok(records(&["a", "b"])), &mut setup);
    let mut sink = ChainingSink {
        sender: s.completion_sender(),
        chain: vec![(seq(0), seq(1))],
        events: Vec::new(),
    };

    assert!(s.resolve(seq(0), loaded(100.0, 10.0), &mut sink));
    assert_eq!(s.cursor(), seq(1));
    assert_eq!(placements(&sink.events), vec![(0, 0, 0.0)]);

    assert_eq!(s.pump(&mut sink), 1);
    assert_eq!(s.cursor(), seq(2));
    assert_eq!(placements(&sink.events), vec![(0, 0, 0.0), (1, 0, 10.0)]);
    assert_eq!(
        sink.events.last(),
        Some(&LayoutEvent::BatchSettled { page: page(1) })
    );
}

#[test]
fn stop_pauses_scroll_pagination() {
    let mut s = session(1);
    let mut events = Vec::new();
    s.stop();
    assert!(s.on_scroll(0.0, Instant::now(), &mut events).is_none());
    s.start();
    assert!(s.on_scroll(0.0, Instant::now(), &mut events).is_some());
}

#[test]
fn tick_flushes_coalesced_scroll() {
    let mut s = session(1);
    let mut events = Vec::new();
    let t0 = Instant::now();
    let first = s.prime(&mut events).unwrap();
    s.on_page_fetched(first.page, Ok(records(&["a"])), &mut events);
    s.resolve(seq(0), loaded(100.0, 1_000.0), &mut events);

    // Far from the bottom, then a coalesced scroll near it
    assert!(s.on_scroll(0.0, t0, &mut events).is_none());
    assert!(s
        .on_scroll(1_000.0, t0 + Duration::from_millis(10), &mut events)
        .is_none());
    let flushed = s.on_tick(1_000.0, t0 + Duration::from_millis(100), &mut events);
    assert_eq!(flushed.map(|r| r.page), Some(page(2)));
}

#[test]
fn keep_policy_leaves_layout_untouched() {
    let mut s = session(2);
    let mut events = Vec::new();
    let request = s.prime(&mut events).unwrap();
    s.on_page_fetched(request.page, Ok(records(&["a"])), &mut events);
    s.resolve(seq(0), loaded(100.0, 100.0), &mut events);
    events.clear();

    s.resize(400.0, &mut events).unwrap();
    assert!(events.is_empty());
    assert_eq!(s.geometry().column_width(), 100.0);
    assert_eq!(s.columns().heights(), vec![100.0, 0.0]);
}

#[test]
fn keep_policy_records_no_extents() {
    let mut s = session(2);
    let mut events = Vec::new();
    let request = s.prime(&mut events).unwrap();
    s.on_page_fetched(request.page, Ok(records(&["a", "b"])), &mut events);
    s.resolve(seq(0), loaded(100.0, 100.0), &mut events);
    s.resolve(seq(1), loaded(100.0, 50.0), &mut events);

    assert!(s.placed.is_empty());
    assert_eq!(s.placed_count, 2);
}

#[test]
fn relayout_policy_replays_placed_items() {
    let mut s = LayoutSession::new(config(2, 200.0, ResizePolicy::Relayout));
    let mut events = Vec::new();
    let request = s.prime(&mut events).unwrap();
    s.on_page_fetched(request.page, Ok(records(&["a", "b", "c"])), &mut events);
    s.resolve(seq(0), loaded(100.0, 100.0), &mut events);
    s.resolve(seq(1), loaded(100.0, 50.0), &mut events);
    s.resolve(seq(2), loaded(100.0, 20.0), &mut events);
    assert_eq!(s.columns().heights(), vec![100.0, 70.0]);
    events.clear();

    s.resize(400.0, &mut events).unwrap();
    assert_eq!(s.geometry().column_width(), 200.0);
    assert_eq!(s.columns().heights(), vec![200.0, 140.0]);
    assert_eq!(events[0], LayoutEvent::Relayout { column_width: 200.0 });
    let moved: Vec<_> = events[1..]
        .iter()
        .filter_map(|e| match e {
            LayoutEvent::Repositioned { placement } => Some((placement.sequence, placement.column)),
            _ => None,
        })
        .collect();
    assert_eq!(
        moved,
        vec![
            (seq(0), ColumnIndex::new(0)),
            (seq(1), ColumnIndex::new(1)),
            (seq(2), ColumnIndex::new(1)),
        ]
    );
}

#[test]
fn resize_to_invalid_width_is_rejected() {
    let mut s = LayoutSession::new(config(2, 200.0, ResizePolicy::Relayout));
    let mut events = Vec::new();
    assert!(s.resize(0.0, &mut events).is_err());
    assert_eq!(s.geometry().container_width(), 200.0);
    assert!(events.is_empty());
}
