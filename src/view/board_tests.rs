//! Tests for the terminal board sink.

use super::*;
use crate::layout::Placement;
use crate::model::{AssetError, AssetRef, ColumnIndex, Extent, Item};
use ratatui::backend::TestBackend;
use ratatui::Terminal;
use serde_json::json;

/// Convert a ratatui buffer to a string, dropping trailing blanks and empty
/// lines.
fn buffer_to_string(buffer: &Buffer) -> String {
    let area = buffer.area();
    let mut lines = Vec::new();

    for y in area.top()..area.bottom() {
        let mut line = String::new();
        for x in area.left()..area.right() {
            line.push_str(buffer[(x, y)].symbol());
        }
        let trimmed = line.trim_end();
        if !trimmed.is_empty() {
            lines.push(trimmed.to_string());
        }
    }

    lines.join("\n")
}

fn render(board: &Board, width: u16, height: u16) -> String {
    let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
    terminal
        .draw(|frame| frame.render_widget(board, frame.area()))
        .unwrap();
    buffer_to_string(terminal.backend().buffer())
}

fn placed(sequence: usize, column: usize, top: f64, height: f64, data: serde_json::Value) -> LayoutEvent {
    let sequence = SequenceIndex::new(sequence);
    LayoutEvent::Placed {
        placement: Placement {
            sequence,
            column: ColumnIndex::new(column),
            top,
            height,
            row: 0,
        },
        extent: Extent::Measured { height },
        item: Item::new(sequence, PageNumber::new(1), None, data),
    }
}

fn skipped(sequence: usize) -> LayoutEvent {
    let sequence = SequenceIndex::new(sequence);
    LayoutEvent::Skipped {
        sequence,
        item: Item::new(sequence, PageNumber::new(1), None, serde_json::Value::Null),
        reason: AssetError::LoadFailed {
            asset: AssetRef::new("gone.png").unwrap(),
            reason: "404".to_string(),
        },
    }
}

/// Two columns, 10 layout units per row: a 4-row tile, a 2-row tile, a
/// skipped item, then a 3-row tile under the short one.
fn sample_board() -> Board {
    let mut board = Board::new(2, 10.0);
    let events = [
        LayoutEvent::FetchStarted {
            page: PageNumber::new(1),
        },
        placed(0, 0, 0.0, 40.0, json!({"title": "cat"})),
        placed(1, 1, 0.0, 20.0, serde_json::Value::Null),
        skipped(2),
        placed(3, 1, 20.0, 30.0, json!({"title": "a very long title"})),
        LayoutEvent::BatchSettled {
            page: PageNumber::new(1),
        },
    ];
    for event in &events {
        board.handle(event);
    }
    board
}

#[test]
fn board_counts_and_status() {
    let board = sample_board();
    assert_eq!(board.placed(), 3);
    assert_eq!(board.skipped(), 1);
    assert_eq!(board.status(), FeedStatus::Idle);
    assert_eq!(board.total_rows(), 5);
    assert_eq!(
        board.column_sequences(1),
        vec![SequenceIndex::new(1), SequenceIndex::new(3)]
    );
}

#[test]
fn status_follows_feed_events() {
    let mut board = Board::new(1, 1.0);
    board.handle(&LayoutEvent::FetchStarted {
        page: PageNumber::new(4),
    });
    assert_eq!(board.status().to_string(), "loading page 4");
    board.handle(&LayoutEvent::FetchFailed {
        page: PageNumber::new(4),
        error: crate::model::FetchError::Unavailable("down".to_string()),
    });
    assert_eq!(board.status().to_string(), "page 4 failed");
    board.handle(&LayoutEvent::FeedExhausted {
        page: PageNumber::new(5),
    });
    assert_eq!(board.status(), FeedStatus::Exhausted);
}

#[test]
fn tiny_heights_still_get_a_box() {
    let mut board = Board::new(1, 100.0);
    board.handle(&placed(0, 0, 0.0, 1.0, serde_json::Value::Null));
    board.handle(&placed(1, 0, 1.0, 0.0, serde_json::Value::Null));
    assert_eq!(board.total_rows(), 4);
}

#[test]
fn scroll_is_clamped_to_content() {
    let mut board = sample_board();
    board.scroll_by(10, 3);
    assert_eq!(board.scroll(), 2);
    board.scroll_by(-1, 3);
    assert_eq!(board.scroll(), 1);
    board.scroll_by(-10, 3);
    assert_eq!(board.scroll(), 0);
    board.scroll_to_bottom(3);
    assert_eq!(board.scroll(), 2);
    board.scroll_to_top();
    assert_eq!(board.scroll(), 0);
}

#[test]
fn viewport_bottom_in_layout_units() {
    let mut board = sample_board();
    assert_eq!(board.viewport_bottom(3), 30.0);
    board.scroll_to_bottom(3);
    assert_eq!(board.viewport_bottom(3), 50.0);
}

#[test]
fn relayout_rebuilds_tiles_with_labels() {
    let mut board = sample_board();
    board.handle(&LayoutEvent::Relayout { column_width: 50.0 });
    assert_eq!(board.total_rows(), 0);

    board.handle(&LayoutEvent::Repositioned {
        placement: Placement {
            sequence: SequenceIndex::new(0),
            column: ColumnIndex::new(1),
            top: 0.0,
            height: 20.0,
            row: 0,
        },
    });
    assert_eq!(board.column_sequences(1), vec![SequenceIndex::new(0)]);
    assert_eq!(board.placed(), 3);
    assert!(render(&board, 29, 4).contains("┌cat"));
}

#[test]
fn snapshot_board_top() {
    let board = sample_board();
    insta::assert_snapshot!(render(&board, 29, 8), @r"
3 placed | 1 skipped | idle
┌cat─────────┐ ┌#1──────────┐
│            │ └────────────┘
│            │ ┌a very long ┐
└────────────┘ │            │
               └────────────┘
");
}

#[test]
fn snapshot_board_scrolled() {
    let mut board = sample_board();
    board.scroll_to_bottom(3);
    insta::assert_snapshot!(render(&board, 29, 4), @r"
3 placed | 1 skipped | idle
│            │ ┌a very long ┐
└────────────┘ │            │
               └────────────┘
");
}

#[test]
fn narrow_area_draws_header_only() {
    let board = sample_board();
    assert_eq!(render(&board, 5, 3), "3 pla");
}

#[test]
fn wide_labels_truncate_by_display_width() {
    assert_eq!(truncate_to_width("猫猫猫", 5), "猫猫");
    assert_eq!(tile_line(0, 2, 7, "猫猫猫"), "┌猫猫─┐");
}

#[test]
fn relayout_hands_each_label_back_once() {
    let mut board = sample_board();
    board.handle(&LayoutEvent::Relayout { column_width: 50.0 });
    assert_eq!(board.relayout_labels.len(), 3);

    for (i, sequence) in [0, 1, 3].into_iter().enumerate() {
        board.handle(&LayoutEvent::Repositioned {
            placement: Placement {
                sequence: SequenceIndex::new(sequence),
                column: ColumnIndex::new(i % 2),
                top: 0.0,
                height: 20.0,
                row: 0,
            },
        });
    }

    assert!(board.relayout_labels.is_empty());
    let labels: Vec<&str> = board
        .columns
        .iter()
        .flat_map(|c| c.tiles.iter().map(|t| t.label.as_str()))
        .collect();
    assert_eq!(labels, vec!["cat", "a very long title", "#1"]);
}

#[test]
fn more_columns_than_cells_draws_header_only() {
    let mut board = Board::new(usize::from(u16::MAX) + 1, 10.0);
    board.handle(&placed(0, 0, 0.0, 40.0, serde_json::Value::Null));
    assert_eq!(render(&board, 40, 4), "1 placed | 0 skipped | idle");
}
