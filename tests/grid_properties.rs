//! Property tests for the grid engine: view derivation, selection,
//! resizing and the ghost batch.

use std::cmp::Ordering;
use std::time::{Duration, Instant};

use gridline::grid::{
    GhostLifecycle, GhostStatus, Grid, MemoryLayoutStore, NoGeometry, SortDirection,
    stutter_progress,
};
use gridline::model::{ColumnDef, FilterKind, Record, RowId, compare_values};
use proptest::prelude::*;
use serde_json::{Value, json};

const STATUSES: [&str; 3] = ["Todo", "Done", "Blocked"];

fn defs() -> Vec<ColumnDef> {
    vec![
        ColumnDef::new("name", "Name", 200)
            .sortable()
            .filterable(FilterKind::SearchOnly),
        ColumnDef::new("status", "Status", 100)
            .sortable()
            .filterable(FilterKind::List),
        ColumnDef::new("size", "Size", 80).sortable().min_width(40),
    ]
}

fn grid() -> Grid<Record> {
    Grid::new(
        "t",
        defs(),
        Box::new(MemoryLayoutStore::new()),
        GhostLifecycle::new(90.0, Duration::ZERO),
    )
}

/// Mixed-type values, so sorting has to order across JSON kinds
fn value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-50i64..50).prop_map(|n| json!(n)),
        "[a-c]{0,3}".prop_map(Value::String),
    ]
}

fn arb_rows() -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(("[a-d]{1,4}", 0usize..3, value()), 0..24).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (name, status, size))| {
                Record::new(
                    i as i64 + 1,
                    [
                        ("name".to_string(), json!(name)),
                        ("status".to_string(), json!(STATUSES[status])),
                        ("size".to_string(), size),
                    ],
                )
            })
            .collect()
    })
}

fn position(rows: &[Record], id: &RowId) -> usize {
    rows.iter().position(|r| &r.id() == id).unwrap()
}

proptest! {
    #[test]
    fn sort_is_ordered_and_stable(rows in arb_rows(), desc in any::<bool>()) {
        let mut grid = grid();
        let direction = if desc { SortDirection::Desc } else { SortDirection::Asc };
        grid.toggle_sort("size", direction);
        let visible = grid.visible_rows(&rows);
        prop_assert_eq!(visible.len(), rows.len());

        for pair in visible.windows(2) {
            let ord = compare_values(pair[0].get("size"), pair[1].get("size"));
            let expected_bad = if desc { Ordering::Less } else { Ordering::Greater };
            prop_assert_ne!(ord, expected_bad);
            // Equal keys keep their original relative order
            if ord == Ordering::Equal {
                prop_assert!(position(&rows, &pair[0].id()) < position(&rows, &pair[1].id()));
            }
        }
    }

    #[test]
    fn filters_compose_as_conjunction(
        rows in arb_rows(),
        status in 0usize..3,
        needle in "[a-d]{0,2}",
    ) {
        let mut grid = grid();
        grid.set_filter("status", STATUSES[status], &rows);
        grid.set_filter("name", &needle, &rows);
        let visible: Vec<RowId> = grid.visible_ids(&rows);

        let expected: Vec<RowId> = rows
            .iter()
            .filter(|r| r.get("status") == Some(&json!(STATUSES[status])))
            .filter(|r| {
                let name = r.get("name").and_then(Value::as_str).unwrap_or("");
                name.contains(needle.as_str())
            })
            .map(|r| r.id())
            .collect();
        prop_assert_eq!(visible, expected);
    }

    #[test]
    fn candidates_ignore_their_own_filter(rows in arb_rows(), status in 0usize..3) {
        let mut grid = grid();
        let before = grid.candidates(&rows, "status", "");
        grid.set_filter("status", STATUSES[status], &rows);
        prop_assert_eq!(grid.candidates(&rows, "status", ""), before);
    }

    #[test]
    fn selection_stays_inside_the_view(
        rows in arb_rows(),
        picks in prop::collection::vec(0usize..24, 0..10),
        status in 0usize..3,
    ) {
        let mut grid = grid();
        for pick in picks {
            if let Some(row) = rows.get(pick) {
                grid.toggle_select(row.id());
            }
        }
        grid.set_filter("status", STATUSES[status], &rows);
        let visible = grid.visible_ids(&rows);
        for id in grid.selection().ids() {
            prop_assert!(visible.contains(&id));
        }
    }

    #[test]
    fn toggle_all_escalates_then_clears(
        rows in arb_rows(),
        picks in prop::collection::vec(0usize..24, 0..10),
    ) {
        let mut grid = grid();
        for pick in picks {
            if let Some(row) = rows.get(pick) {
                grid.toggle_select(row.id());
            }
        }
        let visible = grid.visible_ids(&rows);

        grid.toggle_all(&rows);
        if visible.is_empty() {
            prop_assert!(grid.selection().is_empty());
        } else if grid.selection().len() == visible.len() {
            // Any partial selection escalates to the whole view; a second
            // toggle then clears it
            grid.toggle_all(&rows);
            prop_assert!(grid.selection().is_empty());
        } else {
            // The selection was already complete and got cleared
            prop_assert!(grid.selection().is_empty());
            grid.toggle_all(&rows);
            prop_assert_eq!(grid.selection().len(), visible.len());
        }
    }

    #[test]
    fn resize_never_goes_below_minimum(
        start in -500i32..500,
        moves in prop::collection::vec(-800i32..800, 1..8),
    ) {
        let mut grid = grid();
        prop_assert!(grid.pointer_down("size", start));
        for x in &moves {
            let live = grid.pointer_move(*x, &mut NoGeometry);
            prop_assert!(live.is_some_and(|w| w >= 40));
        }
        let last = *moves.last().unwrap();
        let (key, width) = grid.pointer_up(last).unwrap();
        prop_assert_eq!(key.as_str(), "size");
        prop_assert!(width >= 40);
        prop_assert_eq!(grid.width("size"), Some(width));
    }

    #[test]
    fn set_width_clamps(px in 0u32..1000) {
        let mut grid = grid();
        let width = grid.set_width("name", px).unwrap();
        prop_assert_eq!(width, px.max(70));
    }

    #[test]
    fn ghost_batch_conserves_rows(
        count in 1usize..12,
        decisions in prop::collection::vec(any::<bool>(), 12),
    ) {
        let mut ghosts: GhostLifecycle<Record> = GhostLifecycle::new(90.0, Duration::ZERO);
        let now = Instant::now();
        ghosts.begin_loading(count, Duration::from_millis(100), now).unwrap();
        let items: Vec<Record> = (0..count)
            .map(|i| Record::new(-(i as i64) - 1, [("name".to_string(), json!("draft"))]))
            .collect();
        prop_assert_eq!(ghosts.finish_loading(items, now).unwrap(), None);
        prop_assert_eq!(ghosts.status(), GhostStatus::Ready);

        let mut merged = 0;
        let mut summary = None;
        for (i, accept) in decisions.iter().take(count).enumerate() {
            let id = RowId::Num(-(i as i64) - 1);
            summary = if *accept {
                ghosts.accept(&id, |_| merged += 1).unwrap()
            } else {
                ghosts.reject(&id).unwrap()
            };
        }
        let summary = summary.unwrap();
        prop_assert_eq!(summary.ready, count);
        prop_assert_eq!(summary.accepted + summary.rejected, count);
        prop_assert_eq!(summary.accepted, merged);
        prop_assert_eq!(ghosts.status(), GhostStatus::Idle);
    }

    #[test]
    fn stutter_progress_is_monotonic_and_capped(
        a in 0u64..20_000,
        b in 0u64..20_000,
        duration in 1u64..10_000,
        ceiling in 0.0f32..99.0,
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let p_lo = stutter_progress(lo, duration, ceiling);
        let p_hi = stutter_progress(hi, duration, ceiling);
        prop_assert!(p_lo <= p_hi);
        prop_assert!(p_hi <= ceiling);
        prop_assert!(p_lo >= 0.0);
    }
}
