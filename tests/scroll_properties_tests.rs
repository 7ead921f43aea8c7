//! Property-based invariant tests for the row pool.
//!
//! Verifies:
//! 1. Coverage: after any scroll sequence the rendered rows cover the viewport
//! 2. Pool bound: the pool never exceeds viewport rows plus buffers, nor the store
//! 3. Consistency: rows are stacked without gaps over consecutive records, and
//!    the known-height total matches its entries through store mutations
//! 4. Monotonic mapping: a larger scroll position never maps to an earlier top record
//! 5. Refresh is idempotent
//! 6. Warping lands on the record under the scroll position
//! 7. Warping to either edge gives an exact top index in both height modes

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use common::*;
use proptest::prelude::*;
use vgrid::{RowManagerConfig, Store};

const ROW_HEIGHT: f64 = 30.0;
const VIEW_HEIGHT: f64 = 600.0;

// ── Strategy helpers ──────────────────────────────────────────────────

fn arb_heights() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(prop_oneof![Just(30.0), Just(45.0), Just(60.0), Just(120.0)], 1..6)
}

/// Scroll positions as fractions of the scrollable height.
fn arb_scrolls() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0f64..=1.0, 1..12)
}

fn max_scroll(total: f64) -> f64 {
    (total - VIEW_HEIGHT).max(0.0)
}

/// One user or data action; fractions pick a position in the store or scroll range.
#[derive(Debug, Clone)]
enum Step {
    Scroll(f64),
    Insert(f64),
    Remove(f64),
    SetHeight(f64, f64),
}

fn arb_steps() -> impl Strategy<Value = Vec<Step>> {
    let step = prop_oneof![
        3 => (0.0f64..=1.0).prop_map(Step::Scroll),
        1 => (0.0f64..=1.0).prop_map(Step::Insert),
        1 => (0.0f64..=1.0).prop_map(Step::Remove),
        1 => (0.0f64..=1.0, prop_oneof![Just(30.0), Just(90.0)])
            .prop_map(|(at, height)| Step::SetHeight(at, height)),
    ];
    prop::collection::vec(step, 1..16)
}

fn index_at(fraction: f64, count: usize) -> usize {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let index = (fraction * count as f64).floor() as usize;
    index.min(count.saturating_sub(1))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn fixed_scrolls_cover_viewport(count in 1usize..20_000, scrolls in arb_scrolls()) {
        let fixture = Fixture::new(count);
        let mut manager = fixture.manager(RowManagerConfig::fixed(ROW_HEIGHT), VIEW_HEIGHT);
        for fraction in scrolls {
            let y = fraction * max_scroll(manager.total_height());
            manager.update_rendered_rows(fixture.ctx(), y);
            assert_covers(&manager, count, y);
            assert_contiguous(&manager);
        }
    }

    #[test]
    fn variable_scrolls_stay_consistent(
        count in 1usize..5000,
        heights in arb_heights(),
        steps in arb_steps(),
    ) {
        let mut fixture = Fixture::with_heights(count, &heights);
        let mut manager = fixture.manager(RowManagerConfig::variable(ROW_HEIGHT), VIEW_HEIGHT);
        let mut next_id = 1_000_000;
        for step in steps {
            let count = fixture.store.count();
            match step {
                Step::Scroll(fraction) => {
                    let y = fraction * max_scroll(manager.total_height());
                    if manager.update_rendered_rows(fixture.ctx(), y) {
                        assert_covers(&manager, count, manager.scroll_top());
                    }
                }
                Step::Insert(at) => {
                    let inserted = record(next_id).with_row_height(heights[next_id % heights.len()]);
                    next_id += 1;
                    let change = fixture.store.insert(index_at(at, count), vec![inserted]);
                    manager.on_store_change(fixture.ctx(), &change);
                }
                Step::Remove(at) => {
                    if count <= 1 {
                        continue;
                    }
                    let id = fixture.store.get_at(index_at(at, count)).unwrap().id.clone();
                    let change = fixture.store.remove(&[id]);
                    manager.on_store_change(fixture.ctx(), &change);
                }
                Step::SetHeight(at, height) => {
                    let id = fixture.store.get_at(index_at(at, count)).unwrap().id.clone();
                    let change = fixture.store.set_row_height(&id, Some(height)).unwrap();
                    manager.on_store_change(fixture.ctx(), &change);
                }
            }
            assert_contiguous(&manager);
            prop_assert_eq!(manager.height_map().total_known_height(), manager.height_map().sum());
            if let Some(bottom) = manager.bottom_row() {
                prop_assert!(manager.total_height() + 1e-6 >= bottom.bottom());
            }
        }
    }

    #[test]
    fn pool_is_bounded(count in 0usize..500, view_height in 0.0f64..2000.0) {
        let fixture = Fixture::new(count);
        let config = RowManagerConfig::fixed(ROW_HEIGHT);
        let manager = fixture.manager(config.clone(), view_height);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let visible = (view_height / ROW_HEIGHT).ceil() as usize;
        let bound = visible + config.prepend_row_buffer + config.append_row_buffer;
        prop_assert!(manager.rows().len() <= bound);
        prop_assert!(manager.rows().len() <= count);
        prop_assert_eq!(manager.rows().len(), manager.row_count());
    }

    #[test]
    fn mapping_is_monotonic(count in 100usize..50_000, a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
        let fixture = Fixture::new(count);
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let top_for = |fraction: f64| {
            let mut manager = fixture.manager(RowManagerConfig::fixed(ROW_HEIGHT), VIEW_HEIGHT);
            let y = fraction * max_scroll(manager.total_height());
            manager.update_rendered_rows(fixture.ctx(), y);
            manager.top_index()
        };
        prop_assert!(top_for(low) <= top_for(high));
    }

    #[test]
    fn refresh_is_idempotent(count in 1usize..5000, heights in arb_heights(), fraction in 0.0f64..=1.0) {
        let fixture = Fixture::with_heights(count, &heights);
        let mut manager = fixture.manager(RowManagerConfig::variable(ROW_HEIGHT), VIEW_HEIGHT);
        let y = fraction * max_scroll(manager.total_height());
        manager.update_rendered_rows(fixture.ctx(), y);
        let layout = |m: &vgrid::RowManager| -> Vec<(Option<usize>, f64)> {
            m.rows().iter().map(|r| (r.data_index(), r.top())).collect()
        };
        let before = layout(&manager);
        manager.refresh(fixture.ctx());
        prop_assert_eq!(layout(&manager), before);
    }

    #[test]
    fn warp_lands_on_scrolled_record(count in 1000usize..200_000, fraction in 0.1f64..=1.0) {
        let fixture = Fixture::new(count);
        let mut manager = fixture.manager(RowManagerConfig::fixed(ROW_HEIGHT), VIEW_HEIGHT);
        let y = fraction * max_scroll(manager.total_height());
        // Only jumps beyond three window heights warp.
        prop_assume!(y > 3.0 * manager.rows().len() as f64 * ROW_HEIGHT);
        manager.update_rendered_rows(fixture.ctx(), y);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let under = (y / ROW_HEIGHT).floor() as usize;
        prop_assert_eq!(manager.top_index(), under.min(count - manager.rows().len()));
    }

    #[test]
    fn warp_to_either_edge_is_exact(
        count in 1000usize..20_000,
        heights in arb_heights(),
        variable in any::<bool>(),
    ) {
        let fixture = Fixture::with_heights(count, &heights);
        let config = if variable {
            RowManagerConfig::variable(ROW_HEIGHT)
        } else {
            RowManagerConfig::fixed(ROW_HEIGHT)
        };
        let mut manager = fixture.manager(config, VIEW_HEIGHT);

        manager.update_rendered_rows(fixture.ctx(), manager.total_height() - 1.0);
        prop_assert_eq!(manager.top_index(), count - manager.row_count());
        prop_assert_eq!(manager.bottom_row().unwrap().data_index(), Some(count - 1));
        assert_contiguous(&manager);

        manager.update_rendered_rows(fixture.ctx(), 0.0);
        prop_assert_eq!(manager.top_index(), 0);
        prop_assert_eq!(manager.top_row().unwrap().top(), 0.0);
        assert_contiguous(&manager);
    }
}
