use std::collections::HashSet;

use glam::Vec2;
use proptest::prelude::*;
use terrastream_world::GridWindow;

fn cell_key(origin: Vec2, cell_size: f32) -> (i32, i32) {
    let k = (origin / cell_size).round();
    (k.x as i32, k.y as i32)
}

fn key_set(window: &GridWindow) -> HashSet<(i32, i32)> {
    window
        .origins()
        .map(|o| cell_key(o, window.cell_size()))
        .collect()
}

fn arb_cell_size() -> impl Strategy<Value = f32> {
    prop_oneof![Just(8.0_f32), Just(16.0), Just(32.0), Just(64.0)]
}

fn arb_position() -> impl Strategy<Value = Vec2> {
    (-4000.0_f32..4000.0, -4000.0_f32..4000.0).prop_map(|(x, y)| Vec2::new(x, y))
}

proptest! {
    #[test]
    fn prop_entered_is_exact_difference(
        cs in arb_cell_size(),
        n in 1u32..5,
        p0 in arb_position(),
        p1 in arb_position(),
    ) {
        let old = GridWindow::centered_on(p0, cs, n);
        if let Some(shift) = old.reconcile(p1) {
            let old_keys = key_set(&old);
            let new_keys = key_set(&shift.window);

            let entered: Vec<(i32, i32)> =
                shift.entered.iter().map(|o| cell_key(*o, cs)).collect();
            let entered_set: HashSet<(i32, i32)> = entered.iter().copied().collect();

            // No origin is requested twice, corners included
            prop_assert_eq!(entered.len(), entered_set.len());

            let expected: HashSet<(i32, i32)> =
                new_keys.difference(&old_keys).copied().collect();
            prop_assert_eq!(entered_set, expected);
        }
    }

    #[test]
    fn prop_reconcile_is_idempotent(
        cs in arb_cell_size(),
        n in 1u32..5,
        p0 in arb_position(),
        p1 in arb_position(),
    ) {
        let old = GridWindow::centered_on(p0, cs, n);
        let window = old.reconcile(p1).map_or(old, |shift| shift.window);
        prop_assert!(window.reconcile(p1).is_none());
    }

    #[test]
    fn prop_start_stays_in_band(
        cs in arb_cell_size(),
        n in 1u32..5,
        p0 in arb_position(),
        p1 in arb_position(),
    ) {
        let old = GridWindow::centered_on(p0, cs, n);
        let window = old.reconcile(p1).map_or(old, |shift| shift.window);
        let (min, max) = window.start_band(p1);
        let start = window.start();

        prop_assert!(start.x >= min.x && start.x <= max.x);
        prop_assert!(start.y >= min.y && start.y <= max.y);
        prop_assert_eq!((start / cs).round() * cs, start);
    }

    #[test]
    fn prop_small_steps_emit_columns(
        cs in arb_cell_size(),
        n in 2u32..5,
        kx in -3i32..=3,
        ky in -3i32..=3,
    ) {
        let old = GridWindow::new(Vec2::ZERO, cs, n);
        let side = 2 * n as i32;
        // The band for this viewpoint is [k, k + 1] cells on each axis
        let target = Vec2::new(kx as f32, ky as f32) + Vec2::splat(n as f32 - 0.5);
        let shift = old.reconcile(target * cs);

        // Moving negative clamps to the top of the band
        let steps = |k: i32| if k < 0 { (k + 1).abs() } else { k };
        let (sx, sy) = (steps(kx), steps(ky));
        let expected = side * (sx + sy) - sx * sy;
        match shift {
            Some(shift) => {
                prop_assert_eq!(shift.entered.len() as i32, expected);
                prop_assert!(shift.entered.iter().all(|o| !shift.window.is_distant(*o)));
            },
            None => prop_assert_eq!(expected, 0),
        }
    }

    #[test]
    fn prop_window_origins_are_not_distant(
        cs in arb_cell_size(),
        n in 1u32..5,
        p in arb_position(),
    ) {
        let window = GridWindow::centered_on(p, cs, n);
        prop_assert!(window.origins().all(|o| !window.is_distant(o)));

        let span = window.span();
        let start = window.start();
        prop_assert!(window.is_distant(start - Vec2::new(cs, 0.0)));
        prop_assert!(window.is_distant(start + Vec2::new(0.0, span)));
    }
}
