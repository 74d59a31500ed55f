//! Property-based invariant tests for the waffle layout.
//!
//! For any non-empty leaderboard, cutoff and positive box:
//!
//! 1. Tiles exactly cover the box (area sum equals box area).
//! 2. Each tile's area is proportional to its count within the view.
//! 3. No two tiles overlap.
//! 4. Every tile lies inside the box.
//! 5. Tiles come out in rank order, one per record at or above the cutoff.
//! 6. Layout is bit-identical across runs.
//! 7. Loading drops zero counts and ranks the rest contiguously.

use proptest::prelude::*;
use waffle_rank::dataset::{load_reader, Dataset, LoadOptions, TieBreak};
use waffle_rank::layout::{layout, BoundingBox, LayoutConfig, StripAxis};

// ── Helpers ─────────────────────────────────────────────────────────────

fn counts_strategy() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(1u64..=1_000, 1..40)
}

fn box_strategy() -> impl Strategy<Value = BoundingBox> {
    (0.0f64..500.0, 0.0f64..500.0, 1.0f64..2_000.0, 1.0f64..2_000.0)
        .prop_map(|(x, y, w, h)| BoundingBox::new(x, y, w, h))
}

fn axis_strategy() -> impl Strategy<Value = StripAxis> {
    prop_oneof![
        Just(StripAxis::Alternate),
        Just(StripAxis::Rows),
        Just(StripAxis::Columns),
    ]
}

fn dataset(counts: &[u64]) -> Dataset {
    Dataset::from_counts(
        counts.iter().enumerate().map(|(i, &c)| (format!("user{i}"), c)),
        TieBreak::InputOrder,
    )
    .unwrap()
}

fn config(strip_axis: StripAxis) -> LayoutConfig {
    LayoutConfig {
        strip_axis,
        ..LayoutConfig::default()
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 1–4. Cover, proportionality, disjointness, containment
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn tiles_exactly_cover_the_box(
        counts in counts_strategy(),
        maxrank in 1u32..50,
        bbox in box_strategy(),
        axis in axis_strategy(),
    ) {
        let tiles = layout(&dataset(&counts), maxrank, bbox, &config(axis)).unwrap();
        let sum: f64 = tiles.iter().map(|t| t.area()).sum();
        prop_assert!(
            (sum - bbox.area()).abs() <= bbox.area() * 1e-9,
            "tile areas sum to {} for box area {}", sum, bbox.area()
        );
    }

    #[test]
    fn areas_are_proportional_within_the_view(
        counts in counts_strategy(),
        maxrank in 1u32..50,
        bbox in box_strategy(),
        axis in axis_strategy(),
    ) {
        let ds = dataset(&counts);
        let view_total: u64 = ds.view(maxrank).iter().map(|r| r.count).sum();
        let tiles = layout(&ds, maxrank, bbox, &config(axis)).unwrap();
        for tile in &tiles {
            let expected = bbox.area() * tile.record.count as f64 / view_total as f64;
            prop_assert!(
                (tile.area() - expected).abs() <= bbox.area() * 1e-9,
                "rank {} area {} expected {}", tile.record.rank, tile.area(), expected
            );
        }
    }

    #[test]
    fn tiles_do_not_overlap(
        counts in counts_strategy(),
        bbox in box_strategy(),
        axis in axis_strategy(),
    ) {
        let tiles = layout(&dataset(&counts), 50, bbox, &config(axis)).unwrap();
        let tol = bbox.area() * 1e-9;
        for (i, a) in tiles.iter().enumerate() {
            for b in &tiles[i + 1..] {
                let ox = ((a.x + a.width).min(b.x + b.width) - a.x.max(b.x)).max(0.0);
                let oy = ((a.y + a.height).min(b.y + b.height) - a.y.max(b.y)).max(0.0);
                prop_assert!(
                    ox * oy <= tol,
                    "rank {} and rank {} overlap by {}", a.record.rank, b.record.rank, ox * oy
                );
            }
        }
    }

    #[test]
    fn tiles_stay_inside_the_box(
        counts in counts_strategy(),
        bbox in box_strategy(),
        axis in axis_strategy(),
    ) {
        let tiles = layout(&dataset(&counts), 50, bbox, &config(axis)).unwrap();
        let eps = 1e-9 * (bbox.width + bbox.height);
        for t in &tiles {
            prop_assert!(t.width >= 0.0 && t.height >= 0.0);
            prop_assert!(t.x >= bbox.x - eps && t.y >= bbox.y - eps);
            prop_assert!(t.x + t.width <= bbox.x + bbox.width + eps);
            prop_assert!(t.y + t.height <= bbox.y + bbox.height + eps);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5–6. Ordering and determinism
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn one_tile_per_record_in_rank_order(
        counts in counts_strategy(),
        maxrank in 1u32..50,
    ) {
        let ds = dataset(&counts);
        let tiles = layout(&ds, maxrank, BoundingBox::sized(100.0, 100.0), &LayoutConfig::default()).unwrap();
        prop_assert_eq!(tiles.len(), counts.len().min(maxrank as usize));
        for (i, tile) in tiles.iter().enumerate() {
            prop_assert_eq!(tile.record.rank, i as u32 + 1);
            prop_assert_eq!(tile.color.slot, i as u32);
        }
    }

    #[test]
    fn layout_is_deterministic(
        counts in counts_strategy(),
        maxrank in 1u32..50,
        bbox in box_strategy(),
    ) {
        let ds = dataset(&counts);
        let first = layout(&ds, maxrank, bbox, &LayoutConfig::default()).unwrap();
        let second = layout(&ds, maxrank, bbox, &LayoutConfig::default()).unwrap();
        prop_assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            prop_assert_eq!(a.x.to_bits(), b.x.to_bits());
            prop_assert_eq!(a.y.to_bits(), b.y.to_bits());
            prop_assert_eq!(a.width.to_bits(), b.width.to_bits());
            prop_assert_eq!(a.height.to_bits(), b.height.to_bits());
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 7. Loader
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn loader_drops_zero_counts(counts in prop::collection::vec(0u64..5, 1..30)) {
        let mut csv = String::from("username,waffles\n");
        for (i, c) in counts.iter().enumerate() {
            csv.push_str(&format!("user{i},{c}\n"));
        }
        let nonzero = counts.iter().filter(|&&c| c > 0).count();
        match load_reader(csv.as_bytes(), &LoadOptions::default()) {
            Ok(ds) => {
                prop_assert_eq!(ds.len(), nonzero);
                for (i, r) in ds.records().iter().enumerate() {
                    prop_assert!(r.count > 0);
                    prop_assert_eq!(r.rank, i as u32 + 1);
                }
                for pair in ds.records().windows(2) {
                    prop_assert!(pair[0].count >= pair[1].count);
                }
            }
            Err(e) => {
                prop_assert_eq!(nonzero, 0);
                prop_assert_eq!(e.kind(), "empty-dataset");
            }
        }
    }
}
