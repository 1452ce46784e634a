//! Property-based tests using proptest
//!
//! These tests verify geometric properties and reconciliation invariants that
//! should always hold regardless of the input boxes.

use anno_compare::config::CompareOptions;
use anno_compare::evaluator::compare_logs;
use anno_compare::loader::{load_from_str, save_to_string};
use anno_compare::metrics::calculate_iou;
use anno_compare::reconcile::{normalize_tag, MatchPolicy};
use anno_compare::types::{AnnotationLog, Attribute, BoundingBox, Region};
use proptest::prelude::*;
use std::collections::HashSet;

const TAGS: [&str; 5] = ["sleeve", "sleeve2", "collar", "collar1", "hem"];

fn region_strategy() -> impl Strategy<Value = Region> {
    (
        0usize..TAGS.len(),
        0.0f64..60.0,
        0.0f64..60.0,
        1.0f64..40.0,
        1.0f64..40.0,
        prop::collection::vec("[a-z]{1,4}", 0..3),
    )
        .prop_map(|(tag, x, y, w, h, colors)| Region {
            tag: Some(TAGS[tag].to_string()),
            bbox: Some(BoundingBox::new(x, y, w, h)),
            attributes: vec![Attribute::new("color", colors)],
            additional_annotation: None,
        })
}

fn log_strategy(id: &'static str) -> impl Strategy<Value = AnnotationLog> {
    prop::collection::vec(region_strategy(), 0..8).prop_map(move |regions| AnnotationLog {
        id: id.to_string(),
        is_invalid: false,
        pictures: vec![],
        regions,
    })
}

fn policy_strategy() -> impl Strategy<Value = MatchPolicy> {
    prop_oneof![Just(MatchPolicy::Greedy), Just(MatchPolicy::OneToOne)]
}

// Property: IoU is symmetric
proptest! {
    #[test]
    fn prop_iou_symmetric(
        x1 in 0.0f64..100.0,
        y1 in 0.0f64..100.0,
        w1 in 0.0f64..50.0,
        h1 in 0.0f64..50.0,
        x2 in 0.0f64..100.0,
        y2 in 0.0f64..100.0,
        w2 in 0.0f64..50.0,
        h2 in 0.0f64..50.0,
    ) {
        let bbox1 = BoundingBox::new(x1, y1, w1, h1);
        let bbox2 = BoundingBox::new(x2, y2, w2, h2);

        let iou1 = calculate_iou(&bbox1, &bbox2);
        let iou2 = calculate_iou(&bbox2, &bbox1);

        assert!((iou1 - iou2).abs() < 1e-10,
                "IoU should be symmetric: {} vs {}", iou1, iou2);
    }
}

// Property: IoU is always between 0 and 1, degenerate boxes included
proptest! {
    #[test]
    fn prop_iou_range(
        x1 in 0.0f64..100.0,
        y1 in 0.0f64..100.0,
        w1 in 0.0f64..50.0,
        h1 in 0.0f64..50.0,
        x2 in 0.0f64..100.0,
        y2 in 0.0f64..100.0,
        w2 in 0.0f64..50.0,
        h2 in 0.0f64..50.0,
    ) {
        let bbox1 = BoundingBox::new(x1, y1, w1, h1);
        let bbox2 = BoundingBox::new(x2, y2, w2, h2);

        let iou = calculate_iou(&bbox1, &bbox2);

        assert!(iou.is_finite() && (0.0..=1.0 + 1e-9).contains(&iou),
                "IoU should be in [0,1], got {}", iou);
    }
}

// Property: Identical boxes with area have IoU = 1.0
proptest! {
    #[test]
    fn prop_iou_identical(
        x in 0.0f64..100.0,
        y in 0.0f64..100.0,
        w in 1.0f64..50.0,
        h in 1.0f64..50.0,
    ) {
        let bbox = BoundingBox::new(x, y, w, h);
        let iou = calculate_iou(&bbox, &bbox);

        assert!((iou - 1.0).abs() < 1e-10,
                "Identical boxes should have IoU=1.0, got {}", iou);
    }
}

// Property: Corner order does not matter
proptest! {
    #[test]
    fn prop_from_corners_order_independent(
        x1 in -50.0f64..50.0,
        y1 in -50.0f64..50.0,
        x2 in -50.0f64..50.0,
        y2 in -50.0f64..50.0,
    ) {
        let a = BoundingBox::from_corners((x1, y1), (x2, y2));
        let b = BoundingBox::from_corners((x2, y2), (x1, y1));
        prop_assert_eq!(a, b);
        prop_assert!(a.width >= 0.0 && a.height >= 0.0);
    }
}

// Property: Normalization is idempotent and never ends in a digit
proptest! {
    #[test]
    fn prop_normalize_idempotent(tag in "[a-z_]{1,6}[0-9]{0,3}") {
        let once = normalize_tag(Some(&tag));
        let twice = normalize_tag(Some(&once));
        prop_assert_eq!(&once, &twice);
        prop_assert!(!once.ends_with(|c: char| c.is_ascii_digit()));
    }
}

// Property: Every box is unmatched XOR part of an accepted pair
proptest! {
    #[test]
    fn prop_residual_partition(
        log1 in log_strategy("1"),
        log2 in log_strategy("2"),
        threshold in 0.05f64..1.0,
        policy in policy_strategy(),
    ) {
        let options = CompareOptions::default()
            .with_threshold(threshold)
            .with_policy(policy);
        let comparison = compare_logs(&log1, &log2, &options).unwrap();
        let rec = &comparison.reconciliation;

        let matched: HashSet<&str> = rec
            .matched
            .iter()
            .flat_map(|p| [p.box_id1.as_str(), p.box_id2.as_str()])
            .collect();
        let unmatched: HashSet<&str> = rec.unmatched().map(|u| u.box_id.as_str()).collect();

        for id in comparison.box_ids() {
            prop_assert!(matched.contains(id) != unmatched.contains(id),
                         "box {} must be in exactly one of matched/unmatched", id);
        }
        prop_assert!(rec.matched.len() + rec.confused.len() <= comparison.raw_matches.len());
        for (i, pair) in rec.matched.iter().enumerate() {
            prop_assert_eq!(pair.group_id as usize, i + 1);
            prop_assert!(pair.iou >= threshold);
        }
    }
}

// Property: One-to-one never reuses a box and never exceeds a rate of one
proptest! {
    #[test]
    fn prop_one_to_one_unique(
        log1 in log_strategy("1"),
        log2 in log_strategy("2"),
    ) {
        let options = CompareOptions::default().with_policy(MatchPolicy::OneToOne);
        let comparison = compare_logs(&log1, &log2, &options).unwrap();
        let rec = &comparison.reconciliation;

        let ids1: HashSet<&str> = rec.matched.iter().map(|p| p.box_id1.as_str()).collect();
        let ids2: HashSet<&str> = rec.matched.iter().map(|p| p.box_id2.as_str()).collect();
        prop_assert_eq!(ids1.len(), rec.matched.len());
        prop_assert_eq!(ids2.len(), rec.matched.len());
        prop_assert!(comparison.stats.primary_matching_rate <= 1.0 + 1e-12);
    }
}

// Property: Greedy accepts every compatible raw match
proptest! {
    #[test]
    fn prop_greedy_splits_raw_matches(
        log1 in log_strategy("1"),
        log2 in log_strategy("2"),
    ) {
        let comparison = compare_logs(&log1, &log2, &CompareOptions::default()).unwrap();
        let rec = &comparison.reconciliation;
        prop_assert_eq!(
            rec.matched.len() + rec.confused.len(),
            comparison.raw_matches.len()
        );
    }
}

// Property: Saving and reloading keeps tags, boxes and attribute values
proptest! {
    #[test]
    fn prop_save_reload_preserves_regions(log in log_strategy("9")) {
        let saved = save_to_string(std::slice::from_ref(&log)).unwrap();
        let reloaded = load_from_str(&saved).unwrap();
        prop_assert_eq!(reloaded.len(), 1);
        let reloaded = &reloaded[0];
        prop_assert_eq!(reloaded.regions.len(), log.regions.len());

        for (before, after) in log.regions.iter().zip(&reloaded.regions) {
            prop_assert_eq!(&before.tag, &after.tag);
            prop_assert_eq!(&before.attributes, &after.attributes);
            let (b, a) = (before.bbox.unwrap(), after.bbox.unwrap());
            prop_assert!((b.x - a.x).abs() < 1e-9 && (b.y - a.y).abs() < 1e-9);
            prop_assert!((b.width - a.width).abs() < 1e-9 && (b.height - a.height).abs() < 1e-9);
        }
    }
}
