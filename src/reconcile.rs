//! Reconciliation of geometric matches against category tags.
//!
//! Geometric matches whose tags agree (after dropping digit suffixes) become
//! [`MatchedPair`]s with sequential group ids; the others are kept as
//! [`ConfusedPair`]s for confusion statistics. Boxes that end up in no
//! accepted pair form the unmatched residual of each annotator.

use crate::error::{CompareError, Result};
use crate::matching::{BoxItem, RawMatch};
use crate::types::{Annotator, Attribute, BoundingBox, Region, UNKNOWN_TAG};
use pathfinding::{kuhn_munkres::kuhn_munkres_min, matrix::Matrix};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// How tag-compatible geometric matches are turned into matched pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Accept every compatible match in scan order. A box overlapping several
    /// compatible boxes of the other annotator appears in several pairs.
    #[default]
    Greedy,
    /// Accept the one-to-one assignment of compatible matches with the
    /// largest total IoU.
    OneToOne,
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchPolicy::Greedy => write!(f, "greedy"),
            MatchPolicy::OneToOne => write!(f, "one_to_one"),
        }
    }
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "greedy" => Ok(MatchPolicy::Greedy),
            "one_to_one" | "onetoone" | "hungarian" => Ok(MatchPolicy::OneToOne),
            other => Err(format!(
                "unknown match policy '{}', expected 'greedy' or 'one_to_one'",
                other
            )),
        }
    }
}

/// Normalize a tag for comparison.
///
/// Missing or empty tags become `"UNKNOWN"`; otherwise the trailing run of
/// ASCII digits the authoring tool appends is removed.
///
/// ```
/// use anno_compare::reconcile::normalize_tag;
///
/// assert_eq!(normalize_tag(Some("sleeve12")), "sleeve");
/// assert_eq!(normalize_tag(Some("2nd_layer3")), "2nd_layer");
/// assert_eq!(normalize_tag(None), "UNKNOWN");
/// ```
pub fn normalize_tag(tag: Option<&str>) -> String {
    match tag {
        None | Some("") => UNKNOWN_TAG.to_string(),
        Some(tag) => tag.trim_end_matches(|c: char| c.is_ascii_digit()).to_string(),
    }
}

/// Whether two tags name the same category.
pub fn tags_compatible(tag1: Option<&str>, tag2: Option<&str>) -> bool {
    normalize_tag(tag1) == normalize_tag(tag2)
}

/// A geometric match accepted as the same object by both annotators.
#[derive(Debug, Clone, Serialize)]
pub struct MatchedPair<'a> {
    /// 1-based, in acceptance order.
    pub group_id: u32,
    /// Annotator 1's tag as written.
    pub tag: String,
    /// 1-based position of the originating geometric match.
    pub pair_index: usize,
    pub box_id1: String,
    pub box_id2: String,
    pub box1: BoundingBox,
    pub box2: BoundingBox,
    #[serde(skip)]
    pub region1: &'a Region,
    #[serde(skip)]
    pub region2: &'a Region,
    pub iou: f64,
}

/// A box that is part of no accepted pair.
#[derive(Debug, Clone, Serialize)]
pub struct UnmatchedBox<'a> {
    pub annotator: Annotator,
    pub box_id: String,
    pub tag: String,
    pub bbox: BoundingBox,
    #[serde(skip)]
    pub region: &'a Region,
}

impl<'a> UnmatchedBox<'a> {
    pub fn attributes(&self) -> &'a [Attribute] {
        &self.region.attributes
    }

    fn from_item(item: &BoxItem<'a>) -> Self {
        Self {
            annotator: item.annotator,
            box_id: item.box_id.clone(),
            tag: item.display_tag().to_string(),
            bbox: item.bbox,
            region: item.region,
        }
    }
}

/// Boxes that overlap enough but carry different categories.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfusedPair {
    pub tag1: String,
    pub box_id1: String,
    pub tag2: String,
    pub box_id2: String,
    pub iou: f64,
}

/// Outcome of reconciling one image's geometric matches.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Reconciliation<'a> {
    pub matched: Vec<MatchedPair<'a>>,
    pub confused: Vec<ConfusedPair>,
    pub unmatched1: Vec<UnmatchedBox<'a>>,
    pub unmatched2: Vec<UnmatchedBox<'a>>,
}

impl<'a> Reconciliation<'a> {
    /// Unmatched boxes of both annotators, annotator 1 first.
    pub fn unmatched(&self) -> impl Iterator<Item = &UnmatchedBox<'a>> {
        self.unmatched1.iter().chain(self.unmatched2.iter())
    }

    /// Group ids present in this reconciliation, ascending.
    pub fn group_ids(&self) -> Vec<u32> {
        self.matched.iter().map(|pair| pair.group_id).collect()
    }
}

/// Split geometric matches into matched pairs, confused pairs and residuals.
///
/// `raw_matches` must come from [`match_boxes`](crate::matching::match_boxes)
/// over the same `boxes1` and `boxes2`.
///
/// # Errors
///
/// Returns [`CompareError::Assignment`] if the one-to-one assignment matrix
/// cannot be built.
pub fn reconcile<'a>(
    boxes1: &[BoxItem<'a>],
    boxes2: &[BoxItem<'a>],
    raw_matches: &[RawMatch],
    policy: MatchPolicy,
) -> Result<Reconciliation<'a>> {
    let mut compatible: Vec<(usize, RawMatch)> = Vec::new();
    let mut confused = Vec::new();

    for (position, raw) in raw_matches.iter().enumerate() {
        let item1 = &boxes1[raw.index1];
        let item2 = &boxes2[raw.index2];
        if tags_compatible(item1.tag(), item2.tag()) {
            compatible.push((position, *raw));
        } else {
            log::debug!(
                "Dropped match {} / {}: tag {} differs from {}",
                item1.box_id,
                item2.box_id,
                item1.display_tag(),
                item2.display_tag()
            );
            confused.push(ConfusedPair {
                tag1: item1.display_tag().to_string(),
                box_id1: item1.box_id.clone(),
                tag2: item2.display_tag().to_string(),
                box_id2: item2.box_id.clone(),
                iou: raw.iou,
            });
        }
    }

    if policy == MatchPolicy::OneToOne {
        let assigned = assign_one_to_one(boxes1.len(), boxes2.len(), &compatible)?;
        compatible.retain(|(_, raw)| assigned.contains(&(raw.index1, raw.index2)));
    }

    let mut used1: HashSet<usize> = HashSet::new();
    let mut used2: HashSet<usize> = HashSet::new();
    let mut matched = Vec::with_capacity(compatible.len());

    for (group, (position, raw)) in compatible.iter().enumerate() {
        let item1 = &boxes1[raw.index1];
        let item2 = &boxes2[raw.index2];
        matched.push(MatchedPair {
            group_id: group as u32 + 1,
            tag: item1.display_tag().to_string(),
            pair_index: position + 1,
            box_id1: item1.box_id.clone(),
            box_id2: item2.box_id.clone(),
            box1: item1.bbox,
            box2: item2.bbox,
            region1: item1.region,
            region2: item2.region,
            iou: raw.iou,
        });
        used1.insert(raw.index1);
        used2.insert(raw.index2);
    }

    Ok(Reconciliation {
        unmatched1: residual(boxes1, &used1),
        unmatched2: residual(boxes2, &used2),
        matched,
        confused,
    })
}

fn residual<'a>(boxes: &[BoxItem<'a>], used: &HashSet<usize>) -> Vec<UnmatchedBox<'a>> {
    boxes
        .iter()
        .enumerate()
        .filter(|(idx, _)| !used.contains(idx))
        .map(|(_, item)| UnmatchedBox::from_item(item))
        .collect()
}

/// Maximum-total-IoU one-to-one assignment over the candidate matches.
///
/// Returns the `(index1, index2)` pairs chosen among `candidates`.
fn assign_one_to_one(
    n1: usize,
    n2: usize,
    candidates: &[(usize, RawMatch)],
) -> Result<HashSet<(usize, usize)>> {
    if candidates.is_empty() {
        return Ok(HashSet::new());
    }

    // Cost is (1 - IoU) scaled to integers. Non-candidate and padding cells
    // cost strictly more than any candidate, including one with IoU 0.
    const SCALE: i64 = 1_000_000;
    const NO_MATCH: i64 = SCALE + 1;
    let size = n1.max(n2);
    let mut weights = vec![NO_MATCH; size * size];
    for (_, raw) in candidates {
        weights[raw.index1 * size + raw.index2] = ((1.0 - raw.iou) * SCALE as f64).round() as i64;
    }

    let matrix = Matrix::from_vec(size, size, weights)
        .map_err(|e| CompareError::Assignment(format!("{:?}", e)))?;
    let (_, assignment) = kuhn_munkres_min(&matrix);

    let candidate_keys: HashSet<(usize, usize)> = candidates
        .iter()
        .map(|(_, raw)| (raw.index1, raw.index2))
        .collect();

    Ok(assignment
        .into_iter()
        .enumerate()
        .filter(|key| candidate_keys.contains(key))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::{collect_boxes, match_boxes};
    use crate::types::AnnotationLog;

    fn log_with(regions: &[(&str, BoundingBox)]) -> AnnotationLog {
        AnnotationLog {
            id: "1".to_string(),
            is_invalid: false,
            pictures: vec![],
            regions: regions
                .iter()
                .map(|(tag, bbox)| Region {
                    tag: Some(tag.to_string()),
                    bbox: Some(*bbox),
                    attributes: vec![],
                    additional_annotation: None,
                })
                .collect(),
        }
    }

    fn run<'a>(
        log1: &'a AnnotationLog,
        log2: &'a AnnotationLog,
        policy: MatchPolicy,
    ) -> Reconciliation<'a> {
        let boxes1 = collect_boxes(log1, Annotator::First);
        let boxes2 = collect_boxes(log2, Annotator::Second);
        let raw = match_boxes(&boxes1, &boxes2, 0.3).unwrap();
        reconcile(&boxes1, &boxes2, &raw, policy).unwrap()
    }

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag(Some("sleeve12")), "sleeve");
        assert_eq!(normalize_tag(Some("sleeve7")), "sleeve");
        assert_eq!(normalize_tag(Some("sleeve")), "sleeve");
        assert_eq!(normalize_tag(Some("")), "UNKNOWN");
        assert_eq!(normalize_tag(Some("a1b2")), "a1b");
        assert!(tags_compatible(Some("sleeve12"), Some("sleeve7")));
        assert!(!tags_compatible(Some("sleeve"), Some("collar")));
        assert!(tags_compatible(None, Some("UNKNOWN3")));
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("greedy".parse::<MatchPolicy>().unwrap(), MatchPolicy::Greedy);
        assert_eq!("one-to-one".parse::<MatchPolicy>().unwrap(), MatchPolicy::OneToOne);
        assert!("best".parse::<MatchPolicy>().is_err());
        assert_eq!(MatchPolicy::OneToOne.to_string(), "one_to_one");
    }

    #[test]
    fn test_compatible_tags_accepted() {
        let log1 = log_with(&[("cuff3", BoundingBox::new(0.0, 0.0, 10.0, 10.0))]);
        let log2 = log_with(&[("cuff1", BoundingBox::new(1.0, 1.0, 10.0, 10.0))]);
        let result = run(&log1, &log2, MatchPolicy::Greedy);

        assert_eq!(result.matched.len(), 1);
        assert_eq!(result.matched[0].group_id, 1);
        assert_eq!(result.matched[0].tag, "cuff3");
        assert_eq!(result.matched[0].pair_index, 1);
        assert!(result.confused.is_empty());
        assert!(result.unmatched1.is_empty());
        assert!(result.unmatched2.is_empty());
    }

    #[test]
    fn test_incompatible_tags_confused() {
        let log1 = log_with(&[("collar", BoundingBox::new(0.0, 0.0, 10.0, 10.0))]);
        let log2 = log_with(&[("sleeve", BoundingBox::new(0.0, 0.0, 10.0, 10.0))]);
        let result = run(&log1, &log2, MatchPolicy::Greedy);

        assert!(result.matched.is_empty());
        assert_eq!(result.confused.len(), 1);
        assert_eq!(result.confused[0].tag1, "collar");
        assert_eq!(result.confused[0].tag2, "sleeve");
        assert_eq!(result.unmatched1.len(), 1);
        assert_eq!(result.unmatched2.len(), 1);
        assert_eq!(result.unmatched2[0].annotator, Annotator::Second);
    }

    #[test]
    fn test_greedy_allows_reuse() {
        // One large box on side 1 overlapping two boxes on side 2.
        let log1 = log_with(&[("pocket", BoundingBox::new(0.0, 0.0, 10.0, 10.0))]);
        let log2 = log_with(&[
            ("pocket1", BoundingBox::new(0.0, 0.0, 10.0, 8.0)),
            ("pocket2", BoundingBox::new(0.0, 2.0, 10.0, 8.0)),
        ]);
        let result = run(&log1, &log2, MatchPolicy::Greedy);

        assert_eq!(result.matched.len(), 2);
        assert_eq!(result.group_ids(), vec![1, 2]);
        assert_eq!(result.matched[0].box_id1, result.matched[1].box_id1);
        assert!(result.unmatched1.is_empty());
        assert!(result.unmatched2.is_empty());
    }

    #[test]
    fn test_one_to_one_picks_best_assignment() {
        // Greedy order would pair a1 with b1 first; the optimal assignment
        // pairs a1 with b2 and a2 with b1.
        let log1 = log_with(&[
            ("hem", BoundingBox::new(0.0, 0.0, 10.0, 10.0)),
            ("hem", BoundingBox::new(4.0, 0.0, 10.0, 10.0)),
        ]);
        let log2 = log_with(&[
            ("hem", BoundingBox::new(3.0, 0.0, 10.0, 10.0)),
            ("hem", BoundingBox::new(0.0, 0.0, 10.0, 10.0)),
        ]);
        let result = run(&log1, &log2, MatchPolicy::OneToOne);

        assert_eq!(result.matched.len(), 2);
        let pairs: Vec<(&str, &str)> = result
            .matched
            .iter()
            .map(|p| (p.box_id1.as_str(), p.box_id2.as_str()))
            .collect();
        assert!(pairs.contains(&("Annotator1_1_1", "Annotator2_2_1")));
        assert!(pairs.contains(&("Annotator1_2_1", "Annotator2_1_1")));
        assert_eq!(result.group_ids(), vec![1, 2]);
    }

    #[test]
    fn test_one_to_one_never_reuses_boxes() {
        let log1 = log_with(&[("pocket", BoundingBox::new(0.0, 0.0, 10.0, 10.0))]);
        let log2 = log_with(&[
            ("pocket1", BoundingBox::new(0.0, 0.0, 10.0, 8.0)),
            ("pocket2", BoundingBox::new(0.0, 3.0, 10.0, 7.0)),
        ]);
        let result = run(&log1, &log2, MatchPolicy::OneToOne);

        assert_eq!(result.matched.len(), 1);
        assert_eq!(result.matched[0].box_id2, "Annotator2_1_1");
        assert_eq!(result.unmatched2.len(), 1);
        assert_eq!(result.unmatched2[0].box_id, "Annotator2_2_1");
    }

    #[test]
    fn test_one_to_one_ignores_incompatible_overlap() {
        let log1 = log_with(&[("hem", BoundingBox::new(0.0, 0.0, 10.0, 10.0))]);
        let log2 = log_with(&[
            ("collar", BoundingBox::new(0.0, 0.0, 10.0, 10.0)),
            ("hem", BoundingBox::new(2.0, 0.0, 10.0, 10.0)),
        ]);
        let result = run(&log1, &log2, MatchPolicy::OneToOne);

        assert_eq!(result.matched.len(), 1);
        assert_eq!(result.matched[0].box_id2, "Annotator2_2_1");
        assert_eq!(result.confused.len(), 1);
        assert_eq!(result.unmatched2.len(), 1);
    }

    #[test]
    fn test_one_to_one_keeps_zero_iou_match_at_zero_threshold() {
        // The only compatible box does not overlap at all; at threshold 0 it
        // is still a candidate and must win over the incompatible column.
        let log1 = log_with(&[("hem", BoundingBox::new(0.0, 0.0, 10.0, 10.0))]);
        let log2 = log_with(&[
            ("collar", BoundingBox::new(0.0, 0.0, 10.0, 10.0)),
            ("hem", BoundingBox::new(50.0, 50.0, 10.0, 10.0)),
        ]);
        let boxes1 = collect_boxes(&log1, Annotator::First);
        let boxes2 = collect_boxes(&log2, Annotator::Second);
        let raw = match_boxes(&boxes1, &boxes2, 0.0).unwrap();
        assert_eq!(raw.len(), 2);

        let result = reconcile(&boxes1, &boxes2, &raw, MatchPolicy::OneToOne).unwrap();
        assert_eq!(result.matched.len(), 1);
        assert_eq!(result.matched[0].box_id2, "Annotator2_2_1");
        assert_eq!(result.matched[0].iou, 0.0);
        assert_eq!(result.confused.len(), 1);
        assert!(result.unmatched1.is_empty());
    }
}
