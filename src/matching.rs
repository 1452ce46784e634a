//! Geometric matching of boxes between two annotators.

use crate::error::Result;
use crate::metrics::iou::{calculate_iou, calculate_iou_matrix};
use crate::threshold::validate_threshold;
use crate::types::{AnnotationLog, Annotator, BoundingBox, Region};
use serde::Serialize;

/// A box taking part in matching, with the region it came from.
#[derive(Debug, Clone, Serialize)]
pub struct BoxItem<'a> {
    pub bbox: BoundingBox,
    pub region: &'a Region,
    pub annotator: Annotator,
    /// `"Annotator{n}_{region}_{box}"`, both indices 1-based.
    pub box_id: String,
}

impl<'a> BoxItem<'a> {
    /// Tag as written by the annotator.
    pub fn tag(&self) -> Option<&'a str> {
        self.region.tag.as_deref()
    }

    pub fn display_tag(&self) -> &'a str {
        self.region.display_tag()
    }
}

/// A cross pair whose IoU reached the threshold.
///
/// `index1` and `index2` point into the box lists given to [`match_boxes`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RawMatch {
    pub index1: usize,
    pub index2: usize,
    pub iou: f64,
}

/// Collect the matchable boxes of a log.
///
/// Regions without a box are skipped but still count towards the region
/// index used in box ids, so ids stay stable across both annotators' views.
pub fn collect_boxes(log: &AnnotationLog, annotator: Annotator) -> Vec<BoxItem<'_>> {
    log.regions
        .iter()
        .enumerate()
        .filter_map(|(idx, region)| {
            region.bbox.map(|bbox| BoxItem {
                bbox,
                region,
                annotator,
                box_id: format!("{}_{}_{}", annotator, idx + 1, 1),
            })
        })
        .collect()
}

/// Find every cross pair of boxes whose IoU is at least `threshold`.
///
/// This is an exhaustive scan rather than an assignment: one box may appear in
/// several returned matches. Matches are returned in nested-loop order
/// (`boxes1` outer, `boxes2` inner), which later decides acceptance order.
///
/// # Errors
///
/// Returns an error if `threshold` is outside `[0.0, 1.0]`.
pub fn match_boxes(
    boxes1: &[BoxItem<'_>],
    boxes2: &[BoxItem<'_>],
    threshold: f64,
) -> Result<Vec<RawMatch>> {
    validate_threshold(threshold)?;

    let mut matches = Vec::new();
    for (index1, item1) in boxes1.iter().enumerate() {
        for (index2, item2) in boxes2.iter().enumerate() {
            let iou = calculate_iou(&item1.bbox, &item2.bbox);
            if iou >= threshold {
                log::debug!(
                    "Matched {} with {} (IoU = {:.2})",
                    item1.box_id,
                    item2.box_id,
                    iou
                );
                matches.push(RawMatch { index1, index2, iou });
            }
        }
    }

    Ok(matches)
}

/// IoU between every box of `boxes1` and every box of `boxes2`.
pub fn iou_matrix(boxes1: &[BoxItem<'_>], boxes2: &[BoxItem<'_>]) -> Vec<Vec<f64>> {
    let bboxes1: Vec<BoundingBox> = boxes1.iter().map(|item| item.bbox).collect();
    let bboxes2: Vec<BoundingBox> = boxes2.iter().map(|item| item.bbox).collect();
    calculate_iou_matrix(&bboxes1, &bboxes2)
}
