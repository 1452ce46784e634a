//! Intersection over Union (IoU) calculation.

use crate::types::BoundingBox;

/// Area shared by two boxes; `0.0` when they do not overlap.
pub fn intersection_area(bbox1: &BoundingBox, bbox2: &BoundingBox) -> f64 {
    let overlap_w = bbox1.right().min(bbox2.right()) - bbox1.x.max(bbox2.x);
    let overlap_h = bbox1.bottom().min(bbox2.bottom()) - bbox1.y.max(bbox2.y);
    overlap_w.max(0.0) * overlap_h.max(0.0)
}

/// Calculate the Intersection over Union (IoU) between two bounding boxes.
///
/// Degenerate boxes whose union has no area score `0.0`.
///
/// # Example
///
/// ```
/// use anno_compare::metrics::iou::calculate_iou;
/// use anno_compare::types::BoundingBox;
///
/// let bbox1 = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
/// let bbox2 = BoundingBox::new(5.0, 5.0, 10.0, 10.0);
/// let iou = calculate_iou(&bbox1, &bbox2);
/// assert!((iou - 25.0 / 175.0).abs() < 1e-12);
/// ```
pub fn calculate_iou(bbox1: &BoundingBox, bbox2: &BoundingBox) -> f64 {
    let intersection = intersection_area(bbox1, bbox2);
    let union_area = bbox1.area() + bbox2.area() - intersection;

    if union_area <= 0.0 {
        return 0.0;
    }

    intersection / union_area
}

/// Calculate IoU matrix between two sets of bounding boxes.
///
/// `result[i][j]` is the IoU between `bboxes1[i]` and `bboxes2[j]`.
pub fn calculate_iou_matrix(bboxes1: &[BoundingBox], bboxes2: &[BoundingBox]) -> Vec<Vec<f64>> {
    bboxes1
        .iter()
        .map(|bbox1| {
            bboxes2
                .iter()
                .map(|bbox2| calculate_iou(bbox1, bbox2))
                .collect()
        })
        .collect()
}
