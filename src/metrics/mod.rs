//! Geometric and agreement metrics.

pub mod agreement;
pub mod iou;

pub use agreement::{mean, percentage, primary_matching_rate, ratio};
pub use iou::{calculate_iou, calculate_iou_matrix, intersection_area};
