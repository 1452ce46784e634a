//! Agreement ratios shared by per-image and aggregate statistics
//!
//! Every ratio here is defined as `0.0` when its denominator is zero, so empty
//! comparisons never produce `NaN`.

/// Calculate `numerator / denominator`, or `0.0` for an empty denominator
///
/// # Examples
///
/// ```
/// # use anno_compare::metrics::agreement::ratio;
/// assert_eq!(ratio(3, 4), 0.75);
/// assert_eq!(ratio(0, 0), 0.0);
/// ```
#[must_use]
pub fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let value = (numerator as f64) / (denominator as f64);
    value
}

/// Primary-tag matching rate
///
/// Each matched pair consumes one box from each annotator:
/// `2 * matched_pairs / (total_boxes1 + total_boxes2)`.
///
/// # Examples
///
/// ```
/// # use anno_compare::metrics::agreement::primary_matching_rate;
/// assert_eq!(primary_matching_rate(3, 4, 4), 0.75);
/// ```
#[must_use]
pub fn primary_matching_rate(matched_pairs: usize, total_boxes1: usize, total_boxes2: usize) -> f64 {
    ratio(2 * matched_pairs, total_boxes1 + total_boxes2)
}

/// Mean of `sum` over `count` values, `0.0` when there are none
#[must_use]
pub fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let value = sum / count as f64;
    value
}

/// Ratio expressed as a percentage
#[must_use]
pub fn percentage(numerator: usize, denominator: usize) -> f64 {
    ratio(numerator, denominator) * 100.0
}
