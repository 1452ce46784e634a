//! IoU threshold validation and sweep ranges.

use crate::error::{CompareError, Result};

/// IoU at or above which two boxes are considered the same object.
pub const DEFAULT_IOU_THRESHOLD: f64 = 0.3;

/// Validate that a threshold is in the valid range [0.0, 1.0].
///
/// # Example
///
/// ```
/// use anno_compare::threshold::validate_threshold;
///
/// assert!(validate_threshold(0.3).is_ok());
/// assert!(validate_threshold(1.5).is_err());
/// ```
pub fn validate_threshold(threshold: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(CompareError::InvalidThreshold(format!(
            "Threshold must be between 0.0 and 1.0, got {}",
            threshold
        )));
    }
    Ok(())
}

/// Generate a range of threshold values for a sweep.
///
/// # Arguments
///
/// * `start` - Starting threshold value (inclusive)
/// * `end` - Ending threshold value (inclusive)
/// * `steps` - Number of threshold values to generate
///
/// # Example
///
/// ```
/// use anno_compare::threshold::generate_threshold_range;
///
/// let thresholds = generate_threshold_range(0.1, 0.9, 5).unwrap();
/// assert_eq!(thresholds.len(), 5);
/// assert!((thresholds[2] - 0.5).abs() < 1e-12);
/// ```
pub fn generate_threshold_range(start: f64, end: f64, steps: usize) -> Result<Vec<f64>> {
    if steps == 0 {
        return Err(CompareError::InvalidThreshold(
            "Number of steps must be greater than 0".to_string(),
        ));
    }

    validate_threshold(start)?;
    validate_threshold(end)?;

    if start > end {
        return Err(CompareError::InvalidThreshold(format!(
            "Start threshold ({}) must be <= end threshold ({})",
            start, end
        )));
    }

    if steps == 1 {
        return Ok(vec![start]);
    }

    let step_size = (end - start) / (steps - 1) as f64;
    Ok((0..steps)
        .map(|i| if i == steps - 1 { end } else { start + step_size * i as f64 })
        .collect())
}
