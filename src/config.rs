//! Comparison options exposed to callers.

use crate::error::Result;
use crate::reconcile::MatchPolicy;
use crate::threshold::{validate_threshold, DEFAULT_IOU_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parameters of a comparison run.
///
/// Missing keys in a serialized options file fall back to the defaults:
///
/// ```
/// use anno_compare::config::CompareOptions;
/// use anno_compare::reconcile::MatchPolicy;
///
/// let options = CompareOptions::from_json(r#"{"iou_threshold": 0.5}"#).unwrap();
/// assert_eq!(options.iou_threshold, 0.5);
/// assert!(options.only_shared_images);
/// assert_eq!(options.policy, MatchPolicy::Greedy);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareOptions {
    /// Minimum IoU for two boxes to be considered a geometric match.
    pub iou_threshold: f64,
    /// Restrict aggregate statistics to images annotated in both files.
    pub only_shared_images: bool,
    /// How tag-compatible geometric matches are accepted.
    pub policy: MatchPolicy,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            only_shared_images: true,
            policy: MatchPolicy::default(),
        }
    }
}

impl CompareOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(mut self, iou_threshold: f64) -> Self {
        self.iou_threshold = iou_threshold;
        self
    }

    pub fn with_only_shared_images(mut self, only_shared_images: bool) -> Self {
        self.only_shared_images = only_shared_images;
        self
    }

    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Check that the options describe a runnable comparison.
    pub fn validate(&self) -> Result<()> {
        validate_threshold(self.iou_threshold)
    }

    /// Parse and validate options from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Read and validate options from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
