//! # anno-compare
//!
//! A Rust library for measuring agreement between two annotators who drew
//! tagged bounding boxes with attribute values on the same images.
//!
//! This library provides:
//! - **Parsing** of exported annotation logs (JSON with an embedded `labels` string)
//! - **IoU matching** of every cross pair of boxes above a threshold
//! - **Reconciliation** of geometric matches against tags, ignoring digit suffixes
//! - **Per-image statistics**: matched/confused/unmatched counts, mean IoU,
//!   primary (tag) and tertiary (attribute) matching rates, confusion tables
//! - **Aggregate statistics** over every image both files annotate
//! - **Primary-label consistency** of logs joined by id
//! - Comparison tables and Polars DataFrames for presentation layers
//!
//! ## Quick Start
//!
//! ```rust
//! use anno_compare::config::CompareOptions;
//! use anno_compare::evaluator::aggregate;
//! use anno_compare::loader::load_from_str;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // In actual use: load_from_file("annotator1.txt")?
//! let logs1 = load_from_str("[]")?;
//! let logs2 = load_from_str("[]")?;
//!
//! let stats = aggregate(&logs1, &logs2, &CompareOptions::default())?;
//! println!("Primary matching rate: {:.4}", stats.primary_matching_rate);
//! println!("Tertiary matching rate: {:.4}", stats.tertiary_matching_rate);
//! # Ok(())
//! # }
//! ```
//!
//! ## Input Format
//!
//! Each annotator's file is a JSON array of logs:
//!
//! ```json
//! [
//!   {
//!     "id": "1024",
//!     "isInvalid": false,
//!     "pictureList": [{"id": 1, "url": "https://host/img/1024.jpg"}],
//!     "labels": "[{\"tag\": {\"name\": \"sleeve2\"}, \"points\": [{\"x\": 10, \"y\": 20}, {\"x\": 60, \"y\": 90}], \"dimensionList\": [{\"name\": \"color\", \"dimensionValueList\": [{\"name\": \"red\"}]}]}]"
//!   }
//! ]
//! ```

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod frames;
pub mod loader;
pub mod matching;
pub mod metrics;
pub mod parser;
pub mod primary;
pub mod reconcile;
pub mod sink;
pub mod stats;
pub mod table;
pub mod threshold;
pub mod types;

// Re-export commonly used types and functions
pub use aggregate::AggregateStats;
pub use config::CompareOptions;
pub use error::{CompareError, Result};
pub use evaluator::{aggregate, compare_logs, evaluate_at_thresholds, pair_logs, ImageComparison};
pub use loader::{load_from_file, load_from_str};
pub use reconcile::{normalize_tag, MatchPolicy};
pub use stats::StatsRecord;
pub use threshold::generate_threshold_range;
pub use types::{AnnotationLog, Annotator, Attribute, BoundingBox, Picture, Region};
