//! Error handling and validation tests.

use anno_compare::config::CompareOptions;
use anno_compare::error::CompareError;
use anno_compare::evaluator::{aggregate, evaluate_at_thresholds, find_pair, pair_logs};
use anno_compare::frames::validate_columns;
use anno_compare::loader::{load_from_file, load_from_str};
use anno_compare::matching::{collect_boxes, match_boxes};
use anno_compare::threshold::{generate_threshold_range, validate_threshold};
use anno_compare::types::Annotator;

// ============================================================================
// LOADER ERROR TESTS
// ============================================================================

#[test]
fn test_invalid_json() {
    let result = load_from_str("[{ invalid json");
    assert!(matches!(result, Err(CompareError::JsonError(_))));
}

#[test]
fn test_top_level_must_be_array() {
    let result = load_from_str(r#"{"id": "1"}"#);
    assert!(result.is_err(), "A single object is not a result file");
}

#[test]
fn test_non_object_element() {
    let result = load_from_str(r#"[{"id": "1"}, 42]"#);
    assert!(result.is_err(), "Every element must be a log object");
}

#[test]
fn test_undecodable_labels_names_log() {
    let json = r#"[
        {"id": "1", "labels": "[]"},
        {"id": 77, "labels": "[{\"tag\": "}
    ]"#;

    match load_from_str(json) {
        Err(CompareError::InvalidLabels { log_id, .. }) => assert_eq!(log_id, "77"),
        other => panic!("Expected InvalidLabels error, got {:?}", other),
    }
}

#[test]
fn test_labels_must_be_a_list() {
    let json = r#"[{"id": "3", "labels": "{\"tag\": {\"name\": \"a\"}}"}]"#;
    assert!(matches!(
        load_from_str(json),
        Err(CompareError::InvalidLabels { .. })
    ));
}

#[test]
fn test_malformed_point_is_an_error() {
    let json = r#"[{"id": "3", "labels": "[{\"points\": [{\"x\": \"left\", \"y\": 0}]}]"}]"#;
    assert!(load_from_str(json).is_err());
}

#[test]
fn test_missing_file() {
    let result = load_from_file("/nonexistent/annotator1.txt");
    assert!(matches!(result, Err(CompareError::IoError(_))));
}

#[test]
fn test_error_messages_are_descriptive() {
    let err = load_from_str(r#"[{"id": "9", "labels": "nope"}]"#).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Invalid labels in log 9"), "got: {}", message);
}

// ============================================================================
// THRESHOLD ERROR TESTS
// ============================================================================

#[test]
fn test_threshold_out_of_range() {
    assert!(matches!(
        validate_threshold(1.01),
        Err(CompareError::InvalidThreshold(_))
    ));
    assert!(validate_threshold(-0.5).is_err());
    assert!(validate_threshold(f64::NAN).is_err());
}

#[test]
fn test_match_boxes_rejects_bad_threshold() {
    let logs = load_from_str(r#"[{"id": "1"}]"#).unwrap();
    let boxes = collect_boxes(&logs[0], Annotator::First);
    assert!(match_boxes(&boxes, &boxes, 2.0).is_err());
}

#[test]
fn test_aggregate_rejects_bad_options() {
    let options = CompareOptions::default().with_threshold(-0.1);
    let result = aggregate(&[], &[], &options);
    assert!(matches!(result, Err(CompareError::InvalidThreshold(_))));
}

#[test]
fn test_sweep_rejects_bad_threshold() {
    let result = evaluate_at_thresholds(&[], &[], &CompareOptions::default(), &[0.5, 1.5]);
    assert!(result.is_err());
}

#[test]
fn test_threshold_range_errors() {
    assert!(generate_threshold_range(0.0, 1.0, 0).is_err());
    assert!(generate_threshold_range(0.9, 0.1, 5).is_err());
    assert!(generate_threshold_range(0.0, 1.5, 5).is_err());
}

// ============================================================================
// CONFIG ERROR TESTS
// ============================================================================

#[test]
fn test_options_unknown_policy() {
    let result = CompareOptions::from_json(r#"{"policy": "best_effort"}"#);
    assert!(matches!(result, Err(CompareError::JsonError(_))));
}

#[test]
fn test_options_bad_threshold() {
    let result = CompareOptions::from_json(r#"{"iou_threshold": 3}"#);
    assert!(matches!(result, Err(CompareError::InvalidThreshold(_))));
}

#[test]
fn test_options_missing_file() {
    assert!(CompareOptions::from_file("/nonexistent/options.json").is_err());
}

// ============================================================================
// LOOKUP AND DATAFRAME ERRORS
// ============================================================================

#[test]
fn test_unknown_pair_key() {
    let logs = load_from_str(r#"[{"id": "1", "pictureList": [{"url": "a/b.jpg"}]}]"#).unwrap();
    let pairs = pair_logs(&logs, &logs);
    assert_eq!(pairs.len(), 1);

    match find_pair(&pairs, "1_1_c.jpg") {
        Err(CompareError::PairNotFound(key)) => assert_eq!(key, "1_1_c.jpg"),
        other => panic!("Expected PairNotFound, got {:?}", other.map(|p| p.key.clone())),
    }
}

#[test]
fn test_missing_dataframe_column() {
    use polars::prelude::*;

    let df = df! { "tag" => &["a"] }.unwrap();
    assert!(matches!(
        validate_columns(&df, &["tag", "count"]),
        Err(CompareError::MissingColumn(_))
    ));
}
