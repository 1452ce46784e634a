//! Primary-label consistency between two result files.
//!
//! Unlike the box comparison, logs are joined by id and only the set of
//! normalized tags of each log is compared.

use crate::metrics::agreement::percentage;
use crate::reconcile::normalize_tag;
use crate::types::AnnotationLog;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

/// One log id and both annotators' primary answers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrimaryRow {
    pub id: String,
    /// Url result of annotator 2's log, or annotator 1's when 2 is missing.
    pub url: String,
    /// `None` when the log is missing from the first file.
    pub answer1: Option<String>,
    /// `None` when the log is missing from the second file.
    pub answer2: Option<String>,
    pub consistent: bool,
}

impl PrimaryRow {
    /// Both answers present and not blank.
    pub fn is_valid(&self) -> bool {
        let present = |answer: &Option<String>| {
            answer.as_deref().is_some_and(|a| !a.trim().is_empty())
        };
        present(&self.answer1) && present(&self.answer2)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PrimaryStats {
    pub total_overall: usize,
    pub match_overall: usize,
    /// Percent, `0` when there are no rows.
    pub consistency_overall: f64,
    pub total_valid: usize,
    pub match_valid: usize,
    pub consistency_valid: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PrimaryComparison {
    pub rows: Vec<PrimaryRow>,
    pub stats: PrimaryStats,
}

impl PrimaryComparison {
    /// Rows counted by the valid-only statistics.
    pub fn valid_rows(&self) -> impl Iterator<Item = &PrimaryRow> {
        self.rows.iter().filter(|row| row.is_valid())
    }
}

/// Sorted, de-duplicated, comma-joined normalized tags of every region.
///
/// ```
/// use anno_compare::primary::primary_result;
/// use anno_compare::types::{AnnotationLog, Region};
///
/// let region = |tag: &str| Region {
///     tag: Some(tag.to_string()),
///     bbox: None,
///     attributes: vec![],
///     additional_annotation: None,
/// };
/// let log = AnnotationLog {
///     id: "1".to_string(),
///     is_invalid: false,
///     pictures: vec![],
///     regions: vec![region("sleeve2"), region("collar"), region("sleeve1")],
/// };
/// assert_eq!(primary_result(&log), "collar,sleeve");
/// ```
pub fn primary_result(log: &AnnotationLog) -> String {
    let tags: BTreeSet<String> = log
        .regions
        .iter()
        .map(|region| normalize_tag(region.tag.as_deref()))
        .collect();
    tags.into_iter().collect::<Vec<_>>().join(",")
}

/// Sorted, de-duplicated, comma-joined non-empty picture urls.
pub fn url_result(log: &AnnotationLog) -> String {
    let urls: BTreeSet<&str> = log
        .pictures
        .iter()
        .filter_map(|picture| picture.url.as_deref())
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .collect();
    urls.into_iter().collect::<Vec<_>>().join(",")
}

/// Numeric ids first in numeric order, then the rest lexicographically.
///
/// Numerically equal ids spelled differently (`"1"`, `"01"`) are distinct
/// and ordered by their text, so the order is total.
fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Compare primary labels of logs joined by id.
///
/// A later log with an already seen id replaces the earlier one.
pub fn compare_primary_labels(
    logs1: &[AnnotationLog],
    logs2: &[AnnotationLog],
) -> PrimaryComparison {
    let by_id1: HashMap<&str, &AnnotationLog> =
        logs1.iter().map(|log| (log.id.as_str(), log)).collect();
    let by_id2: HashMap<&str, &AnnotationLog> =
        logs2.iter().map(|log| (log.id.as_str(), log)).collect();

    let distinct: BTreeSet<&str> = by_id1.keys().chain(by_id2.keys()).copied().collect();
    let mut ids: Vec<&str> = distinct.into_iter().collect();
    ids.sort_by(|a, b| compare_ids(a, b));

    let rows: Vec<PrimaryRow> = ids
        .into_iter()
        .map(|id| {
            let log1 = by_id1.get(id).copied();
            let log2 = by_id2.get(id).copied();
            let answer1 = log1.map(primary_result);
            let answer2 = log2.map(primary_result);
            PrimaryRow {
                id: id.to_string(),
                url: log2.or(log1).map(url_result).unwrap_or_default(),
                consistent: answer1 == answer2,
                answer1,
                answer2,
            }
        })
        .collect();

    let total_overall = rows.len();
    let match_overall = rows.iter().filter(|row| row.consistent).count();
    let total_valid = rows.iter().filter(|row| row.is_valid()).count();
    let match_valid = rows
        .iter()
        .filter(|row| row.is_valid() && row.consistent)
        .count();

    let stats = PrimaryStats {
        total_overall,
        match_overall,
        consistency_overall: percentage(match_overall, total_overall),
        total_valid,
        match_valid,
        consistency_valid: percentage(match_valid, total_valid),
    };

    log::info!(
        "Primary labels: {}/{} consistent ({:.2}%), {}/{} valid rows consistent ({:.2}%)",
        match_overall,
        total_overall,
        stats.consistency_overall,
        match_valid,
        total_valid,
        stats.consistency_valid
    );

    PrimaryComparison { rows, stats }
}
