//! Comparison table rows for one image.
//!
//! Matched pairs produce one row per shared attribute; single boxes produce
//! one row holding their attribute summary. Nothing here renders.

use crate::evaluator::ImageComparison;
use crate::matching::BoxItem;
use crate::reconcile::MatchedPair;
use crate::stats::compare_attributes;
use crate::types::Annotator;
use serde::Serialize;

/// Which part of a comparison to show.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TableView {
    /// Every matched pair and every unmatched box.
    #[default]
    All,
    /// Matched pairs only, optionally restricted to one group id.
    Group(Option<u32>),
    /// Pairs whose two box ids are both selected, plus the selected boxes no
    /// shown pair covers. An empty selection shows nothing.
    BoxIds(Vec<String>),
    /// Unmatched boxes, restricted to the given ids when not empty.
    Unmatched(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    /// `None` for rows describing a single box.
    pub group: Option<u32>,
    pub tag: String,
    /// Attribute name for pair rows, attribute summary for single boxes.
    pub dimension: String,
    pub annotator1: String,
    pub annotator2: String,
    pub iou: Option<f64>,
    /// Pair rows whose two values disagree.
    pub differs: bool,
}

impl TableRow {
    fn single(annotator: Annotator, tag: &str, summary: String) -> Self {
        let owner = annotator.to_string();
        let (annotator1, annotator2) = match annotator {
            Annotator::First => (owner, String::new()),
            Annotator::Second => (String::new(), owner),
        };
        Self {
            group: None,
            tag: tag.to_string(),
            dimension: summary,
            annotator1,
            annotator2,
            iou: None,
            differs: false,
        }
    }

    fn from_item(item: &BoxItem<'_>) -> Self {
        Self::single(item.annotator, item.display_tag(), item.region.attribute_summary())
    }
}

fn push_pair_rows(rows: &mut Vec<TableRow>, pair: &MatchedPair<'_>) {
    for cmp in compare_attributes(pair.region1, pair.region2) {
        rows.push(TableRow {
            group: Some(pair.group_id),
            tag: pair.tag.clone(),
            dimension: cmp.name,
            annotator1: cmp.value1,
            annotator2: cmp.value2,
            iou: Some(pair.iou),
            differs: !cmp.matched,
        });
    }
}

/// Build the table rows of `comparison` selected by `view`.
pub fn build_table(comparison: &ImageComparison<'_>, view: &TableView) -> Vec<TableRow> {
    let reconciliation = &comparison.reconciliation;
    let mut rows = Vec::new();

    match view {
        TableView::All => {
            for pair in &reconciliation.matched {
                push_pair_rows(&mut rows, pair);
            }
            for unmatched in reconciliation.unmatched() {
                rows.push(TableRow::single(
                    unmatched.annotator,
                    &unmatched.tag,
                    unmatched.region.attribute_summary(),
                ));
            }
        }
        TableView::Group(group) => {
            for pair in &reconciliation.matched {
                if group.map_or(true, |g| g == pair.group_id) {
                    push_pair_rows(&mut rows, pair);
                }
            }
        }
        TableView::BoxIds(ids) => {
            let selected = |id: &str| ids.iter().any(|s| s == id);
            let mut covered: Vec<&str> = Vec::new();
            for pair in &reconciliation.matched {
                if selected(pair.box_id1.as_str()) && selected(pair.box_id2.as_str()) {
                    push_pair_rows(&mut rows, pair);
                    covered.push(pair.box_id1.as_str());
                    covered.push(pair.box_id2.as_str());
                }
            }

            let mut shown: Vec<&str> = Vec::new();
            for id in ids {
                if covered.contains(&id.as_str()) || shown.contains(&id.as_str()) {
                    continue;
                }
                shown.push(id.as_str());
                let item = comparison
                    .boxes1
                    .iter()
                    .chain(comparison.boxes2.iter())
                    .find(|item| &item.box_id == id);
                if let Some(item) = item {
                    rows.push(TableRow::from_item(item));
                }
            }
        }
        TableView::Unmatched(ids) => {
            for unmatched in reconciliation.unmatched() {
                if ids.is_empty() || ids.contains(&unmatched.box_id) {
                    rows.push(TableRow::single(
                        unmatched.annotator,
                        &unmatched.tag,
                        unmatched.region.attribute_summary(),
                    ));
                }
            }
        }
    }

    rows
}
