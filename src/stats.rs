//! Per-image agreement statistics
//!
//! This module turns one image's reconciliation into counts, rates and
//! confusion tables. The same building blocks ([`ConfusionTable`],
//! [`OptionStat`]) are summed across images by the aggregate statistics.

use crate::metrics::agreement::{mean, primary_matching_rate, ratio};
use crate::matching::BoxItem;
use crate::reconcile::{normalize_tag, Reconciliation};
use crate::types::Region;
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Frequency table of disagreement patterns
///
/// Entries are reported by descending count; equal counts are ordered by key
/// so output is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionTable<K: Ord> {
    counts: BTreeMap<K, usize>,
}

impl<K: Ord> Default for ConfusionTable<K> {
    fn default() -> Self {
        Self {
            counts: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone> ConfusionTable<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence of `key`
    pub fn add(&mut self, key: K) {
        self.add_count(key, 1);
    }

    /// Record `count` occurrences of `key`
    pub fn add_count(&mut self, key: K, count: usize) {
        if count > 0 {
            *self.counts.entry(key).or_insert(0) += count;
        }
    }

    /// Add every count of `other` into this table
    pub fn merge(&mut self, other: &ConfusionTable<K>) {
        for (key, &count) in &other.counts {
            self.add_count(key.clone(), count);
        }
    }

    /// Occurrences of `key`, `0` when never seen
    pub fn get(&self, key: &K) -> usize {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Entries sorted by descending count
    pub fn sorted(&self) -> Vec<(K, usize)> {
        let mut entries: Vec<(K, usize)> = self
            .counts
            .iter()
            .map(|(key, &count)| (key.clone(), count))
            .collect();
        // BTreeMap iteration is already key-ordered and the sort is stable.
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }
}

impl<K: Ord + Clone + Serialize> Serialize for ConfusionTable<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Entry<'k, K>(&'k K, usize);

        impl<K: Serialize> Serialize for Entry<'_, K> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut state = serializer.serialize_struct("Entry", 2)?;
                state.serialize_field("key", self.0)?;
                state.serialize_field("count", &self.1)?;
                state.end()
            }
        }

        let entries = self.sorted();
        serializer.collect_seq(entries.iter().map(|(key, count)| Entry(key, *count)))
    }
}

/// `(annotator 1 tag, annotator 2 tag)`, both normalized
pub type TagConfusion = ConfusionTable<(String, String)>;

/// `(attribute name, annotator 1 value, annotator 2 value)`
pub type ValueConfusion = ConfusionTable<(String, String, String)>;

/// Agreement counts for one attribute dimension
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionStat {
    pub matched: usize,
    pub total: usize,
}

impl OptionStat {
    /// Share of comparisons that agreed
    pub fn rate(&self) -> f64 {
        ratio(self.matched, self.total)
    }

    pub fn merge(&mut self, other: &OptionStat) {
        self.matched += other.matched;
        self.total += other.total;
    }
}

/// Outcome of comparing one shared attribute of a matched pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeComparison {
    pub name: String,
    pub value1: String,
    pub value2: String,
    pub matched: bool,
}

fn canonical_attributes(region: &Region) -> BTreeMap<&str, String> {
    let mut dims = BTreeMap::new();
    for attr in &region.attributes {
        if !attr.name.is_empty() {
            dims.insert(attr.name.as_str(), attr.canonical_value());
        }
    }
    dims
}

/// Compare the attributes both regions carry
///
/// Only names present on both sides are compared. Values are compared as
/// their comma-joined canonical string, so order and duplicates matter.
/// Results are ordered by attribute name.
pub fn compare_attributes(region1: &Region, region2: &Region) -> Vec<AttributeComparison> {
    let dims1 = canonical_attributes(region1);
    let dims2 = canonical_attributes(region2);

    dims1
        .iter()
        .filter_map(|(name, value1)| {
            dims2.get(name).map(|value2| AttributeComparison {
                name: name.to_string(),
                value1: value1.clone(),
                value2: value2.clone(),
                matched: value1 == value2,
            })
        })
        .collect()
}

/// Agreement statistics for one image compared between two annotators
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatsRecord {
    /// Regions with a box drawn by annotator 1
    pub total_boxes_annotator1: usize,
    /// Regions with a box drawn by annotator 2
    pub total_boxes_annotator2: usize,
    pub matched_pairs: usize,
    pub confused_pairs: usize,
    pub unmatched_annotator1: usize,
    pub unmatched_annotator2: usize,
    /// Sum of IoU over matched pairs
    pub iou_sum: f64,
    pub average_iou: f64,
    pub primary_matching_rate: f64,
    pub primary_confusion: TagConfusion,
    /// Shared-attribute comparisons made over matched pairs
    pub attribute_comparisons: usize,
    pub attribute_matches: usize,
    pub tertiary_matching_rate: f64,
    pub tertiary_confusion: ValueConfusion,
    pub option_stats: BTreeMap<String, OptionStat>,
}

impl StatsRecord {
    /// One-line summary of the headline figures
    pub fn summary_string(&self) -> String {
        format!(
            "StatsRecord {{ boxes: {}/{}, matched: {}, confused: {}, avg_iou: {:.4}, primary: {:.4}, tertiary: {:.4} }}",
            self.total_boxes_annotator1,
            self.total_boxes_annotator2,
            self.matched_pairs,
            self.confused_pairs,
            self.average_iou,
            self.primary_matching_rate,
            self.tertiary_matching_rate
        )
    }
}

/// Compute the statistics of one image comparison
///
/// `boxes1` and `boxes2` are the boxes the reconciliation was built from.
pub fn compute_statistics(
    boxes1: &[BoxItem<'_>],
    boxes2: &[BoxItem<'_>],
    reconciliation: &Reconciliation<'_>,
) -> StatsRecord {
    let total1 = boxes1.len();
    let total2 = boxes2.len();
    let matched = &reconciliation.matched;

    let iou_sum: f64 = matched.iter().map(|pair| pair.iou).sum();

    let mut primary_confusion = TagConfusion::new();
    for pair in &reconciliation.confused {
        primary_confusion.add((
            normalize_tag(Some(&pair.tag1)),
            normalize_tag(Some(&pair.tag2)),
        ));
    }

    let mut tertiary_confusion = ValueConfusion::new();
    let mut option_stats: BTreeMap<String, OptionStat> = BTreeMap::new();
    let mut comparisons = 0;
    let mut matches = 0;

    for pair in matched {
        for cmp in compare_attributes(pair.region1, pair.region2) {
            comparisons += 1;
            let stat = option_stats.entry(cmp.name.clone()).or_default();
            stat.total += 1;
            if cmp.matched {
                matches += 1;
                stat.matched += 1;
            } else {
                tertiary_confusion.add((cmp.name, cmp.value1, cmp.value2));
            }
        }
    }

    StatsRecord {
        total_boxes_annotator1: total1,
        total_boxes_annotator2: total2,
        matched_pairs: matched.len(),
        confused_pairs: reconciliation.confused.len(),
        unmatched_annotator1: reconciliation.unmatched1.len(),
        unmatched_annotator2: reconciliation.unmatched2.len(),
        iou_sum,
        average_iou: mean(iou_sum, matched.len()),
        primary_matching_rate: primary_matching_rate(matched.len(), total1, total2),
        primary_confusion,
        attribute_comparisons: comparisons,
        attribute_matches: matches,
        tertiary_matching_rate: ratio(matches, comparisons),
        tertiary_confusion,
        option_stats,
    }
}
