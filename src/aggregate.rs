//! Dataset-level agreement statistics.
//!
//! [`AggregateStats`] is an accumulator: per-image [`StatsRecord`]s are folded
//! in with [`AggregateStats::absorb`] and the rates are recomputed from the
//! summed counts by [`AggregateStats::finish`]. Rates are never averaged
//! across images.

use crate::metrics::agreement::{mean, primary_matching_rate, ratio};
use crate::stats::{OptionStat, StatsRecord, TagConfusion, ValueConfusion};
use crate::types::{AnnotationLog, Annotator};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregateStats {
    /// Image pairs compared
    pub total_pairs: usize,
    /// Images present in only one file that were counted
    pub one_sided_images: usize,
    pub total_boxes_annotator1: usize,
    pub total_boxes_annotator2: usize,
    pub matched_pairs: usize,
    pub confused_pairs: usize,
    pub unmatched_annotator1: usize,
    pub unmatched_annotator2: usize,
    pub iou_sum: f64,
    pub iou_count: usize,
    pub average_iou: f64,
    pub primary_matching_rate: f64,
    pub primary_confusion: TagConfusion,
    pub attribute_comparisons: usize,
    pub attribute_matches: usize,
    pub tertiary_matching_rate: f64,
    pub tertiary_confusion: ValueConfusion,
    pub option_stats: BTreeMap<String, OptionStat>,
}

impl AggregateStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one compared image pair.
    pub fn absorb(&mut self, record: &StatsRecord) {
        self.total_pairs += 1;
        self.total_boxes_annotator1 += record.total_boxes_annotator1;
        self.total_boxes_annotator2 += record.total_boxes_annotator2;
        self.matched_pairs += record.matched_pairs;
        self.confused_pairs += record.confused_pairs;
        self.unmatched_annotator1 += record.unmatched_annotator1;
        self.unmatched_annotator2 += record.unmatched_annotator2;
        self.iou_sum += record.iou_sum;
        self.iou_count += record.matched_pairs;
        self.attribute_comparisons += record.attribute_comparisons;
        self.attribute_matches += record.attribute_matches;
        self.primary_confusion.merge(&record.primary_confusion);
        self.tertiary_confusion.merge(&record.tertiary_confusion);
        for (name, stat) in &record.option_stats {
            self.option_stats.entry(name.clone()).or_default().merge(stat);
        }
    }

    /// Add an image annotated by only one side; all of its boxes are unmatched.
    pub fn absorb_one_sided(&mut self, log: &AnnotationLog, annotator: Annotator) {
        let boxes = log.box_count();
        self.one_sided_images += 1;
        match annotator {
            Annotator::First => {
                self.total_boxes_annotator1 += boxes;
                self.unmatched_annotator1 += boxes;
            }
            Annotator::Second => {
                self.total_boxes_annotator2 += boxes;
                self.unmatched_annotator2 += boxes;
            }
        }
    }

    /// Recompute the rates from the accumulated totals.
    pub fn finish(&mut self) {
        self.average_iou = mean(self.iou_sum, self.iou_count);
        self.primary_matching_rate = primary_matching_rate(
            self.matched_pairs,
            self.total_boxes_annotator1,
            self.total_boxes_annotator2,
        );
        self.tertiary_matching_rate = ratio(self.attribute_matches, self.attribute_comparisons);
    }

    /// Multi-line report of the headline figures and the top confusions.
    pub fn summary_string(&self) -> String {
        let mut out = format!(
            "Image pairs:            {}\n\
             One-sided images:       {}\n\
             Boxes (A1 / A2):        {} / {}\n\
             Matched pairs:          {}\n\
             Confused pairs:         {}\n\
             Unmatched (A1 / A2):    {} / {}\n\
             Average IoU:            {:.4}\n\
             Primary matching rate:  {:.4}\n\
             Tertiary matching rate: {:.4} ({} / {})\n",
            self.total_pairs,
            self.one_sided_images,
            self.total_boxes_annotator1,
            self.total_boxes_annotator2,
            self.matched_pairs,
            self.confused_pairs,
            self.unmatched_annotator1,
            self.unmatched_annotator2,
            self.average_iou,
            self.primary_matching_rate,
            self.tertiary_matching_rate,
            self.attribute_matches,
            self.attribute_comparisons,
        );

        if !self.primary_confusion.is_empty() {
            out.push_str("Primary confusion:\n");
            for ((tag1, tag2), count) in self.primary_confusion.sorted() {
                out.push_str(&format!("  {} -> {}: {}\n", tag1, tag2, count));
            }
        }
        if !self.tertiary_confusion.is_empty() {
            out.push_str("Attribute confusion:\n");
            for ((name, value1, value2), count) in self.tertiary_confusion.sorted() {
                out.push_str(&format!("  {}: {} -> {}: {}\n", name, value1, value2, count));
            }
        }
        if !self.option_stats.is_empty() {
            out.push_str("Per-attribute agreement:\n");
            for (name, stat) in &self.option_stats {
                out.push_str(&format!(
                    "  {}: {:.4} ({} / {})\n",
                    name,
                    stat.rate(),
                    stat.matched,
                    stat.total
                ));
            }
        }
        out
    }
}
