//! Comparison orchestrator: per-image comparison and dataset aggregation.

use crate::aggregate::AggregateStats;
use crate::config::CompareOptions;
use crate::error::{CompareError, Result};
use crate::matching::{collect_boxes, iou_matrix, match_boxes, BoxItem, RawMatch};
use crate::reconcile::{reconcile, Reconciliation};
use crate::stats::{compute_statistics, StatsRecord};
use crate::types::{AnnotationLog, Annotator};
use serde::Serialize;
use std::collections::HashSet;

/// Everything computed for one image annotated by both sides.
#[derive(Debug, Clone, Serialize)]
pub struct ImageComparison<'a> {
    #[serde(skip)]
    pub log1: &'a AnnotationLog,
    #[serde(skip)]
    pub log2: &'a AnnotationLog,
    pub boxes1: Vec<BoxItem<'a>>,
    pub boxes2: Vec<BoxItem<'a>>,
    pub raw_matches: Vec<RawMatch>,
    pub reconciliation: Reconciliation<'a>,
    pub stats: StatsRecord,
}

impl ImageComparison<'_> {
    /// IoU of every annotator 1 box against every annotator 2 box.
    pub fn iou_matrix(&self) -> Vec<Vec<f64>> {
        iou_matrix(&self.boxes1, &self.boxes2)
    }

    /// Every box id of both annotators, annotator 1 first.
    pub fn box_ids(&self) -> Vec<&str> {
        self.boxes1
            .iter()
            .chain(self.boxes2.iter())
            .map(|item| item.box_id.as_str())
            .collect()
    }
}

/// Two logs that annotate the same image.
#[derive(Debug, Clone)]
pub struct LogPair<'a> {
    /// `"{id1}_{id2}_{image file name}"`
    pub key: String,
    pub log1: &'a AnnotationLog,
    pub log2: &'a AnnotationLog,
}

/// Compare two logs of the same image.
///
/// Runs box collection, IoU matching, tag reconciliation and per-image
/// statistics with the given options.
///
/// # Errors
///
/// Returns an error if the IoU threshold is invalid or the one-to-one
/// assignment fails.
pub fn compare_logs<'a>(
    log1: &'a AnnotationLog,
    log2: &'a AnnotationLog,
    options: &CompareOptions,
) -> Result<ImageComparison<'a>> {
    let boxes1 = collect_boxes(log1, Annotator::First);
    let boxes2 = collect_boxes(log2, Annotator::Second);
    let raw_matches = match_boxes(&boxes1, &boxes2, options.iou_threshold)?;
    let reconciliation = reconcile(&boxes1, &boxes2, &raw_matches, options.policy)?;
    let stats = compute_statistics(&boxes1, &boxes2, &reconciliation);

    log::debug!(
        "Compared log {} with log {}: {} raw matches, {} accepted, {} confused",
        log1.id,
        log2.id,
        raw_matches.len(),
        stats.matched_pairs,
        stats.confused_pairs
    );

    Ok(ImageComparison {
        log1,
        log2,
        boxes1,
        boxes2,
        raw_matches,
        reconciliation,
        stats,
    })
}

/// Url used to pair a log: the first picture's url, `""` when that picture
/// has none. Logs without pictures have no image and never pair.
fn image_url(log: &AnnotationLog) -> Option<&str> {
    log.pictures
        .first()
        .map(|picture| picture.url.as_deref().unwrap_or(""))
}

fn image_file_name(url: &str) -> &str {
    if url.is_empty() {
        "unknown"
    } else {
        url.rsplit('/').next().unwrap_or(url)
    }
}

/// Pair every log of `logs1` with every log of `logs2` annotating the same url.
///
/// Duplicated urls produce every cross combination. Pairs are sorted by key.
///
/// Keys are not guaranteed unique: ids containing `_` can spell the same key
/// for two different pairs (`"1_2"`/`"3"` and `"1"`/`"2_3"`). Such keys are
/// logged and [`find_pair`] refuses them.
pub fn pair_logs<'a>(logs1: &'a [AnnotationLog], logs2: &'a [AnnotationLog]) -> Vec<LogPair<'a>> {
    let mut pairs = Vec::new();
    for log1 in logs1 {
        let Some(url1) = image_url(log1) else {
            continue;
        };
        for log2 in logs2 {
            if image_url(log2) == Some(url1) {
                pairs.push(LogPair {
                    key: format!("{}_{}_{}", log1.id, log2.id, image_file_name(url1)),
                    log1,
                    log2,
                });
            }
        }
    }
    pairs.sort_by(|a, b| a.key.cmp(&b.key));
    for window in pairs.windows(2) {
        if window[0].key == window[1].key {
            log::warn!("Pair key {} is shared by several image pairs", window[0].key);
        }
    }
    pairs
}

/// Look up a pair by key.
///
/// # Errors
///
/// Returns [`CompareError::PairNotFound`] if no pair has this key and
/// [`CompareError::AmbiguousPair`] if more than one does.
pub fn find_pair<'p, 'a>(pairs: &'p [LogPair<'a>], key: &str) -> Result<&'p LogPair<'a>> {
    let mut found = pairs.iter().filter(|pair| pair.key == key);
    let first = found
        .next()
        .ok_or_else(|| CompareError::PairNotFound(key.to_string()))?;
    let others = found.count();
    if others > 0 {
        return Err(CompareError::AmbiguousPair {
            key: key.to_string(),
            count: others + 1,
        });
    }
    Ok(first)
}

/// Aggregate agreement statistics over every image shared by both files.
///
/// With `only_shared_images` disabled, images annotated in only one file are
/// also counted: their boxes add to the totals and to the unmatched counts.
///
/// # Errors
///
/// Returns an error if the options are invalid or a comparison fails.
pub fn aggregate(
    logs1: &[AnnotationLog],
    logs2: &[AnnotationLog],
    options: &CompareOptions,
) -> Result<AggregateStats> {
    options.validate()?;

    let pairs = pair_logs(logs1, logs2);
    if pairs.is_empty() {
        log::warn!("No image is annotated in both files");
    }

    let mut stats = AggregateStats::new();
    for pair in &pairs {
        let comparison = compare_logs(pair.log1, pair.log2, options)?;
        stats.absorb(&comparison.stats);
    }

    if !options.only_shared_images {
        let urls1: HashSet<&str> = logs1.iter().filter_map(image_url).collect();
        let urls2: HashSet<&str> = logs2.iter().filter_map(image_url).collect();

        for log in logs1 {
            if image_url(log).is_some_and(|url| !urls2.contains(url)) {
                stats.absorb_one_sided(log, Annotator::First);
            }
        }
        for log in logs2 {
            if image_url(log).is_some_and(|url| !urls1.contains(url)) {
                stats.absorb_one_sided(log, Annotator::Second);
            }
        }
    }

    stats.finish();

    log::info!(
        "Aggregated {} image pairs ({} one-sided) at IoU {}: primary rate {:.4}, tertiary rate {:.4}",
        stats.total_pairs,
        stats.one_sided_images,
        options.iou_threshold,
        stats.primary_matching_rate,
        stats.tertiary_matching_rate
    );

    Ok(stats)
}

/// Aggregate statistics at each of the given IoU thresholds.
///
/// Every other option is taken from `options`.
pub fn evaluate_at_thresholds(
    logs1: &[AnnotationLog],
    logs2: &[AnnotationLog],
    options: &CompareOptions,
    thresholds: &[f64],
) -> Result<Vec<(f64, AggregateStats)>> {
    thresholds
        .iter()
        .map(|&threshold| {
            let options = options.clone().with_threshold(threshold);
            aggregate(logs1, logs2, &options).map(|stats| (threshold, stats))
        })
        .collect()
}
