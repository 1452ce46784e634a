//! Polars DataFrames for comparison results
//!
//! This module converts table rows, confusion tables, per-attribute agreement
//! and threshold sweeps into DataFrames, validates their shape, and writes
//! them as CSV.

use crate::aggregate::AggregateStats;
use crate::error::{CompareError, Result};
use crate::primary::PrimaryComparison;
use crate::stats::{OptionStat, TagConfusion, ValueConfusion};
use crate::table::TableRow;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

/// Columns of [`table_frame`]
pub const TABLE_COLUMNS: [&str; 7] = [
    "group",
    "tag",
    "dimension",
    "annotator1",
    "annotator2",
    "iou",
    "differs",
];

/// Validate that a DataFrame contains all required columns
///
/// # Returns
///
/// `Ok(())` if all columns are present, [`CompareError::MissingColumn`] naming
/// the first absent one otherwise
pub fn validate_columns(df: &DataFrame, required_columns: &[&str]) -> Result<()> {
    let column_names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    for col in required_columns {
        if !column_names.iter().any(|c| c == col) {
            return Err(CompareError::MissingColumn(col.to_string()));
        }
    }

    Ok(())
}

/// Validate the schema of a comparison table DataFrame
///
/// Expected columns: see [`TABLE_COLUMNS`]; `iou` must be floating point.
pub fn validate_table_schema(df: &DataFrame) -> Result<()> {
    validate_columns(df, &TABLE_COLUMNS)?;

    let iou_dtype = df.column("iou")?.dtype();
    if !matches!(iou_dtype, DataType::Float64 | DataType::Float32) {
        return Err(CompareError::InvalidDataFrame(format!(
            "iou must be Float64 or Float32, got {:?}",
            iou_dtype
        )));
    }

    Ok(())
}

/// Comparison table rows as a DataFrame
///
/// `group` and `iou` are null for rows describing a single box.
pub fn table_frame(rows: &[TableRow]) -> Result<DataFrame> {
    let df = df! {
        "group" => rows.iter().map(|r| r.group).collect::<Vec<Option<u32>>>(),
        "tag" => rows.iter().map(|r| r.tag.as_str()).collect::<Vec<_>>(),
        "dimension" => rows.iter().map(|r| r.dimension.as_str()).collect::<Vec<_>>(),
        "annotator1" => rows.iter().map(|r| r.annotator1.as_str()).collect::<Vec<_>>(),
        "annotator2" => rows.iter().map(|r| r.annotator2.as_str()).collect::<Vec<_>>(),
        "iou" => rows.iter().map(|r| r.iou).collect::<Vec<Option<f64>>>(),
        "differs" => rows.iter().map(|r| r.differs).collect::<Vec<bool>>(),
    }?;
    Ok(df)
}

/// Primary-tag confusion, most frequent first
pub fn tag_confusion_frame(table: &TagConfusion) -> Result<DataFrame> {
    let entries = table.sorted();
    let df = df! {
        "tag1" => entries.iter().map(|((t1, _), _)| t1.as_str()).collect::<Vec<_>>(),
        "tag2" => entries.iter().map(|((_, t2), _)| t2.as_str()).collect::<Vec<_>>(),
        "count" => entries.iter().map(|(_, c)| *c as u64).collect::<Vec<u64>>(),
    }?;
    Ok(df)
}

/// Attribute value confusion, most frequent first
pub fn value_confusion_frame(table: &ValueConfusion) -> Result<DataFrame> {
    let entries = table.sorted();
    let df = df! {
        "dimension" => entries.iter().map(|((d, _, _), _)| d.as_str()).collect::<Vec<_>>(),
        "value1" => entries.iter().map(|((_, v1, _), _)| v1.as_str()).collect::<Vec<_>>(),
        "value2" => entries.iter().map(|((_, _, v2), _)| v2.as_str()).collect::<Vec<_>>(),
        "count" => entries.iter().map(|(_, c)| *c as u64).collect::<Vec<u64>>(),
    }?;
    Ok(df)
}

/// Per-attribute agreement, ordered by attribute name
pub fn option_stats_frame(option_stats: &BTreeMap<String, OptionStat>) -> Result<DataFrame> {
    let df = df! {
        "dimension" => option_stats.keys().map(String::as_str).collect::<Vec<_>>(),
        "matched" => option_stats.values().map(|s| s.matched as u64).collect::<Vec<u64>>(),
        "total" => option_stats.values().map(|s| s.total as u64).collect::<Vec<u64>>(),
        "rate" => option_stats.values().map(OptionStat::rate).collect::<Vec<f64>>(),
    }?;
    Ok(df)
}

/// Primary-label rows; missing answers are null
pub fn primary_frame(comparison: &PrimaryComparison) -> Result<DataFrame> {
    let rows = &comparison.rows;
    let df = df! {
        "id" => rows.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
        "url" => rows.iter().map(|r| r.url.as_str()).collect::<Vec<_>>(),
        "answer1" => rows.iter().map(|r| r.answer1.as_deref()).collect::<Vec<Option<&str>>>(),
        "answer2" => rows.iter().map(|r| r.answer2.as_deref()).collect::<Vec<Option<&str>>>(),
        "consistent" => rows.iter().map(|r| r.consistent).collect::<Vec<bool>>(),
    }?;
    Ok(df)
}

/// One row per threshold of a sweep
pub fn sweep_frame(results: &[(f64, AggregateStats)]) -> Result<DataFrame> {
    let df = df! {
        "threshold" => results.iter().map(|(t, _)| *t).collect::<Vec<f64>>(),
        "matched_pairs" => results.iter().map(|(_, s)| s.matched_pairs as u64).collect::<Vec<u64>>(),
        "confused_pairs" => results.iter().map(|(_, s)| s.confused_pairs as u64).collect::<Vec<u64>>(),
        "average_iou" => results.iter().map(|(_, s)| s.average_iou).collect::<Vec<f64>>(),
        "primary_matching_rate" => results.iter().map(|(_, s)| s.primary_matching_rate).collect::<Vec<f64>>(),
        "tertiary_matching_rate" => results.iter().map(|(_, s)| s.tertiary_matching_rate).collect::<Vec<f64>>(),
    }?;
    Ok(df)
}

/// Write a DataFrame to `path` as CSV with a header row
pub fn write_csv<P: AsRef<Path>>(df: &mut DataFrame, path: P) -> Result<()> {
    let mut file = File::create(path.as_ref())?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    log::debug!(
        "Wrote {} rows to {}",
        df.height(),
        path.as_ref().display()
    );
    Ok(())
}
