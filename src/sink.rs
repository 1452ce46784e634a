//! Journal of comparison runs.
//!
//! Callers inject a [`RecordSink`]; the library never keeps a global queue.

use crate::aggregate::AggregateStats;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Headline figures of one comparison run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub source1: String,
    pub source2: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub iou_threshold: f64,
    pub total_pairs: usize,
    pub matched_pairs: usize,
    pub average_iou: f64,
    pub primary_matching_rate: f64,
    pub tertiary_matching_rate: f64,
}

impl ComparisonRecord {
    /// New record stamped with a fresh id and the current time.
    pub fn new(
        source1: impl Into<String>,
        source2: impl Into<String>,
        iou_threshold: f64,
        stats: &AggregateStats,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source1: source1.into(),
            source2: source2.into(),
            user: None,
            iou_threshold,
            total_pairs: stats.total_pairs,
            matched_pairs: stats.matched_pairs,
            average_iou: stats.average_iou,
            primary_matching_rate: stats.primary_matching_rate,
            tertiary_matching_rate: stats.tertiary_matching_rate,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}

/// Destination for comparison records.
pub trait RecordSink {
    fn append(&mut self, record: ComparisonRecord) -> Result<()>;
}

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Vec<ComparisonRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[ComparisonRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ComparisonRecord> {
        self.records
    }
}

impl RecordSink for MemorySink {
    fn append(&mut self, record: ComparisonRecord) -> Result<()> {
        self.records.push(record);
        Ok(())
    }
}

/// Appends one JSON object per line to a file.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    file: File,
}

impl JsonLinesSink {
    /// Open `path` for appending, creating it if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for JsonLinesSink {
    fn append(&mut self, record: ComparisonRecord) -> Result<()> {
        let line = serde_json::to_string(&record)?;
        writeln!(self.file, "{}", line)?;
        self.file.flush()?;
        log::debug!("Journaled run {} to {}", record.id, self.path.display());
        Ok(())
    }
}

/// Read every record of a JSON-lines journal. Blank lines are skipped.
pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<ComparisonRecord>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}
