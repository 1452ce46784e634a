//! JSON loading utilities for exported annotation result files.

use crate::error::Result;
use crate::parser::{parse_log, to_raw_log, RawLog};
use crate::types::AnnotationLog;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Load every log of a result file.
///
/// The file holds a JSON array of log objects (exports use a `.txt` suffix).
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not a JSON array of
/// objects, or any log carries undecodable labels. Nothing is returned for a
/// partially valid file.
///
/// # Example
///
/// ```no_run
/// use anno_compare::loader::load_from_file;
///
/// let logs = load_from_file("annotator1.txt").unwrap();
/// println!("Loaded {} logs", logs.len());
/// ```
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<AnnotationLog>> {
    let file = File::open(path.as_ref())?;
    let logs = load_from_reader(BufReader::new(file))?;
    log::debug!("Loaded {} logs from {}", logs.len(), path.as_ref().display());
    Ok(logs)
}

/// Load logs from any reader holding a JSON array.
pub fn load_from_reader<R: Read>(reader: R) -> Result<Vec<AnnotationLog>> {
    let raw: Vec<RawLog> = serde_json::from_reader(reader)?;
    parse_all(&raw)
}

/// Load logs from a JSON string.
///
/// # Example
///
/// ```
/// use anno_compare::loader::load_from_str;
///
/// let json = r#"[{"id": "1", "pictureList": [{"id": 1, "url": "https://img/1.jpg"}]}]"#;
/// let logs = load_from_str(json).unwrap();
/// assert_eq!(logs[0].primary_url(), Some("https://img/1.jpg"));
/// ```
pub fn load_from_str(json_str: &str) -> Result<Vec<AnnotationLog>> {
    let raw: Vec<RawLog> = serde_json::from_str(json_str)?;
    parse_all(&raw)
}

/// Load logs from raw bytes.
pub fn load_from_slice(bytes: &[u8]) -> Result<Vec<AnnotationLog>> {
    let raw: Vec<RawLog> = serde_json::from_slice(bytes)?;
    parse_all(&raw)
}

fn parse_all(raw: &[RawLog]) -> Result<Vec<AnnotationLog>> {
    raw.iter().map(parse_log).collect()
}

/// Serialize logs back into the exported file format.
pub fn save_to_string(logs: &[AnnotationLog]) -> Result<String> {
    let raw = logs.iter().map(to_raw_log).collect::<Result<Vec<_>>>()?;
    Ok(serde_json::to_string_pretty(&raw)?)
}
