//! Memoized parsing of result files keyed by content hash.

use crate::error::Result;
use crate::loader::load_from_slice;
use crate::types::AnnotationLog;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// SHA-256 of a file's bytes.
pub type ContentKey = [u8; 32];

/// Parses each distinct file content once.
///
/// ```
/// use anno_compare::cache::ParseCache;
///
/// let mut cache = ParseCache::new();
/// let a = cache.load(br#"[{"id": "1"}]"#).unwrap();
/// let b = cache.load(br#"[{"id": "1"}]"#).unwrap();
/// assert!(std::sync::Arc::ptr_eq(&a, &b));
/// assert_eq!(cache.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ParseCache {
    entries: HashMap<ContentKey, Arc<Vec<AnnotationLog>>>,
    hits: usize,
}

impl ParseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content_key(bytes: &[u8]) -> ContentKey {
        Sha256::digest(bytes).into()
    }

    /// Parsed logs of `bytes`, parsing only on the first request.
    ///
    /// Content that fails to parse is not cached.
    pub fn load(&mut self, bytes: &[u8]) -> Result<Arc<Vec<AnnotationLog>>> {
        let key = Self::content_key(bytes);
        if let Some(logs) = self.entries.get(&key) {
            self.hits += 1;
            log::debug!("Parse cache hit ({} logs)", logs.len());
            return Ok(Arc::clone(logs));
        }

        let logs = Arc::new(load_from_slice(bytes)?);
        self.entries.insert(key, Arc::clone(&logs));
        Ok(logs)
    }

    /// Read `path` and load it through the cache.
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<Arc<Vec<AnnotationLog>>> {
        let bytes = std::fs::read(path.as_ref())?;
        self.load(&bytes)
    }

    /// Distinct contents parsed so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Requests answered without parsing.
    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
    }
}
