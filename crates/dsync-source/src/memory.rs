use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use dsync_types::DatastreamId;
use tracing::debug;

use crate::error::{SourceError, SourceResult};
use crate::traits::ByteSource;

/// In-memory, HashMap-based byte source.
///
/// Intended for tests and embedding. Records every fetch so callers can
/// assert how often remote content was actually requested, and can be told
/// to fail fetches for a datastream to simulate transport errors.
pub struct InMemoryByteSource {
    entries: RwLock<HashMap<DatastreamId, Option<Vec<u8>>>>,
    fetches: RwLock<HashMap<DatastreamId, usize>>,
    failures: RwLock<HashMap<DatastreamId, String>>,
    total_fetches: AtomicUsize,
}

impl InMemoryByteSource {
    /// Create a new empty source.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            fetches: RwLock::new(HashMap::new()),
            failures: RwLock::new(HashMap::new()),
            total_fetches: AtomicUsize::new(0),
        }
    }

    /// Store content for a datastream, marking it as persisted.
    pub fn insert(&self, id: DatastreamId, bytes: impl Into<Vec<u8>>) {
        self.entries
            .write()
            .expect("lock poisoned")
            .insert(id, Some(bytes.into()));
    }

    /// Mark a datastream as persisted without any content.
    pub fn insert_null(&self, id: DatastreamId) {
        self.entries.write().expect("lock poisoned").insert(id, None);
    }

    /// Forget a datastream. Returns `true` if it was present.
    pub fn remove(&self, id: &DatastreamId) -> bool {
        self.entries
            .write()
            .expect("lock poisoned")
            .remove(id)
            .is_some()
    }

    /// Make every subsequent fetch of `id` fail with a transport error.
    pub fn fail_fetches(&self, id: DatastreamId, reason: impl Into<String>) {
        self.failures
            .write()
            .expect("lock poisoned")
            .insert(id, reason.into());
    }

    /// Stop failing fetches of `id`.
    pub fn heal(&self, id: &DatastreamId) {
        self.failures.write().expect("lock poisoned").remove(id);
    }

    /// Number of fetches issued for `id`, including failed ones.
    pub fn fetch_count(&self, id: &DatastreamId) -> usize {
        self.fetches
            .read()
            .expect("lock poisoned")
            .get(id)
            .copied()
            .unwrap_or(0)
    }

    /// Number of fetches issued across all datastreams.
    pub fn total_fetches(&self) -> usize {
        self.total_fetches.load(Ordering::Relaxed)
    }

    /// Reset all fetch counters.
    pub fn reset_counts(&self) {
        self.fetches.write().expect("lock poisoned").clear();
        self.total_fetches.store(0, Ordering::Relaxed);
    }

    /// Number of persisted datastreams.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    /// Returns `true` if nothing is persisted.
    pub fn is_empty(&self) -> bool {
        self.entries.read().expect("lock poisoned").is_empty()
    }

    fn record_fetch(&self, id: &DatastreamId) {
        *self
            .fetches
            .write()
            .expect("lock poisoned")
            .entry(id.clone())
            .or_insert(0) += 1;
        self.total_fetches.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for InMemoryByteSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteSource for InMemoryByteSource {
    fn fetch(&self, id: &DatastreamId) -> SourceResult<Option<Vec<u8>>> {
        self.record_fetch(id);
        if let Some(reason) = self.failures.read().expect("lock poisoned").get(id) {
            return Err(SourceError::Transport {
                id: id.clone(),
                reason: reason.clone(),
            });
        }
        let map = self.entries.read().expect("lock poisoned");
        let bytes = map.get(id).cloned().flatten();
        debug!(dsid = %id, len = bytes.as_ref().map(Vec::len), "in-memory fetch");
        Ok(bytes)
    }

    fn is_new_record(&self, id: &DatastreamId) -> bool {
        !self.entries.read().expect("lock poisoned").contains_key(id)
    }
}

impl std::fmt::Debug for InMemoryByteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryByteSource")
            .field("datastream_count", &self.len())
            .field("total_fetches", &self.total_fetches())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dsid(s: &str) -> DatastreamId {
        DatastreamId::new(s).unwrap()
    }

    // -----------------------------------------------------------------------
    // Fetch
    // -----------------------------------------------------------------------

    #[test]
    fn insert_and_fetch() {
        let source = InMemoryByteSource::new();
        source.insert(dsid("descMetadata"), b"<mods/>".to_vec());
        let bytes = source.fetch(&dsid("descMetadata")).unwrap();
        assert_eq!(bytes.as_deref(), Some(&b"<mods/>"[..]));
    }

    #[test]
    fn null_content_fetches_as_none() {
        let source = InMemoryByteSource::new();
        source.insert_null(dsid("rels"));
        assert!(source.fetch(&dsid("rels")).unwrap().is_none());
        assert!(!source.is_new_record(&dsid("rels")));
    }

    #[test]
    fn unknown_datastream_is_new_and_empty() {
        let source = InMemoryByteSource::new();
        assert!(source.is_new_record(&dsid("missing")));
        assert!(source.fetch(&dsid("missing")).unwrap().is_none());
    }

    // -----------------------------------------------------------------------
    // Fetch accounting
    // -----------------------------------------------------------------------

    #[test]
    fn fetches_are_counted_per_datastream() {
        let source = InMemoryByteSource::new();
        source.insert(dsid("a"), b"A".to_vec());
        source.fetch(&dsid("a")).unwrap();
        source.fetch(&dsid("a")).unwrap();
        source.fetch(&dsid("b")).unwrap();
        assert_eq!(source.fetch_count(&dsid("a")), 2);
        assert_eq!(source.fetch_count(&dsid("b")), 1);
        assert_eq!(source.total_fetches(), 3);

        source.reset_counts();
        assert_eq!(source.fetch_count(&dsid("a")), 0);
        assert_eq!(source.total_fetches(), 0);
    }

    #[test]
    fn is_new_record_does_not_count_as_fetch() {
        let source = InMemoryByteSource::new();
        source.insert(dsid("a"), b"A".to_vec());
        assert!(!source.is_new_record(&dsid("a")));
        assert_eq!(source.total_fetches(), 0);
    }

    // -----------------------------------------------------------------------
    // Failure injection
    // -----------------------------------------------------------------------

    #[test]
    fn failing_fetch_returns_transport_error() {
        let source = InMemoryByteSource::new();
        source.insert(dsid("a"), b"A".to_vec());
        source.fail_fetches(dsid("a"), "connection reset");
        let err = source.fetch(&dsid("a")).unwrap_err();
        assert!(matches!(err, SourceError::Transport { .. }));
        assert!(err.to_string().contains("connection reset"));

        source.heal(&dsid("a"));
        assert!(source.fetch(&dsid("a")).unwrap().is_some());
    }

    // -----------------------------------------------------------------------
    // Utility methods
    // -----------------------------------------------------------------------

    #[test]
    fn len_is_empty_and_remove() {
        let source = InMemoryByteSource::default();
        assert!(source.is_empty());
        source.insert(dsid("a"), b"A".to_vec());
        assert_eq!(source.len(), 1);
        assert!(source.remove(&dsid("a")));
        assert!(!source.remove(&dsid("a")));
        assert!(source.is_new_record(&dsid("a")));
    }

    #[test]
    fn debug_format() {
        let source = InMemoryByteSource::new();
        let debug = format!("{source:?}");
        assert!(debug.contains("InMemoryByteSource"));
        assert!(debug.contains("datastream_count"));
    }
}
