use dsync_types::DatastreamId;

use crate::error::SourceResult;

/// Supplier of persisted datastream bytes.
///
/// All implementations must satisfy these invariants:
/// - `fetch` returns `Ok(None)` when the datastream exists but carries no
///   content; callers treat that as empty content.
/// - `is_new_record` never performs a content fetch.
/// - Errors are returned as-is; the caller does not retry.
pub trait ByteSource: Send + Sync {
    /// Fetch the stored bytes of a datastream.
    fn fetch(&self, id: &DatastreamId) -> SourceResult<Option<Vec<u8>>>;

    /// Returns `true` if the datastream has never been stored.
    fn is_new_record(&self, id: &DatastreamId) -> bool;
}
