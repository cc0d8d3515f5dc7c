use dsync_types::DatastreamId;

/// Errors from byte source operations.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The remote store could not be reached or answered with a failure.
    #[error("transport error fetching {id}: {reason}")]
    Transport { id: DatastreamId, reason: String },
}

/// Result alias for byte source operations.
pub type SourceResult<T> = Result<T, SourceError>;
